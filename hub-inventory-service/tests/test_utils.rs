#![allow(dead_code)]

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_SECRET: &[u8] = b"itest-access-token-secret";
pub const TEST_ISSUER: &str = "itest-issuer";
pub const TEST_AUDIENCE: &str = "itest-aud";

/// Mint an HS256 access token the way the auth collaborator would.
pub fn issue_jwt(role: &str) -> String {
    #[derive(serde::Serialize)]
    struct Claims<'a> {
        sub: String,
        role: &'a str,
        iss: &'a str,
        aud: &'a str,
        exp: i64,
        iat: i64,
    }

    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role,
        iss: TEST_ISSUER,
        aud: TEST_AUDIENCE,
        exp: now + 600,
        iat: now,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("jwt encode")
}

/// Seed one product reference row, returning its id.
pub async fn seed_product(pool: &PgPool, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO products (name, sku, unit) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(format!("SKU-{}", Uuid::new_v4()))
    .bind("bottle")
    .fetch_one(pool)
    .await
    .expect("seed product")
}

/// Seed one delivery hub reference row, returning its id.
pub async fn seed_hub(pool: &PgPool, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>("INSERT INTO delivery_hubs (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("seed hub")
}
