use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use common_auth::JwtVerifier;
use common_observability::LedgerMetrics;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use hub_inventory_service::{app_router, AppState, MIGRATOR};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db_pool = PgPool::connect(&database_url).await?;
    MIGRATOR.run(&db_pool).await?;

    let jwt_verifier = build_jwt_verifier_from_env()?;
    let metrics = Arc::new(LedgerMetrics::new());
    let state = AppState {
        db: db_pool,
        jwt_verifier,
        metrics,
    };

    let allowed_origins = [
        "http://localhost:3000",
        "http://localhost:3001",
        "http://localhost:5173",
    ];

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static("authorization"),
        ]);

    let app = app_router(state).layer(cors);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8086);
    let ip: std::net::IpAddr = host.parse()?;
    let addr = SocketAddr::from((ip, port));
    info!(%addr, "starting hub-inventory-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_jwt_verifier_from_env() -> anyhow::Result<Arc<JwtVerifier>> {
    let secret = env::var("ACCESS_TOKEN_SECRET").context("ACCESS_TOKEN_SECRET must be set")?;
    let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "hub-backend".to_string());
    let audience = env::var("JWT_AUDIENCE").unwrap_or_else(|_| "hub-clients".to_string());

    let mut verifier = JwtVerifier::hs256(secret.as_bytes(), issuer, audience);
    if let Ok(value) = env::var("JWT_LEEWAY_SECONDS") {
        if let Ok(leeway) = value.parse::<u32>() {
            verifier = verifier.with_leeway(leeway);
        }
    }

    info!("JWT verifier initialised");
    Ok(Arc::new(verifier))
}
