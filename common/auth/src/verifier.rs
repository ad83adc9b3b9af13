use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::error::AuthResult;

const DEFAULT_LEEWAY_SECONDS: u32 = 30;

/// Verifies HS256 access tokens signed with the backend's shared secret.
///
/// Issuer and audience are pinned at construction; exp/nbf get a small
/// clock-skew allowance that callers can widen with [`with_leeway`].
///
/// [`with_leeway`]: JwtVerifier::with_leeway
#[derive(Clone)]
pub struct JwtVerifier {
    issuer: String,
    audience: String,
    leeway_seconds: u32,
    key: DecodingKey,
}

impl JwtVerifier {
    pub fn hs256(
        secret: &[u8],
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
            key: DecodingKey::from_secret(secret),
        }
    }

    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.clone()]);
        validation.set_audience(&[self.audience.clone()]);
        validation.leeway = self.leeway_seconds.into();

        let token_data = decode::<Value>(token, &self.key, &validation)?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(subject = %claims.subject, "verified JWT successfully");
        Ok(claims)
    }
}
