use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};
use uuid::Uuid;

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::verifier::JwtVerifier;

/// Verified caller identity, decoded from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
}

impl AuthContext {
    /// Subject of the token; recorded as the actor on stock movements.
    pub fn actor_id(&self) -> Uuid {
        self.claims.subject
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.claims.has_role(role)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let claims = verifier.verify(bearer_token(header)?)?;
        Ok(Self { claims })
    }
}

// Scheme comparison is deliberately exact: RFC 6750 clients send "Bearer".
fn bearer_token(value: &axum::http::HeaderValue) -> AuthResult<&str> {
    let header = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?;

    match header.trim().split_once(' ') {
        Some(("Bearer", credential)) if !credential.trim().is_empty() => Ok(credential.trim()),
        _ => Err(AuthError::InvalidAuthorization),
    }
}
