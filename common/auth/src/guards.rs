use axum::http::StatusCode;

use crate::AuthContext;

#[derive(Debug, Clone)]
pub enum GuardError {
    Forbidden { required: Vec<String> },
}

impl GuardError {
    pub fn into_response(self) -> (StatusCode, String) {
        match self {
            GuardError::Forbidden { required } => (
                StatusCode::FORBIDDEN,
                if required.is_empty() {
                    "Insufficient role".to_string()
                } else {
                    format!("Insufficient role. Required one of: {}", required.join(", "))
                },
            ),
        }
    }
}

impl From<GuardError> for (StatusCode, String) {
    fn from(value: GuardError) -> Self {
        value.into_response()
    }
}

pub fn ensure_role(auth: &AuthContext, allowed: &[&str]) -> Result<(), GuardError> {
    if allowed.is_empty() {
        return Ok(());
    }

    if allowed.iter().any(|required| auth.claims.role == *required) {
        Ok(())
    } else {
        Err(GuardError::Forbidden {
            required: allowed.iter().map(|value| value.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::Claims;
    use crate::roles::{INVENTORY_ROLES, ROLE_CUSTOMER, ROLE_STAFF};
    use chrono::Utc;
    use uuid::Uuid;

    fn auth_with_role(role: &str) -> AuthContext {
        AuthContext {
            claims: Claims {
                subject: Uuid::new_v4(),
                role: role.to_string(),
                expires_at: Utc::now() + chrono::Duration::hours(1),
                issued_at: Some(Utc::now()),
                issuer: "test-issuer".to_string(),
                raw: serde_json::Value::Null,
            },
        }
    }

    #[test]
    fn staff_allowed_for_inventory() {
        let auth = auth_with_role(ROLE_STAFF);
        ensure_role(&auth, INVENTORY_ROLES).expect("staff should pass");
    }

    #[test]
    fn customer_rejected_for_inventory() {
        let auth = auth_with_role(ROLE_CUSTOMER);
        let err = ensure_role(&auth, INVENTORY_ROLES).expect_err("customer should fail");
        let (status, message) = err.into_response();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(message.contains("admin"));
    }

    #[test]
    fn empty_allow_list_is_open() {
        let auth = auth_with_role(ROLE_CUSTOMER);
        ensure_role(&auth, &[]).expect("empty list should pass");
    }
}
