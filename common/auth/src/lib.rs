pub mod claims;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod roles;
pub mod verifier;

pub use claims::Claims;
pub use error::{AuthError, AuthResult};
pub use extractors::AuthContext;
pub use guards::{ensure_role, GuardError};
pub use roles::{INVENTORY_ROLES, ROLE_ADMIN, ROLE_CUSTOMER, ROLE_DRIVER, ROLE_STAFF};
pub use verifier::JwtVerifier;
