pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_CUSTOMER: &str = "customer";
pub const ROLE_DRIVER: &str = "driver";

/// Roles permitted to touch hub inventory (initialize, adjust, list).
pub const INVENTORY_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_STAFF];
