pub mod auth;
pub mod rate_limit;

pub use auth::{admin_middleware, auth_middleware, Claims, ROLE_ADMIN, ROLE_STAFF};
pub use rate_limit::rate_limit_middleware;
