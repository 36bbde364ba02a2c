// handlers/elevated/mod.rs - Admin-only handlers (jwt_auth_middleware + require_admin)
pub mod stats;
pub mod users;
