// handlers/protected/auth/mod.rs - Session and profile management for signed-in users
pub mod details;
pub mod session;

pub use details::{update_details, update_password};
pub use session::{logout, me};
