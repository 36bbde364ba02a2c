// handlers/public/auth/mod.rs - Token acquisition and password recovery
pub mod login;
pub mod password;
pub mod register;
pub mod utils;

pub use login::login;
pub use password::{forgot_password, reset_password};
pub use register::register;
