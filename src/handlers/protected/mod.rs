// handlers/protected/mod.rs - Handlers behind jwt_auth_middleware
pub mod activities;
pub mod auth;
pub mod cards;
pub mod collections;
pub mod connections;
pub mod favourites;
pub mod organizations;
pub mod settings;
pub mod utils;
