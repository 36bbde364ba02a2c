pub mod collection;
pub mod document;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod store;

pub use collection::{Collection, CollectionSpec};
pub use document::Document;
pub use manager::{DatabaseError, DatabaseManager};
pub use store::Store;
