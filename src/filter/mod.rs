pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod policy;
pub mod request;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use policy::{FieldKind, FieldPolicy, FieldRule};
pub use request::{FindOptions, ListRequest};
pub use types::*;
