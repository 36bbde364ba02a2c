use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),

    #[error("Filtering on '{0}' is not allowed")]
    UnknownField(String),

    #[error("Unsupported operator '{operator}' for field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Sorting on '{0}' is not allowed")]
    InvalidSortField(String),
}
