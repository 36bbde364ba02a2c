pub mod advanced_results;
pub mod auth;
pub mod response;

pub use advanced_results::{advanced_results, ListEnvelope, PageRef, Pagination, Populate};
pub use auth::{jwt_auth_middleware, require_admin, AuthUser};
pub use response::{ApiJson, ApiResponse, ApiResult};
