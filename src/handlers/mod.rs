// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (JWT auth) → Elevated (admin role)
pub mod elevated;
pub mod protected;
pub mod public;

use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::filter::{FieldPolicy, FilterOp, FilterWhereInfo, ListRequest};
use crate::middleware::AuthUser;

/// Path ids that are not UUIDs cannot name a record
pub fn parse_id(raw: &str, noun: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("No {} with id {}", noun, raw)))
}

pub fn list_request(state: &AppState, params: &[(String, String)], policy: &FieldPolicy) -> Result<ListRequest, ApiError> {
    Ok(ListRequest::from_query(params, policy, &state.config.listing)?)
}

/// Restrict a listing to records whose `field` references `user`; admins see everything
pub fn scope_to(request: ListRequest, user: &AuthUser, field: &str) -> ListRequest {
    if user.is_admin() {
        return request;
    }
    request.scoped(FilterWhereInfo {
        column: field.to_string(),
        operator: FilterOp::Eq,
        data: Value::String(user.id.to_string()),
    })
}
