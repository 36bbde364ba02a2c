use axum::{extract::State, http::StatusCode, response::Response, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::verify_password;
use crate::database::models::user::{UpdatePasswordInput, UserUpdate};
use crate::error::ApiError;
use crate::handlers::protected::utils::load;
use crate::handlers::public::auth::utils::token_response;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::{user_service, ActivityService};

/// PUT /api/auth/details - change own name or email
pub async fn update_details(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<UserUpdate>,
) -> ApiResult<Value> {
    // Roles are only changed through the admin API
    let input = UserUpdate { role: None, ..input };
    input.validate()?;

    if let Some(email) = input.email.as_deref() {
        if let Some(existing) = user_service::find_by_email(&state.store, email).await? {
            if existing.id != user.id {
                return Err(ApiError::conflict("Email is already registered"));
            }
        }
    }

    let updated = state
        .store
        .users
        .update(user.id, input.into_fields())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No user with id {}", user.id)))?;

    ActivityService::record(&state.store, user.id, "user.update", "user", user.id, json!({})).await;
    Ok(ApiResponse::success(updated.to_json()))
}

/// PUT /api/auth/password - change own password; answers with a fresh token
pub async fn update_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<UpdatePasswordInput>,
) -> Result<Response, ApiError> {
    input.validate()?;

    let doc = load(state.store.users.as_ref(), user.id, "user").await?;
    let current = input.current_password.unwrap_or_default();
    if !verify_password(&current, doc.get_str("password").unwrap_or_default()) {
        tracing::warn!("Wrong current password for user {}", user.id);
        return Err(ApiError::unauthorized("Password is incorrect"));
    }

    let new_password = input.new_password.unwrap_or_default();
    let doc = user_service::set_password(&state.store, &state.config.security, &doc, &new_password).await?;

    ActivityService::record(&state.store, user.id, "user.password", "user", user.id, json!({})).await;
    token_response(&state, &doc, StatusCode::OK)
}
