// handlers/public/auth/register.rs - POST /api/auth/register

use axum::{extract::State, http::StatusCode, response::Response};
use serde_json::json;

use super::utils::token_response;
use crate::app::AppState;
use crate::database::models::user::RegisterInput;
use crate::error::ApiError;
use crate::middleware::ApiJson;
use crate::services::{user_service, ActivityService};

/// POST /api/auth/register - create a `user` account and sign it in
///
/// Input: `{ "name", "email", "password" }`. Responds 201 with `{ success, token }`.
pub async fn register(State(state): State<AppState>, ApiJson(input): ApiJson<RegisterInput>) -> Result<Response, ApiError> {
    let user = user_service::create_user(&state.store, &state.config.security, input.into()).await?;

    ActivityService::record(&state.store, user.id, "user.register", "user", user.id, json!({})).await;
    token_response(&state, &user, StatusCode::CREATED)
}
