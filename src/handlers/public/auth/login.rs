// handlers/public/auth/login.rs - POST /api/auth/login

use axum::{extract::State, http::StatusCode, response::Response};

use super::utils::token_response;
use crate::app::AppState;
use crate::auth::verify_password;
use crate::database::models::user::LoginInput;
use crate::error::ApiError;
use crate::middleware::ApiJson;
use crate::services::user_service;

/// POST /api/auth/login - exchange email and password for a token
///
/// Unknown email and wrong password get the same 401 so accounts cannot be enumerated.
pub async fn login(State(state): State<AppState>, ApiJson(input): ApiJson<LoginInput>) -> Result<Response, ApiError> {
    let (Some(email), Some(password)) = (input.email, input.password) else {
        return Err(ApiError::bad_request("Please provide an email and password"));
    };

    let user = user_service::find_by_email(&state.store, &email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let hash = user.get_str("password").unwrap_or_default();
    if !verify_password(&password, hash) {
        tracing::warn!("Failed login for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    tracing::debug!("User {} logged in", user.id);
    token_response(&state, &user, StatusCode::OK)
}
