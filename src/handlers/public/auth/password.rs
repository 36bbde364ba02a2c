// handlers/public/auth/password.rs - forgotten password flow

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::{Duration, Utc};
use serde_json::{Map, Value};

use super::utils::token_response;
use crate::app::AppState;
use crate::auth::{generate_reset_token, hash_reset_token};
use crate::database::models::user::{ForgotPasswordInput, ResetPasswordInput};
use crate::error::ApiError;
use crate::filter::policy::{format_timestamp, parse_timestamp};
use crate::filter::Filter;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::{user_service, Email};

/// POST /api/auth/forgot-password - email a single-use reset token
///
/// Only the sha256 digest of the token is stored; the raw token travels in the email.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ForgotPasswordInput>,
) -> ApiResult<Value> {
    let email = input
        .email
        .ok_or_else(|| ApiError::bad_request("Please provide an email"))?;
    let user = user_service::find_by_email(&state.store, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("There is no user with that email"))?;

    let (raw, digest) = generate_reset_token();
    let expires = Utc::now() + Duration::minutes(state.config.security.reset_token_expiry_minutes);
    let mut pending = Map::new();
    pending.insert("reset_password_token".into(), Value::String(digest));
    pending.insert("reset_password_expire".into(), Value::String(format_timestamp(&expires)));
    state.store.users.update(user.id, pending).await?;

    let message = Email {
        to: user.get_str("email").unwrap_or(&email).to_string(),
        subject: "Password reset token".to_string(),
        body: format!(
            "You are receiving this email because you (or someone else) requested a password reset.\n\
             Make a PUT request to /api/auth/reset-password/{} within {} minutes.",
            raw, state.config.security.reset_token_expiry_minutes
        ),
    };

    if let Err(e) = state.mailer.send(message).await {
        tracing::error!("Reset email for {} failed: {}", user.id, e);
        let mut cleared = Map::new();
        cleared.insert("reset_password_token".into(), Value::Null);
        cleared.insert("reset_password_expire".into(), Value::Null);
        state.store.users.update(user.id, cleared).await?;
        return Err(ApiError::internal_server_error("Email could not be sent"));
    }

    Ok(ApiResponse::success(Value::String("Email sent".to_string())))
}

/// PUT /api/auth/reset-password/:token - set a new password with a reset token
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ApiJson(input): ApiJson<ResetPasswordInput>,
) -> Result<Response, ApiError> {
    input.validate()?;

    let digest = hash_reset_token(&token);
    let user = state
        .store
        .users
        .find_one(&Filter::eq("reset_password_token", digest))
        .await?
        .filter(|user| {
            user.get_str("reset_password_expire")
                .and_then(parse_timestamp)
                .is_some_and(|expires| expires > Utc::now())
        })
        .ok_or_else(|| ApiError::bad_request("Invalid or expired reset token"))?;

    let password = input.password.unwrap_or_default();
    let user = user_service::set_password(&state.store, &state.config.security, &user, &password).await?;
    tracing::info!("Password reset for user {}", user.id);
    token_response(&state, &user, StatusCode::OK)
}
