use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

use crate::app::AppState;
use crate::auth::issue_token;
use crate::config::SecurityConfig;
use crate::database::Document;
use crate::error::ApiError;
use crate::services::user_service::role_of;

/// `{ success, token }` plus the session cookie
pub fn token_response(state: &AppState, user: &Document, status: StatusCode) -> Result<Response, ApiError> {
    let security = &state.config.security;
    let token = issue_token(user.id, role_of(user), security)?;
    let max_age = i64::try_from(security.jwt_expiry_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
    let jar = CookieJar::new().add(session_cookie(security, token.clone(), max_age));

    Ok((status, jar, Json(json!({ "success": true, "token": token }))).into_response())
}

/// Overwrites the session cookie with a short-lived placeholder
pub fn logout_cookie(security: &SecurityConfig) -> Cookie<'static> {
    session_cookie(security, "none".to_string(), 10)
}

fn session_cookie(security: &SecurityConfig, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((security.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(security.cookie_secure)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}
