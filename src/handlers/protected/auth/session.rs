use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::protected::utils::load;
use crate::handlers::public::auth::utils::logout_cookie;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/me - the signed-in user's profile
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let doc = load(state.store.users.as_ref(), user.id, "user").await?;
    Ok(ApiResponse::success(doc.to_json()))
}

/// GET /api/auth/logout - clear the session cookie. Bearer tokens stay valid until they expire.
pub async fn logout(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> Result<Response, ApiError> {
    let jar = CookieJar::new().add(logout_cookie(&state.config.security));
    tracing::debug!("User {} logged out", user.id);

    Ok((jar, ApiResponse::deleted()).into_response())
}
