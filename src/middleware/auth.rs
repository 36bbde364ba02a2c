use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::validate_jwt;
use crate::database::Document;
use crate::error::ApiError;
use crate::types::Role;

/// Authenticated user loaded for the current request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id,
            name: doc.get_str("name").unwrap_or_default().to_string(),
            email: doc.get_str("email").unwrap_or_default().to_string(),
            role: doc.get_str("role").and_then(Role::parse).unwrap_or_default(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// JWT authentication middleware that validates tokens and loads the acting user
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers(), &state.config.security.cookie_name)
        .ok_or_else(|| ApiError::unauthorized("Not authorized to access this route"))?;

    let claims = validate_jwt(&token, &state.config.security.jwt_secret)?;

    // The account may have been deleted since the token was issued
    let user = state.store.users.get(claims.sub).await?.ok_or_else(|| {
        tracing::warn!("Token for unknown user {}", claims.sub);
        ApiError::unauthorized("Not authorized to access this route")
    })?;

    let auth_user = AuthUser::from_document(&user);
    tracing::debug!("Authenticated {} as {}", auth_user.email, auth_user.role);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Only admins pass; must run after `jwt_auth_middleware`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Not authorized to access this route"))?;

    if !user.is_admin() {
        tracing::warn!("User {} denied admin route {}", user.id, request.uri().path());
        return Err(ApiError::forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )));
    }

    Ok(next.run(request).await)
}

/// Bearer token first, then the session cookie
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty() && value != "none")
}
