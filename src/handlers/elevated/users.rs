use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::user::{NewUser, UserUpdate, POLICY};
use crate::error::ApiError;
use crate::handlers::protected::utils::load;
use crate::handlers::{list_request, parse_id};
use crate::middleware::{advanced_results, ApiJson, ApiResponse, ApiResult, AuthUser, ListEnvelope};
use crate::services::{cascade, user_service, ActivityService};

/// GET /api/admin/users
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListEnvelope, ApiError> {
    let request = list_request(&state, &params, &POLICY)?;
    Ok(advanced_results(state.store.users.as_ref(), &request, &[]).await?)
}

/// POST /api/admin/users - may set `role`
pub async fn create(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    ApiJson(input): ApiJson<NewUser>,
) -> ApiResult<Value> {
    let user = user_service::create_user(&state.store, &state.config.security, input).await?;
    ActivityService::record(&state.store, admin.id, "admin.user.create", "user", user.id, json!({})).await;
    Ok(ApiResponse::created(user.to_json()))
}

/// GET /api/admin/users/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let user = load(state.store.users.as_ref(), parse_id(&id, "user")?, "user").await?;
    Ok(ApiResponse::success(user.to_json()))
}

/// PUT /api/admin/users/:id - name, email and role
pub async fn update(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UserUpdate>,
) -> ApiResult<Value> {
    let user = load(state.store.users.as_ref(), parse_id(&id, "user")?, "user").await?;
    input.validate()?;

    if let Some(email) = input.email.as_deref() {
        if let Some(existing) = user_service::find_by_email(&state.store, email).await? {
            if existing.id != user.id {
                return Err(ApiError::conflict("Email is already registered"));
            }
        }
    }

    let user = state
        .store
        .users
        .update(user.id, input.into_fields())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No user with id {}", user.id)))?;

    ActivityService::record(&state.store, admin.id, "admin.user.update", "user", user.id, json!({})).await;
    Ok(ApiResponse::success(user.to_json()))
}

/// DELETE /api/admin/users/:id - removes everything the user owns
pub async fn remove(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let user = load(state.store.users.as_ref(), parse_id(&id, "user")?, "user").await?;
    if user.id == admin.id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    cascade::delete_user(&state.store, user.id).await?;
    ActivityService::record(&state.store, admin.id, "admin.user.delete", "user", user.id, json!({})).await;
    Ok(ApiResponse::deleted())
}
