use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::setting::{defaults, SettingsUpdate};
use crate::database::Document;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::ActivityService;

/// GET /api/settings - created with defaults on first access
pub async fn show(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let settings = load_or_create(&state, &user).await?;
    Ok(ApiResponse::success(settings.to_json()))
}

/// PUT /api/settings
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<SettingsUpdate>,
) -> ApiResult<Value> {
    input.validate()?;
    let settings = load_or_create(&state, &user).await?;

    let changes = input.into_fields();
    let changed: Vec<String> = changes.keys().cloned().collect();
    let settings = state
        .store
        .settings
        .update(settings.id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Settings not found"))?;

    ActivityService::record(&state.store, user.id, "settings.update", "settings", settings.id, json!({ "fields": changed })).await;
    Ok(ApiResponse::success(settings.to_json()))
}

async fn load_or_create(state: &AppState, user: &AuthUser) -> Result<Document, ApiError> {
    let filter = Filter::eq("user", user.id.to_string());
    if let Some(settings) = state.store.settings.find_one(&filter).await? {
        return Ok(settings);
    }

    let mut fields = defaults();
    fields.insert("user".into(), Value::String(user.id.to_string()));
    match state.store.settings.insert(fields).await {
        Ok(settings) => Ok(settings),
        // A concurrent request created them first
        Err(crate::database::DatabaseError::Duplicate(_)) => state
            .store
            .settings
            .find_one(&filter)
            .await?
            .ok_or_else(|| ApiError::internal_server_error("Settings could not be created")),
        Err(e) => Err(e.into()),
    }
}
