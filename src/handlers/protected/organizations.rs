use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Value};

use super::utils::load_owned;
use crate::app::AppState;
use crate::database::models::organization::{OrganizationInput, POLICY};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::handlers::{list_request, scope_to};
use crate::middleware::{advanced_results, ApiJson, ApiResponse, ApiResult, AuthUser, ListEnvelope};
use crate::services::{cascade, ActivityService};

/// GET /api/organizations
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListEnvelope, ApiError> {
    let request = scope_to(list_request(&state, &params, &POLICY)?, &user, "owner");
    Ok(advanced_results(state.store.organizations.as_ref(), &request, &[]).await?)
}

/// POST /api/organizations
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<OrganizationInput>,
) -> ApiResult<Value> {
    input.validate(true)?;

    let mut fields = input.into_fields();
    fields.insert("owner".into(), Value::String(user.id.to_string()));
    let org = state.store.organizations.insert(fields).await?;

    ActivityService::record(
        &state.store,
        user.id,
        "organization.create",
        "organization",
        org.id,
        json!({ "name": org.get_str("name") }),
    )
    .await;
    Ok(ApiResponse::created(org.to_json()))
}

/// GET /api/organizations/:id - includes how many cards belong to it
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let org = load_owned(state.store.organizations.as_ref(), &id, &user, "owner", "organization").await?;
    let cards = state
        .store
        .cards
        .count(&Filter::eq("organization", org.id.to_string()))
        .await?;

    let mut data = org.project(None);
    data.insert("card_count".into(), Value::from(cards));
    Ok(ApiResponse::success(Value::Object(data)))
}

/// PUT /api/organizations/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<OrganizationInput>,
) -> ApiResult<Value> {
    let org = load_owned(state.store.organizations.as_ref(), &id, &user, "owner", "organization").await?;
    input.validate(false)?;

    let org = state
        .store
        .organizations
        .update(org.id, input.into_fields())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No organization with id {}", org.id)))?;

    ActivityService::record(&state.store, user.id, "organization.update", "organization", org.id, json!({})).await;
    Ok(ApiResponse::success(org.to_json()))
}

/// DELETE /api/organizations/:id - member cards stay, without the organization
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let org = load_owned(state.store.organizations.as_ref(), &id, &user, "owner", "organization").await?;
    cascade::delete_organization(&state.store, org.id).await?;

    ActivityService::record(&state.store, user.id, "organization.delete", "organization", org.id, json!({})).await;
    Ok(ApiResponse::deleted())
}
