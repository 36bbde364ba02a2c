use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::utils::{ensure_owner, load, load_owned};
use crate::app::AppState;
use crate::database::models::card::{CardInput, POLICY};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::handlers::{list_request, scope_to};
use crate::middleware::{advanced_results, ApiJson, ApiResponse, ApiResult, AuthUser, ListEnvelope, Populate};
use crate::services::{cascade, ActivityService};

/// GET /api/cards - own cards (all cards for admins), with the organization expanded
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListEnvelope, ApiError> {
    let request = scope_to(list_request(&state, &params, &POLICY)?, &user, "user");
    let populate = [Populate::new("organization", state.store.organizations.clone()).select(&["name", "industry"])];

    Ok(advanced_results(state.store.cards.as_ref(), &request, &populate).await?)
}

/// POST /api/cards
///
/// `status` defaults to `active`; `visibility` defaults to the owner's
/// `default_visibility` setting.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<CardInput>,
) -> ApiResult<Value> {
    input.validate(true)?;
    if let Some(organization) = input.organization {
        check_organization(&state, &user, organization).await?;
    }

    let visibility = match input.visibility.clone() {
        Some(visibility) => visibility,
        None => default_visibility(&state, &user).await?,
    };

    let mut fields = input.into_fields();
    fields.insert("user".into(), Value::String(user.id.to_string()));
    fields.entry("status").or_insert_with(|| Value::String("active".to_string()));
    fields.insert("visibility".into(), Value::String(visibility));
    fields.insert("views".into(), Value::from(0));

    let card = state.store.cards.insert(fields).await?;
    ActivityService::record(
        &state.store,
        user.id,
        "card.create",
        "card",
        card.id,
        json!({ "title": card.get_str("title") }),
    )
    .await;

    Ok(ApiResponse::created(card.to_json()))
}

/// GET /api/cards/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let card = load_owned(state.store.cards.as_ref(), &id, &user, "user", "card").await?;
    Ok(ApiResponse::success(card.to_json()))
}

/// PUT /api/cards/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CardInput>,
) -> ApiResult<Value> {
    let card = load_owned(state.store.cards.as_ref(), &id, &user, "user", "card").await?;
    input.validate(false)?;
    if let Some(organization) = input.organization {
        check_organization(&state, &user, organization).await?;
    }

    let changes = input.into_fields();
    let changed: Vec<String> = changes.keys().cloned().collect();
    let card = state
        .store
        .cards
        .update(card.id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No card with id {}", card.id)))?;

    ActivityService::record(&state.store, user.id, "card.update", "card", card.id, json!({ "fields": changed })).await;
    Ok(ApiResponse::success(card.to_json()))
}

/// DELETE /api/cards/:id - also removes favourites and connections of the card
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let card = load_owned(state.store.cards.as_ref(), &id, &user, "user", "card").await?;
    cascade::delete_card(&state.store, card.id).await?;

    ActivityService::record(&state.store, user.id, "card.delete", "card", card.id, json!({})).await;
    Ok(ApiResponse::deleted())
}

/// A card may only join an organization its owner controls
async fn check_organization(state: &AppState, user: &AuthUser, organization: Uuid) -> Result<(), ApiError> {
    let org = load(state.store.organizations.as_ref(), organization, "organization").await?;
    ensure_owner(&org, user, "owner", "organization")
}

async fn default_visibility(state: &AppState, user: &AuthUser) -> Result<String, ApiError> {
    let settings = state
        .store
        .settings
        .find_one(&Filter::eq("user", user.id.to_string()))
        .await?;
    Ok(settings
        .as_ref()
        .and_then(|s| s.get_str("default_visibility"))
        .unwrap_or("public")
        .to_string())
}
