use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Map, Value};

use super::utils::{load_owned, load_visible_card};
use crate::app::AppState;
use crate::database::models::favourite::{NewFavourite, POLICY};
use crate::error::ApiError;
use crate::handlers::{list_request, scope_to};
use crate::middleware::{advanced_results, ApiJson, ApiResponse, ApiResult, AuthUser, ListEnvelope, Populate};
use crate::services::ActivityService;

/// GET /api/favourites
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListEnvelope, ApiError> {
    let request = scope_to(list_request(&state, &params, &POLICY)?, &user, "user");
    let populate = [Populate::new("card", state.store.cards.clone()).select(&["title", "full_name", "company"])];

    Ok(advanced_results(state.store.favourites.as_ref(), &request, &populate).await?)
}

/// POST /api/favourites - a card can be favourited once per user (409 otherwise).
/// Other users' private cards answer 404.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<NewFavourite>,
) -> ApiResult<Value> {
    input.validate()?;
    let card_id = input.card.ok_or_else(|| ApiError::bad_request("Please add a card"))?;
    let card = load_visible_card(state.store.cards.as_ref(), card_id, &user).await?;

    let mut fields = Map::new();
    fields.insert("user".into(), Value::String(user.id.to_string()));
    fields.insert("card".into(), Value::String(card.id.to_string()));
    let favourite = state.store.favourites.insert(fields).await?;

    ActivityService::record(
        &state.store,
        user.id,
        "favourite.create",
        "favourite",
        favourite.id,
        json!({ "card": card.id.to_string() }),
    )
    .await;
    Ok(ApiResponse::created(favourite.to_json()))
}

/// DELETE /api/favourites/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let favourite = load_owned(state.store.favourites.as_ref(), &id, &user, "user", "favourite").await?;
    state.store.favourites.delete(favourite.id).await?;

    ActivityService::record(&state.store, user.id, "favourite.delete", "favourite", favourite.id, json!({})).await;
    Ok(ApiResponse::deleted())
}
