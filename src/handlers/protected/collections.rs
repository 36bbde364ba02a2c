use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Map, Value};

use super::utils::{ensure_visible, load_owned, load_visible_card};
use crate::app::AppState;
use crate::database::models::collection::{card_ids, CollectionInput, POLICY};
use crate::database::Document;
use crate::error::ApiError;
use crate::filter::{Filter, FilterOp, FindOptions};
use crate::handlers::{list_request, parse_id, scope_to};
use crate::middleware::{advanced_results, ApiJson, ApiResponse, ApiResult, AuthUser, ListEnvelope, Populate};
use crate::services::ActivityService;

const CARD_SUMMARY: &[&str] = &["title", "full_name", "company"];

/// GET /api/collections - with member cards expanded
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListEnvelope, ApiError> {
    let request = scope_to(list_request(&state, &params, &POLICY)?, &user, "user");
    let populate = [Populate::new("cards", state.store.cards.clone()).select(CARD_SUMMARY)];

    Ok(advanced_results(state.store.collections.as_ref(), &request, &populate).await?)
}

/// POST /api/collections - optional initial `cards`, each of which must exist and be visible
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<CollectionInput>,
) -> ApiResult<Value> {
    input.validate(true)?;

    let mut cards: Vec<String> = Vec::new();
    for id in input.cards.clone().unwrap_or_default() {
        let id = id.to_string();
        if !cards.contains(&id) {
            cards.push(id);
        }
    }
    if !cards.is_empty() {
        let filter = Filter::new().and("id", FilterOp::In, cards.clone());
        let found = state.store.cards.find(&filter, &FindOptions::default()).await?;
        if found.len() != cards.len() {
            return Err(ApiError::not_found("One or more cards do not exist"));
        }
        for card in &found {
            ensure_visible(card, &user)?;
        }
    }

    let mut fields = input.into_fields();
    fields.insert("user".into(), Value::String(user.id.to_string()));
    fields.insert("cards".into(), json!(cards));

    let collection = state.store.collections.insert(fields).await?;
    ActivityService::record(
        &state.store,
        user.id,
        "collection.create",
        "collection",
        collection.id,
        json!({ "name": collection.get_str("name") }),
    )
    .await;
    Ok(ApiResponse::created(collection.to_json()))
}

/// GET /api/collections/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let collection = load_owned(state.store.collections.as_ref(), &id, &user, "user", "collection").await?;
    Ok(ApiResponse::success(collection.to_json()))
}

/// PUT /api/collections/:id - name and description
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CollectionInput>,
) -> ApiResult<Value> {
    let collection = load_owned(state.store.collections.as_ref(), &id, &user, "user", "collection").await?;
    input.validate(false)?;

    let collection = save(&state, &collection, input.into_fields()).await?;
    ActivityService::record(&state.store, user.id, "collection.update", "collection", collection.id, json!({})).await;
    Ok(ApiResponse::success(collection.to_json()))
}

/// DELETE /api/collections/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let collection = load_owned(state.store.collections.as_ref(), &id, &user, "user", "collection").await?;
    state.store.collections.delete(collection.id).await?;

    ActivityService::record(&state.store, user.id, "collection.delete", "collection", collection.id, json!({})).await;
    Ok(ApiResponse::deleted())
}

/// PUT /api/collections/:id/cards/:card_id - adding a card twice is a no-op
pub async fn add_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((id, card_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let collection = load_owned(state.store.collections.as_ref(), &id, &user, "user", "collection").await?;
    let card = load_visible_card(state.store.cards.as_ref(), parse_id(&card_id, "card")?, &user).await?;

    let mut cards = card_ids(&collection.fields);
    let card_id = card.id.to_string();
    if cards.contains(&card_id) {
        return Ok(ApiResponse::success(collection.to_json()));
    }
    cards.push(card_id.clone());

    let collection = save_cards(&state, &collection, cards).await?;
    ActivityService::record(
        &state.store,
        user.id,
        "collection.add_card",
        "collection",
        collection.id,
        json!({ "card": card_id }),
    )
    .await;
    Ok(ApiResponse::success(collection.to_json()))
}

/// DELETE /api/collections/:id/cards/:card_id
pub async fn remove_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((id, card_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let collection = load_owned(state.store.collections.as_ref(), &id, &user, "user", "collection").await?;
    let card_id = parse_id(&card_id, "card")?.to_string();

    let mut cards = card_ids(&collection.fields);
    let before = cards.len();
    cards.retain(|existing| existing != &card_id);
    if cards.len() == before {
        return Err(ApiError::not_found(format!("Card {} is not in this collection", card_id)));
    }

    let collection = save_cards(&state, &collection, cards).await?;
    ActivityService::record(
        &state.store,
        user.id,
        "collection.remove_card",
        "collection",
        collection.id,
        json!({ "card": card_id }),
    )
    .await;
    Ok(ApiResponse::success(collection.to_json()))
}

async fn save_cards(state: &AppState, collection: &Document, cards: Vec<String>) -> Result<Document, ApiError> {
    let mut changes = Map::new();
    changes.insert("cards".into(), json!(cards));
    save(state, collection, changes).await
}

async fn save(state: &AppState, collection: &Document, changes: Map<String, Value>) -> Result<Document, ApiError> {
    state
        .store
        .collections
        .update(collection.id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No collection with id {}", collection.id)))
}
