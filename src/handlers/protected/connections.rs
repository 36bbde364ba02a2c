use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Value};

use super::utils::{load, load_visible_card, owns};
use crate::app::AppState;
use crate::database::models::connection::{ConnectionUpdate, NewConnection, POLICY};
use crate::database::models::to_fields;
use crate::database::Document;
use crate::error::ApiError;
use crate::filter::{Filter, FilterOp, FilterWhereInfo, FindOptions};
use crate::handlers::{list_request, parse_id, scope_to};
use crate::middleware::{advanced_results, ApiJson, ApiResponse, ApiResult, AuthUser, ListEnvelope, Populate};
use crate::services::ActivityService;

const CARD_SUMMARY: &[&str] = &["title", "full_name", "job_title", "company"];

/// GET /api/connections - cards the user has saved
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListEnvelope, ApiError> {
    let request = scope_to(list_request(&state, &params, &POLICY)?, &user, "user");
    let populate = [Populate::new("card", state.store.cards.clone()).select(CARD_SUMMARY)];

    Ok(advanced_results(state.store.connections.as_ref(), &request, &populate).await?)
}

/// GET /api/connections/incoming - connections other users made to the user's cards
pub async fn incoming(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ListEnvelope, ApiError> {
    let own_cards: Vec<Value> = state
        .store
        .cards
        .find(&Filter::eq("user", user.id.to_string()), &FindOptions::default())
        .await?
        .into_iter()
        .map(|card| Value::String(card.id.to_string()))
        .collect();

    let request = list_request(&state, &params, &POLICY)?.scoped(FilterWhereInfo {
        column: "card".to_string(),
        operator: FilterOp::In,
        data: Value::Array(own_cards),
    });
    let populate = [
        Populate::new("user", state.store.users.clone()).select(&["name", "email"]),
        Populate::new("card", state.store.cards.clone()).select(CARD_SUMMARY),
    ];

    Ok(advanced_results(state.store.connections.as_ref(), &request, &populate).await?)
}

/// POST /api/connections - save someone else's card
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<NewConnection>,
) -> ApiResult<Value> {
    input.validate()?;
    let card_id = input.card.ok_or_else(|| ApiError::bad_request("Please add a card"))?;
    let card = load_visible_card(state.store.cards.as_ref(), card_id, &user).await?;

    if owns(&card, &user, "user") {
        return Err(ApiError::bad_request("You cannot connect to your own card"));
    }

    let mut fields = serde_json::Map::new();
    fields.insert("user".into(), Value::String(user.id.to_string()));
    fields.insert("card".into(), Value::String(card.id.to_string()));
    if let Some(note) = input.note {
        fields.insert("note".into(), Value::String(note.trim().to_string()));
    }
    fields.insert("status".into(), Value::String("pending".to_string()));

    let connection = state.store.connections.insert(fields).await?;
    ActivityService::record(
        &state.store,
        user.id,
        "connection.create",
        "connection",
        connection.id,
        json!({ "card": card.id.to_string() }),
    )
    .await;

    Ok(ApiResponse::created(connection.to_json()))
}

/// GET /api/connections/:id - visible to the saver and the card owner
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let (connection, _) = load_participant(&state, &id, &user).await?;
    Ok(ApiResponse::success(connection.to_json()))
}

/// PUT /api/connections/:id
///
/// The saver may edit the note. Only the card owner may change the status.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ConnectionUpdate>,
) -> ApiResult<Value> {
    let (connection, card_owner) = load_participant(&state, &id, &user).await?;
    input.validate()?;

    let is_saver = owns(&connection, &user, "user");
    if input.note.is_some() && !(is_saver || user.is_admin()) {
        return Err(ApiError::forbidden("Only the saver can edit the note of a connection"));
    }
    if input.status.is_some() && !(card_owner || user.is_admin()) {
        return Err(ApiError::forbidden("Only the card owner can change the status of a connection"));
    }

    let connection = state
        .store
        .connections
        .update(connection.id, to_fields(&input))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No connection with id {}", connection.id)))?;

    ActivityService::record(
        &state.store,
        user.id,
        "connection.update",
        "connection",
        connection.id,
        json!({ "status": connection.get_str("status") }),
    )
    .await;
    Ok(ApiResponse::success(connection.to_json()))
}

/// DELETE /api/connections/:id - by the saver (or an admin)
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let (connection, _) = load_participant(&state, &id, &user).await?;
    if !(owns(&connection, &user, "user") || user.is_admin()) {
        return Err(ApiError::forbidden("Only the saver can delete a connection"));
    }

    state.store.connections.delete(connection.id).await?;
    ActivityService::record(&state.store, user.id, "connection.delete", "connection", connection.id, json!({})).await;
    Ok(ApiResponse::deleted())
}

/// The connection plus whether `user` owns its card. Users on neither side get 403.
async fn load_participant(state: &AppState, raw_id: &str, user: &AuthUser) -> Result<(Document, bool), ApiError> {
    let id = parse_id(raw_id, "connection")?;
    let connection = load(state.store.connections.as_ref(), id, "connection").await?;

    let card_owner = match connection.get_ref("card") {
        Some(card_id) => state
            .store
            .cards
            .get(card_id)
            .await?
            .is_some_and(|card| owns(&card, user, "user")),
        None => false,
    };

    if owns(&connection, user, "user") || card_owner || user.is_admin() {
        Ok((connection, card_owner))
    } else {
        tracing::warn!("User {} denied access to connection {}", user.id, connection.id);
        Err(ApiError::forbidden(format!(
            "User {} is not authorized to access this connection",
            user.id
        )))
    }
}
