// handlers/public/cards.rs - GET /api/cards/public/:id

use axum::extract::{Path, State};
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};

/// Anyone may view an active, public card; each view is counted.
/// Private, inactive and draft cards answer 404 like missing ones.
pub async fn public_card(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id, "card")?;
    let not_found = || ApiError::not_found(format!("No card with id {}", id));

    let card = state.store.cards.get(id).await?.ok_or_else(not_found)?;
    if card.get_str("visibility") != Some("public") || card.get_str("status") != Some("active") {
        return Err(not_found());
    }

    let card = state.store.cards.increment(id, "views", 1).await?.ok_or_else(not_found)?;

    Ok(ApiResponse::success(card.to_json()))
}
