use axum::extract::State;
use chrono::{Duration, Utc};
use serde_json::{Map, Value};

use crate::app::AppState;
use crate::database::models::card::STATUSES;
use crate::filter::policy::format_timestamp;
use crate::filter::{Filter, FilterOp};
use crate::middleware::{ApiResponse, ApiResult};

const RECENT_DAYS: i64 = 7;

/// GET /api/admin/stats - dashboard counters
pub async fn stats(State(state): State<AppState>) -> ApiResult<Value> {
    let store = &state.store;

    let mut totals = Map::new();
    for collection in store.all() {
        totals.insert(collection.name().to_string(), Value::from(collection.count(&Filter::new()).await?));
    }

    let since = Utc::now() - Duration::days(RECENT_DAYS);
    let recent = Filter::new().and("created_at", FilterOp::Gte, format_timestamp(&since));
    let mut last_days = Map::new();
    last_days.insert("users".into(), Value::from(store.users.count(&recent).await?));
    last_days.insert("cards".into(), Value::from(store.cards.count(&recent).await?));

    let mut by_status = Map::new();
    for status in STATUSES {
        by_status.insert(status.to_string(), Value::from(store.cards.count(&Filter::eq("status", *status)).await?));
    }

    let mut data = Map::new();
    data.insert("totals".into(), Value::Object(totals));
    data.insert(format!("last_{}_days", RECENT_DAYS), Value::Object(last_days));
    data.insert("cards_by_status".into(), Value::Object(by_status));
    data.insert("backend".into(), Value::String(store.backend().to_string()));

    Ok(ApiResponse::success(Value::Object(data)))
}
