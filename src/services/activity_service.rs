use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::Store;

/// Append-only audit trail of what users did
pub struct ActivityService;

impl ActivityService {
    /// Record an action. A failed write is logged and otherwise ignored: the
    /// request that triggered it has already succeeded.
    pub async fn record(store: &Store, user: Uuid, action: &str, entity: &str, entity_id: Uuid, details: Value) {
        let fields = match json!({
            "user": user.to_string(),
            "action": action,
            "entity": entity,
            "entity_id": entity_id.to_string(),
            "details": details,
        }) {
            Value::Object(map) => map,
            _ => return,
        };

        if let Err(e) = store.activities.insert(fields).await {
            tracing::warn!("Failed to record activity {} for {}: {}", action, user, e);
        }
    }
}
