use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{to_fields, trimmed, FieldErrors};
use crate::error::ApiError;
use crate::filter::{FieldKind, FieldPolicy, FieldRule, EXACT};

pub const POLICY: FieldPolicy = FieldPolicy::new(&[
    FieldRule::new("user", FieldKind::Id, EXACT),
    FieldRule::new("name", FieldKind::Text, EXACT),
]);

/// Named set of cards. `cards` is only accepted on create; afterwards cards are
/// added and removed one at a time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CollectionInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub cards: Option<Vec<Uuid>>,
}

impl CollectionInput {
    pub fn validate(&self, creating: bool) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("name", self.name.as_deref(), creating, 100);
        errors.optional("description", self.description.as_deref(), 500);
        errors.finish()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        trimmed(to_fields(&self))
    }
}

/// Card ids stored on a collection document, in insertion order
pub fn card_ids(fields: &Map<String, Value>) -> Vec<String> {
    fields
        .get("cards")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}
