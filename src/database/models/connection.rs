use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldErrors;
use crate::error::ApiError;
use crate::filter::{FieldKind, FieldPolicy, FieldRule, EXACT};

pub const POLICY: FieldPolicy = FieldPolicy::new(&[
    FieldRule::new("user", FieldKind::Id, EXACT),
    FieldRule::new("card", FieldKind::Id, EXACT),
    FieldRule::new("status", FieldKind::Text, EXACT),
]);

pub const STATUSES: &[&str] = &["pending", "accepted", "blocked"];

#[derive(Debug, Clone, Deserialize)]
pub struct NewConnection {
    pub card: Option<Uuid>,
    pub note: Option<String>,
}

impl NewConnection {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.check(self.card.is_some(), "card", "Please add a card");
        errors.optional("note", self.note.as_deref(), 500);
        errors.finish()
    }
}

/// The saver edits the note; the card owner decides the status
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConnectionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ConnectionUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional("note", self.note.as_deref(), 500);
        errors.one_of("status", self.status.as_deref(), STATUSES);
        errors.finish()
    }
}
