use serde::Deserialize;
use uuid::Uuid;

use super::FieldErrors;
use crate::error::ApiError;
use crate::filter::{FieldKind, FieldPolicy, FieldRule, EXACT};

pub const POLICY: FieldPolicy = FieldPolicy::new(&[
    FieldRule::new("user", FieldKind::Id, EXACT),
    FieldRule::new("card", FieldKind::Id, EXACT),
]);

#[derive(Debug, Clone, Deserialize)]
pub struct NewFavourite {
    pub card: Option<Uuid>,
}

impl NewFavourite {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.check(self.card.is_some(), "card", "Please add a card");
        errors.finish()
    }
}
