use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{to_fields, trimmed, FieldErrors};
use crate::error::ApiError;
use crate::filter::{FieldKind, FieldPolicy, FieldRule, EXACT};

pub const POLICY: FieldPolicy = FieldPolicy::new(&[
    FieldRule::new("owner", FieldKind::Id, EXACT),
    FieldRule::new("name", FieldKind::Text, EXACT),
    FieldRule::new("industry", FieldKind::Text, EXACT),
]);

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrganizationInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
}

impl OrganizationInput {
    pub fn validate(&self, creating: bool) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("name", self.name.as_deref(), creating, 100);
        errors.optional("description", self.description.as_deref(), 500);
        errors.optional("website", self.website.as_deref(), 200);
        errors.optional("industry", self.industry.as_deref(), 100);
        errors.finish()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        trimmed(to_fields(&self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_required_on_create_only() {
        let input = OrganizationInput { industry: Some("Fintech".into()), ..Default::default() };
        assert!(input.validate(true).is_err());
        assert!(input.validate(false).is_ok());
    }
}
