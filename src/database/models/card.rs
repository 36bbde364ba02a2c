use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{to_fields, trimmed, FieldErrors};
use crate::error::ApiError;
use crate::filter::{FieldKind, FieldPolicy, FieldRule, EXACT, RANGE};

pub const POLICY: FieldPolicy = FieldPolicy::new(&[
    FieldRule::new("user", FieldKind::Id, EXACT),
    FieldRule::new("organization", FieldKind::Id, EXACT),
    FieldRule::new("title", FieldKind::Text, EXACT),
    FieldRule::new("full_name", FieldKind::Text, EXACT),
    FieldRule::new("job_title", FieldKind::Text, EXACT),
    FieldRule::new("company", FieldKind::Text, EXACT),
    FieldRule::new("email", FieldKind::Text, EXACT),
    FieldRule::new("status", FieldKind::Text, EXACT),
    FieldRule::new("visibility", FieldKind::Text, EXACT),
    FieldRule::new("views", FieldKind::Number, RANGE),
]);

pub const STATUSES: &[&str] = &["active", "inactive", "draft"];
pub const VISIBILITIES: &[&str] = &["public", "private"];

/// Card body for create and partial update. Owner and view count are server-managed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CardInput {
    pub organization: Option<Uuid>,
    pub title: Option<String>,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub visibility: Option<String>,
}

impl CardInput {
    /// `creating` makes title and full name mandatory
    pub fn validate(&self, creating: bool) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("title", self.title.as_deref(), creating, 100);
        errors.text("full_name", self.full_name.as_deref(), creating, 100);
        errors.optional("job_title", self.job_title.as_deref(), 100);
        errors.optional("company", self.company.as_deref(), 100);
        errors.email("email", self.email.as_deref());
        errors.optional("phone", self.phone.as_deref(), 20);
        errors.optional("website", self.website.as_deref(), 200);
        if let Some(website) = self.website.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
            errors.check(
                website.starts_with("http://") || website.starts_with("https://"),
                "website",
                "Please use a valid URL with HTTP or HTTPS",
            );
        }
        errors.optional("address", self.address.as_deref(), 200);
        errors.optional("bio", self.bio.as_deref(), 500);
        errors.one_of("status", self.status.as_deref(), STATUSES);
        errors.one_of("visibility", self.visibility.as_deref(), VISIBILITIES);
        errors.finish()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = trimmed(to_fields(&self));
        if let Some(Value::String(email)) = fields.get_mut("email") {
            *email = email.to_lowercase();
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_needs_title_and_name() {
        let input = CardInput::default();
        assert!(input.validate(false).is_ok());

        let json = input.validate(true).unwrap_err().to_json();
        assert!(json["field_errors"].get("title").is_some());
        assert!(json["field_errors"].get("full_name").is_some());
    }

    #[test]
    fn rejects_unknown_status_and_bad_website() {
        let input: CardInput = serde_json::from_value(json!({
            "status": "archived",
            "website": "example.com"
        }))
        .unwrap();
        let json = input.validate(false).unwrap_err().to_json();
        assert!(json["field_errors"].get("status").is_some());
        assert!(json["field_errors"].get("website").is_some());
    }

    #[test]
    fn fields_are_trimmed_and_sparse() {
        let input: CardInput = serde_json::from_value(json!({
            "title": " Engineer ",
            "email": "Ada@Example.com"
        }))
        .unwrap();
        let fields = input.into_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["title"], "Engineer");
        assert_eq!(fields["email"], "ada@example.com");
    }

    #[test]
    fn server_fields_cannot_be_sent() {
        let input: CardInput = serde_json::from_value(json!({ "title": "x", "views": 1000, "user": "someone" })).unwrap();
        let fields = input.into_fields();
        assert!(fields.get("views").is_none());
        assert!(fields.get("user").is_none());
    }
}
