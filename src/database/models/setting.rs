use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{to_fields, trimmed, FieldErrors};
use crate::error::ApiError;

pub const THEMES: &[&str] = &["light", "dark", "system"];

/// Settings a user starts with before changing anything
pub fn defaults() -> Map<String, Value> {
    match json!({
        "theme": "system",
        "language": "en",
        "notifications": true,
        "default_visibility": "public"
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SettingsUpdate {
    pub theme: Option<String>,
    pub language: Option<String>,
    pub notifications: Option<bool>,
    pub default_visibility: Option<String>,
}

impl SettingsUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.one_of("theme", self.theme.as_deref(), THEMES);
        errors.text("language", self.language.as_deref(), false, 10);
        errors.one_of("default_visibility", self.default_visibility.as_deref(), super::card::VISIBILITIES);
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
    fn defaults_are_valid_choices() {
        let defaults = defaults();
        assert!(THEMES.contains(&defaults["theme"].as_str().unwrap()));
        assert_eq!(defaults["default_visibility"], "public");
    }

    #[test]
    fn rejects_unknown_theme() {
        let update = SettingsUpdate { theme: Some("neon".into()), ..Default::default() };
        assert!(update.validate().is_err());
        let update = SettingsUpdate { notifications: Some(false), ..Default::default() };
        assert_eq!(update.into_fields()["notifications"], false);
    }
}
