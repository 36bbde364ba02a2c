//! Entity input types, validation and per-collection filter policies

pub mod activity;
pub mod card;
pub mod collection;
pub mod connection;
pub mod favourite;
pub mod organization;
pub mod setting;
pub mod user;

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Collects per-field messages while checking a request body
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Present and non-blank; `required` makes absence an error too
    pub fn text(&mut self, field: &str, value: Option<&str>, required: bool, max_len: usize) {
        match value.map(str::trim) {
            None if required => self.add(field, format!("Please add a {}", field.replace('_', " "))),
            None => {}
            Some("") => self.add(field, format!("{} cannot be empty", field)),
            Some(text) if text.chars().count() > max_len => {
                self.add(field, format!("{} cannot be more than {} characters", field, max_len))
            }
            Some(_) => {}
        }
    }

    /// Optional free text: may be empty, bounded in length
    pub fn optional(&mut self, field: &str, value: Option<&str>, max_len: usize) {
        if let Some(text) = value {
            self.check(
                text.trim().chars().count() <= max_len,
                field,
                &format!("{} cannot be more than {} characters", field, max_len),
            );
        }
    }

    pub fn one_of(&mut self, field: &str, value: Option<&str>, allowed: &[&str]) {
        if let Some(value) = value {
            if !allowed.contains(&value) {
                self.add(field, format!("{} must be one of: {}", field, allowed.join(", ")));
            }
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.check(is_valid_email(value), field, "Please add a valid email");
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::invalid_fields(self.errors))
        }
    }
}

/// `local@domain.tld` with no whitespace
pub fn is_valid_email(raw: &str) -> bool {
    let raw = raw.trim();
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !raw.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2 && !tld.ends_with('.'))
}

/// Serialize an input struct into stored fields. `None` members are left out so
/// the same struct serves create and partial update.
pub fn to_fields<T: Serialize>(input: &T) -> Map<String, Value> {
    match serde_json::to_value(input) {
        Ok(Value::Object(map)) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        _ => Map::new(),
    }
}

/// Trim every string value
pub fn trimmed(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, Value::String(s.trim().to_string())),
            other => (k, other),
        })
        .collect()
}
