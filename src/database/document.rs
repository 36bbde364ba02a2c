use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::filter::policy::format_timestamp;

/// Stored fields that never leave the server
pub const HIDDEN_FIELDS: &[&str] = &["password", "reset_password_token", "reset_password_expire"];

/// A stored record: identifier, timestamps and free-form JSON fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self::with_timestamps(Uuid::new_v4(), now, now, fields)
    }

    pub fn with_timestamps(id: Uuid, created_at: DateTime<Utc>, updated_at: DateTime<Utc>, fields: Map<String, Value>) -> Self {
        Self { id, created_at, updated_at, fields }
    }

    /// Field lookup including the system fields, in their canonical JSON form
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.to_string())),
            "created_at" => Some(Value::String(format_timestamp(&self.created_at))),
            "updated_at" => Some(Value::String(format_timestamp(&self.updated_at))),
            _ => self.fields.get(name).filter(|v| !v.is_null()).cloned(),
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Reference fields hold the referenced id as a string
    pub fn get_ref(&self, name: &str) -> Option<Uuid> {
        self.get_str(name).and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }

    /// Shallow merge; later values win
    pub fn merge(&mut self, changes: Map<String, Value>) {
        for (key, value) in changes {
            self.fields.insert(key, value);
        }
        self.updated_at = Utc::now();
    }

    /// Public JSON shape: id first, then fields, then timestamps. Hidden fields are dropped.
    pub fn to_json(&self) -> Value {
        Value::Object(self.project(None))
    }

    /// Restrict output to `select` (plus id). `None` keeps every visible field.
    pub fn project(&self, select: Option<&[String]>) -> Map<String, Value> {
        let wanted = |name: &str| select.map_or(true, |fields| fields.iter().any(|f| f == name));

        let mut out = Map::new();
        out.insert("id".into(), Value::String(self.id.to_string()));
        for (key, value) in &self.fields {
            if HIDDEN_FIELDS.contains(&key.as_str()) || key == "id" || !wanted(key) {
                continue;
            }
            out.insert(key.clone(), value.clone());
        }
        for stamp in ["created_at", "updated_at"] {
            if wanted(stamp) {
                if let Some(value) = self.field(stamp) {
                    out.insert(stamp.into(), value);
                }
            }
        }
        out
    }
}
