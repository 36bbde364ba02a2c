use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Number, Value};
use uuid::Uuid;

use super::error::FilterError;
use super::types::{FilterOp, EXACT, TIME_RANGE};

/// Declared value type of a filterable field; query-string values are coerced to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Id,
    Timestamp,
}

impl FieldKind {
    pub fn coerce(&self, field: &str, raw: &str) -> Result<Value, FilterError> {
        let invalid = |message: &str| FilterError::InvalidValue {
            field: field.to_string(),
            message: message.to_string(),
        };
        let raw = raw.trim();

        match self {
            FieldKind::Text => Ok(Value::String(raw.to_string())),
            FieldKind::Number => {
                if let Ok(i) = raw.parse::<i64>() {
                    return Ok(Value::Number(i.into()));
                }
                raw.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| invalid("expected a number"))
            }
            FieldKind::Bool => match raw {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid("expected true or false")),
            },
            FieldKind::Id => Uuid::parse_str(raw)
                .map(|id| Value::String(id.to_string()))
                .map_err(|_| invalid("expected a UUID")),
            FieldKind::Timestamp => parse_timestamp(raw)
                .map(|ts| Value::String(format_timestamp(&ts)))
                .ok_or_else(|| invalid("expected an RFC3339 timestamp or YYYY-MM-DD date")),
        }
    }
}

/// Canonical timestamp text. Fixed precision keeps lexicographic order chronological.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub ops: &'static [FilterOp],
}

impl FieldRule {
    pub const fn new(name: &'static str, kind: FieldKind, ops: &'static [FilterOp]) -> Self {
        Self { name, kind, ops }
    }

    pub fn allows(&self, op: FilterOp) -> bool {
        self.ops.contains(&op)
    }
}

/// Fields every document carries
const SYSTEM_RULES: &[FieldRule] = &[
    FieldRule::new("id", FieldKind::Id, EXACT),
    FieldRule::new("created_at", FieldKind::Timestamp, TIME_RANGE),
    FieldRule::new("updated_at", FieldKind::Timestamp, TIME_RANGE),
];

/// Allow-list of filterable and sortable fields for one collection
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy {
    fields: &'static [FieldRule],
}

impl FieldPolicy {
    pub const fn new(fields: &'static [FieldRule]) -> Self {
        Self { fields }
    }

    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .chain(SYSTEM_RULES.iter())
            .find(|rule| rule.name == name)
    }

    pub fn is_system(name: &str) -> bool {
        SYSTEM_RULES.iter().any(|rule| rule.name == name)
    }
}
