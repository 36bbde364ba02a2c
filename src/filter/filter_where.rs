use serde_json::Value;
use uuid::Uuid;

use super::error::FilterError;
use super::policy::{parse_timestamp, FieldPolicy};
use super::types::{compare_values, FilterOp, FilterWhereInfo, SqlParam};
use crate::database::document::Document;

pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Turn one query-string pair into a condition, validated against the policy.
    ///
    /// `field=value` is equality, `field[op]=value` applies `op`; `in` takes a
    /// comma-separated list.
    pub fn parse_param(key: &str, raw: &str, policy: &FieldPolicy) -> Result<FilterWhereInfo, FilterError> {
        let (field, token) = Self::split_key(key);

        let rule = policy
            .rule(field)
            .ok_or_else(|| FilterError::UnknownField(field.to_string()))?;

        let operator = match token {
            None => FilterOp::Eq,
            Some(token) => FilterOp::from_token(token).ok_or_else(|| FilterError::UnsupportedOperator {
                field: field.to_string(),
                operator: token.to_string(),
            })?,
        };

        if !rule.allows(operator) {
            return Err(FilterError::UnsupportedOperator {
                field: field.to_string(),
                operator: operator.token().to_string(),
            });
        }

        let data = if operator == FilterOp::In {
            let values = raw
                .split(',')
                .map(|part| rule.kind.coerce(field, part))
                .collect::<Result<Vec<_>, _>>()?;
            Value::Array(values)
        } else {
            rule.kind.coerce(field, raw)?
        };

        Ok(FilterWhereInfo { column: field.to_string(), operator, data })
    }

    /// `views[gte]` -> ("views", Some("gte")); anything else is a plain field name
    fn split_key(key: &str) -> (&str, Option<&str>) {
        if let Some(stripped) = key.strip_suffix(']') {
            if let Some((field, token)) = stripped.split_once('[') {
                if !field.is_empty() && !token.contains(['[', ']']) {
                    return (field, Some(token));
                }
            }
        }
        (key, None)
    }

    /// Evaluate a condition against a document in process
    pub fn evaluate(condition: &FilterWhereInfo, document: &Document) -> bool {
        let Some(stored) = document.field(&condition.column) else {
            return false;
        };

        match (&condition.operator, &condition.data) {
            (FilterOp::In, Value::Array(candidates)) => candidates
                .iter()
                .any(|candidate| compare_values(&stored, candidate).is_some_and(|o| o.is_eq())),
            (op, operand) => compare_values(&stored, operand).is_some_and(|o| op.accepts(o)),
        }
    }

    /// Render conditions as an AND-joined SQL predicate over the document table
    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> Result<(String, Vec<SqlParam>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut parts = Vec::with_capacity(conditions.len());
        for condition in conditions {
            parts.push(filter_where.build_sql_condition(condition)?);
        }
        let where_clause = if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") };
        Ok((where_clause, filter_where.param_values))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = condition.column.as_str();

        match column {
            "id" => {
                let ids = Self::typed_values(condition, |s| Uuid::parse_str(s).ok())?;
                Ok(self.system_condition(column, condition.operator, ids, SqlParam::Uuid, SqlParam::UuidList))
            }
            "created_at" | "updated_at" => {
                let stamps = Self::typed_values(condition, parse_timestamp)?;
                Ok(self.system_condition(column, condition.operator, stamps, SqlParam::Timestamp, SqlParam::TimestampList))
            }
            _ => {
                let path = json_path(column);
                match (&condition.operator, &condition.data) {
                    (FilterOp::In, Value::Array(values)) => {
                        if values.is_empty() {
                            return Ok("1=0".to_string());
                        }
                        let param = self.param(SqlParam::Json(Value::Array(values.clone())));
                        Ok(format!("{}::jsonb @> jsonb_build_array({})", param, path))
                    }
                    (FilterOp::Eq, data) => {
                        let param = self.param(SqlParam::Json(data.clone()));
                        Ok(format!("{} = {}::jsonb", path, param))
                    }
                    // jsonb orders across types (null < string < number); only compare like with like
                    (op, data) => {
                        let param = self.param(SqlParam::Json(data.clone()));
                        Ok(format!(
                            "(jsonb_typeof({path}) = jsonb_typeof({param}::jsonb) AND {path} {} {param}::jsonb)",
                            op.to_sql()
                        ))
                    }
                }
            }
        }
    }

    fn system_condition<T>(
        &mut self,
        column: &str,
        operator: FilterOp,
        mut values: Vec<T>,
        single: fn(T) -> SqlParam,
        list: fn(Vec<T>) -> SqlParam,
    ) -> String {
        let quoted = format!("\"{}\"", column);
        if operator == FilterOp::In {
            if values.is_empty() {
                return "1=0".to_string();
            }
            let param = self.param(list(values));
            return format!("{} = ANY({})", quoted, param);
        }
        match values.pop() {
            Some(value) => {
                let param = self.param(single(value));
                format!("{} {} {}", quoted, operator.to_sql(), param)
            }
            None => "1=0".to_string(),
        }
    }

    fn typed_values<T>(condition: &FilterWhereInfo, parse: impl Fn(&str) -> Option<T>) -> Result<Vec<T>, FilterError> {
        let invalid = || FilterError::InvalidValue {
            field: condition.column.clone(),
            message: "value has the wrong type".to_string(),
        };
        let raw: Vec<&Value> = match &condition.data {
            Value::Array(values) => values.iter().collect(),
            other => vec![other],
        };
        raw.into_iter()
            .map(|v| v.as_str().and_then(&parse).ok_or_else(invalid))
            .collect()
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// `doc -> 'field'` with the field name escaped as a SQL literal
pub fn json_path(column: &str) -> String {
    format!("doc -> '{}'", column.replace('\'', "''"))
}
