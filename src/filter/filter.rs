use serde_json::Value;

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterWhereInfo, SqlParam, SqlResult};
use crate::database::document::Document;

/// Conjunction of field conditions shared by count, fetch and delete queries
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<FilterWhereInfo>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter with a single equality condition
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(column, FilterOp::Eq, value)
    }

    /// Returns a new filter with one more condition ANDed on
    pub fn and(mut self, column: impl Into<String>, operator: FilterOp, value: impl Into<Value>) -> Self {
        self.conditions.push(FilterWhereInfo {
            column: column.into(),
            operator,
            data: value.into(),
        });
        self
    }

    pub fn and_condition(mut self, condition: FilterWhereInfo) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|condition| FilterWhere::evaluate(condition, document))
    }

    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        let (query, params): (String, Vec<SqlParam>) =
            FilterWhere::generate(&self.conditions, starting_param_index)?;
        Ok(SqlResult { query, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn card(status: &str, views: i64) -> Document {
        let mut fields = Map::new();
        fields.insert("status".into(), json!(status));
        fields.insert("views".into(), json!(views));
        Document::new(fields)
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&card("active", 0)));
    }

    #[test]
    fn conditions_are_conjunctive() {
        let filter = Filter::eq("status", "active").and("views", FilterOp::Gte, 5);
        assert!(filter.matches(&card("active", 5)));
        assert!(!filter.matches(&card("active", 4)));
        assert!(!filter.matches(&card("draft", 10)));
    }

    #[test]
    fn missing_field_never_matches() {
        let filter = Filter::eq("organization", "x");
        assert!(!filter.matches(&card("active", 1)));
    }

    #[test]
    fn in_matches_any_candidate() {
        let filter = Filter::new().and("status", FilterOp::In, json!(["draft", "active"]));
        assert!(filter.matches(&card("active", 0)));
        assert!(!filter.matches(&card("inactive", 0)));
    }

    #[test]
    fn where_sql_numbers_params_from_offset() {
        let filter = Filter::eq("status", "active");
        let sql = filter.to_where_sql(1).unwrap();
        assert_eq!(sql.query, "doc -> 'status' = $2::jsonb");
        assert_eq!(sql.params, vec![SqlParam::Json(json!("active"))]);
    }
}
