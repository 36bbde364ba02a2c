use std::cmp::Ordering;

use super::error::FilterError;
use super::filter_where::json_path;
use super::policy::FieldPolicy;
use super::types::{compare_values, FilterOrderInfo, SortDirection};
use crate::database::document::Document;

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `sort=-views,title`: comma-separated fields, `-` prefix for descending
    pub fn parse(spec: &str, policy: &FieldPolicy) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in spec.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (column, sort) = match trimmed.strip_prefix('-') {
                Some(column) => (column, SortDirection::Desc),
                None => (trimmed.strip_prefix('+').unwrap_or(trimmed), SortDirection::Asc),
            };
            if policy.rule(column).is_none() {
                return Err(FilterError::InvalidSortField(column.to_string()));
            }
            out.push(FilterOrderInfo { column: column.to_string(), sort });
        }
        Ok(out)
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        let mut parts: Vec<String> = infos
            .iter()
            .map(|info| {
                let expr = if FieldPolicy::is_system(&info.column) {
                    format!("\"{}\"", info.column)
                } else {
                    json_path(&info.column)
                };
                format!("{} {}", expr, info.sort.to_sql())
            })
            .collect();
        // Stable paging when sort keys tie
        parts.push("\"id\" ASC".to_string());
        format!("ORDER BY {}", parts.join(", "))
    }

    /// In-process equivalent of the ORDER BY produced by `generate`
    pub fn compare(left: &Document, right: &Document, infos: &[FilterOrderInfo]) -> Ordering {
        for info in infos {
            let ordering = match (left.field(&info.column), right.field(&info.column)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => compare_values(&a, &b).unwrap_or(Ordering::Equal),
            };
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        left.id.cmp(&right.id)
    }
}
