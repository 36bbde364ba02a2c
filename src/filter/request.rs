use super::error::FilterError;
use super::filter::Filter;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::policy::FieldPolicy;
use super::types::{FilterOrderInfo, FilterWhereInfo};
use crate::config::ListingConfig;

/// Sort, offset and limit for a fetch
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub order: Vec<FilterOrderInfo>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn sorted(order: Vec<FilterOrderInfo>) -> Self {
        Self { order, ..Self::default() }
    }
}

/// A fully composed listing request: filter, sort, page window and projection.
///
/// Built once from the query string and never mutated; scoping produces a new value.
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub filter: Filter,
    pub order: Vec<FilterOrderInfo>,
    pub select: Option<Vec<String>>,
    pub page: u32,
    pub limit: u32,
}

impl ListRequest {
    pub fn from_query(
        params: &[(String, String)],
        policy: &FieldPolicy,
        listing: &ListingConfig,
    ) -> Result<Self, FilterError> {
        let mut filter = Filter::new();
        let mut order = None;
        let mut select = None;
        let mut page = 1;
        let mut limit = listing.default_limit;

        // select, sort, page and limit shape the output; every other key filters
        for (key, value) in params {
            match key.as_str() {
                "select" => {
                    let fields: Vec<String> = value
                        .split(',')
                        .map(str::trim)
                        .filter(|field| !field.is_empty())
                        .map(str::to_string)
                        .collect();
                    select = Some(fields);
                }
                "sort" => order = Some(FilterOrder::parse(value, policy)?),
                "page" => page = parse_positive(value).unwrap_or(1),
                "limit" => limit = parse_positive(value).unwrap_or(listing.default_limit),
                _ => filter = filter.and_condition(FilterWhere::parse_param(key, value, policy)?),
            }
        }

        let max_limit = listing.max_limit.max(1);
        let limit = if limit > max_limit {
            tracing::debug!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            max_limit
        } else {
            limit.max(1)
        };

        let order = match order {
            Some(order) if !order.is_empty() => order,
            _ => vec![FilterOrderInfo::desc("created_at")],
        };

        Ok(Self { filter, order, select, page, limit })
    }

    /// Same request with an extra condition the caller cannot override
    pub fn scoped(&self, condition: FilterWhereInfo) -> Self {
        Self {
            filter: self.filter.clone().and_condition(condition),
            ..self.clone()
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn find_options(&self) -> FindOptions {
        FindOptions {
            order: self.order.clone(),
            offset: self.offset(),
            limit: Some(u64::from(self.limit)),
        }
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}
