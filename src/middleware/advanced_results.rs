use std::collections::HashMap;
use std::sync::Arc;

use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::{Collection, DatabaseError, Document};
use crate::filter::{Filter, FilterOp, FindOptions, ListRequest};

/// Expand a reference field into the referenced document
#[derive(Clone)]
pub struct Populate {
    pub field: &'static str,
    pub collection: Arc<dyn Collection>,
    pub select: Option<Vec<String>>,
}

impl Populate {
    pub fn new(field: &'static str, collection: Arc<dyn Collection>) -> Self {
        Self { field, collection, select: None }
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Replace ids in `field` with the referenced documents. Single references that
    /// no longer resolve become `null`; arrays keep only the ids that resolve.
    async fn expand(&self, rows: &mut [Map<String, Value>]) -> Result<(), DatabaseError> {
        let ids: Vec<Value> = rows
            .iter()
            .filter_map(|row| row.get(self.field))
            .flat_map(reference_ids)
            .map(|id| Value::String(id.to_string()))
            .collect();
        if ids.is_empty() {
            return Ok(());
        }

        let filter = Filter::new().and("id", FilterOp::In, Value::Array(ids));
        let found: HashMap<Uuid, Document> = self
            .collection
            .find(&filter, &FindOptions::default())
            .await?
            .into_iter()
            .map(|doc| (doc.id, doc))
            .collect();
        let render = |id: &Uuid| found.get(id).map(|doc| Value::Object(doc.project(self.select.as_deref())));

        for row in rows.iter_mut() {
            let Some(current) = row.get_mut(self.field) else {
                continue;
            };
            *current = match &*current {
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .filter_map(|item| item.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                        .filter_map(|id| render(&id))
                        .collect(),
                ),
                Value::String(raw) => Uuid::parse_str(raw)
                    .ok()
                    .and_then(|id| render(&id))
                    .unwrap_or(Value::Null),
                _ => continue,
            };
        }
        Ok(())
    }
}

fn reference_ids(value: &Value) -> Vec<Uuid> {
    match value {
        Value::String(raw) => Uuid::parse_str(raw).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().and_then(|s| Uuid::parse_str(s).ok()))
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    /// `next` iff more records lie past this page, `prev` iff this is not the first page
    pub fn for_page(page: u32, limit: u32, total: u64) -> Self {
        let end = u64::from(page) * u64::from(limit);
        Self {
            next: (end < total).then(|| PageRef { page: page + 1, limit }),
            prev: (page > 1).then(|| PageRef { page: page - 1, limit }),
        }
    }
}

/// `{ success, count, pagination, data }`; `count` is the page length
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEnvelope {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<Value>,
}

impl IntoResponse for ListEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Run a listing request: count, fetch the page, project, then populate.
///
/// Count and fetch are separate reads without a shared snapshot, so a write in
/// between can make `next` disagree with the data by one page.
pub async fn advanced_results(
    collection: &dyn Collection,
    request: &ListRequest,
    populate: &[Populate],
) -> Result<ListEnvelope, DatabaseError> {
    let total = collection.count(&request.filter).await?;
    let documents = collection.find(&request.filter, &request.find_options()).await?;

    let mut rows: Vec<Map<String, Value>> = documents
        .iter()
        .map(|doc| doc.project(request.select.as_deref()))
        .collect();
    for spec in populate {
        spec.expand(&mut rows).await?;
    }

    tracing::debug!(
        "Listed {} of {} from {} (page {}, limit {})",
        rows.len(),
        total,
        collection.name(),
        request.page,
        request.limit
    );

    Ok(ListEnvelope {
        success: true,
        count: rows.len(),
        pagination: Pagination::for_page(request.page, request.limit, total),
        data: rows.into_iter().map(Value::Object).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListingConfig;
    use crate::database::memory::MemoryCollection;
    use crate::database::CollectionSpec;
    use crate::filter::{FieldKind, FieldPolicy, FieldRule, RANGE};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    const CARDS: CollectionSpec = CollectionSpec { name: "cards", unique: &[] };
    const USERS: CollectionSpec = CollectionSpec { name: "users", unique: &[] };
    const POLICY: FieldPolicy = FieldPolicy::new(&[
        FieldRule::new("title", FieldKind::Text, RANGE),
        FieldRule::new("status", FieldKind::Text, RANGE),
        FieldRule::new("views", FieldKind::Number, RANGE),
    ]);

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Cards numbered 1..=n; card 1 is the oldest
    async fn seeded(n: i64) -> MemoryCollection {
        let cards = MemoryCollection::new(CARDS);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for i in 1..=n {
            let at = base + Duration::minutes(i);
            let doc = Document::with_timestamps(
                Uuid::new_v4(),
                at,
                at,
                fields(json!({ "title": format!("card {}", i), "status": "active", "views": i })),
            );
            cards.insert_document(doc).await.unwrap();
        }
        cards
    }

    fn request(raw: &[(&str, &str)]) -> ListRequest {
        let params: Vec<(String, String)> = raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ListRequest::from_query(&params, &POLICY, &ListingConfig { default_limit: 25, max_limit: 100 }).unwrap()
    }

    #[test]
    fn pagination_links() {
        assert_eq!(Pagination::for_page(1, 10, 0), Pagination::default());
        assert_eq!(
            Pagination::for_page(1, 10, 11),
            Pagination { next: Some(PageRef { page: 2, limit: 10 }), prev: None }
        );
        assert_eq!(
            Pagination::for_page(3, 10, 30),
            Pagination { next: None, prev: Some(PageRef { page: 2, limit: 10 }) }
        );
    }

    #[tokio::test]
    async fn second_page_of_thirty() {
        let cards = seeded(30).await;
        let envelope = advanced_results(&cards, &request(&[("limit", "10"), ("page", "2"), ("sort", "views")]), &[])
            .await
            .unwrap();

        assert_eq!(envelope.count, 10);
        let views: Vec<i64> = envelope.data.iter().filter_map(|row| row["views"].as_i64()).collect();
        assert_eq!(views, (11..=20).collect::<Vec<_>>());
        assert_eq!(
            serde_json::to_value(&envelope.pagination).unwrap(),
            json!({ "next": { "page": 3, "limit": 10 }, "prev": { "page": 1, "limit": 10 } })
        );
    }

    #[tokio::test]
    async fn no_matches_has_empty_pagination() {
        let cards = seeded(5).await;
        let envelope = advanced_results(&cards, &request(&[("status", "draft")]), &[]).await.unwrap();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "success": true, "count": 0, "pagination": {}, "data": [] })
        );
    }

    #[tokio::test]
    async fn default_sort_is_newest_first() {
        let cards = seeded(5).await;
        let envelope = advanced_results(&cards, &request(&[]), &[]).await.unwrap();
        let stamps: Vec<&str> = envelope.data.iter().filter_map(|row| row["created_at"].as_str()).collect();
        assert_eq!(stamps.len(), 5);
        assert!(stamps.windows(2).all(|pair| pair[0] >= pair[1]));
        assert_eq!(envelope.data[0]["views"], 5);
    }

    #[tokio::test]
    async fn comparison_filter_and_select() {
        let cards = seeded(10).await;
        let envelope = advanced_results(&cards, &request(&[("views[gte]", "5"), ("select", "title,status")]), &[])
            .await
            .unwrap();

        assert_eq!(envelope.count, 6);
        for row in &envelope.data {
            let keys: Vec<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["id", "status", "title"]);
        }
    }

    #[tokio::test]
    async fn filter_selects_only_matching_views() {
        let cards = seeded(10).await;
        let envelope = advanced_results(&cards, &request(&[("views[gte]", "5"), ("views[lt]", "8")]), &[])
            .await
            .unwrap();
        let mut views: Vec<i64> = envelope.data.iter().filter_map(|row| row["views"].as_i64()).collect();
        views.sort();
        assert_eq!(views, vec![5, 6, 7]);
    }

    #[tokio::test]
    async fn repeated_requests_are_identical() {
        let cards = seeded(12).await;
        let listing = request(&[("limit", "5"), ("page", "2")]);
        let first = advanced_results(&cards, &listing, &[]).await.unwrap();
        let second = advanced_results(&cards, &listing, &[]).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn populate_expands_and_nulls_dangling_refs() {
        let users: Arc<dyn Collection> = Arc::new(MemoryCollection::new(USERS));
        let ada = users
            .insert(fields(json!({ "name": "Ada", "email": "ada@example.com", "password": "hash" })))
            .await
            .unwrap();

        let cards = MemoryCollection::new(CARDS);
        cards.insert(fields(json!({ "title": "mine", "user": ada.id.to_string() }))).await.unwrap();
        cards
            .insert(fields(json!({ "title": "orphan", "user": Uuid::new_v4().to_string() })))
            .await
            .unwrap();

        let populate = [Populate::new("user", users).select(&["name", "password"])];
        let envelope = advanced_results(&cards, &request(&[("sort", "title")]), &populate).await.unwrap();

        assert_eq!(envelope.data[0]["title"], "mine");
        assert_eq!(envelope.data[0]["user"], json!({ "id": ada.id.to_string(), "name": "Ada" }));
        assert_eq!(envelope.data[1]["user"], Value::Null);
    }

    #[tokio::test]
    async fn populate_drops_missing_array_members() {
        let targets: Arc<dyn Collection> = Arc::new(MemoryCollection::new(CARDS));
        let kept = targets.insert(fields(json!({ "title": "kept" }))).await.unwrap();

        let owners = MemoryCollection::new(USERS);
        owners
            .insert(fields(json!({ "name": "list", "cards": [kept.id.to_string(), Uuid::new_v4().to_string()] })))
            .await
            .unwrap();

        let populate = [Populate::new("cards", targets).select(&["title"])];
        let envelope = advanced_results(&owners, &request(&[]), &populate).await.unwrap();
        assert_eq!(envelope.data[0]["cards"], json!([{ "id": kept.id.to_string(), "title": "kept" }]));
    }
}
