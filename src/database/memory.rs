use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::collection::{Collection, CollectionSpec};
use crate::database::document::Document;
use crate::database::manager::DatabaseError;
use crate::filter::filter_order::FilterOrder;
use crate::filter::{Filter, FindOptions};

/// In-process collection used for development and tests
pub struct MemoryCollection {
    spec: CollectionSpec,
    documents: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    pub fn new(spec: CollectionSpec) -> Self {
        Self { spec, documents: RwLock::new(Vec::new()) }
    }

    /// Store a prepared document as-is (keeps its id and timestamps)
    pub async fn insert_document(&self, document: Document) -> Result<Document, DatabaseError> {
        let mut documents = self.documents.write().await;
        self.check_unique(&documents, &document)?;
        documents.push(document.clone());
        Ok(document)
    }

    fn check_unique(&self, documents: &[Document], candidate: &Document) -> Result<(), DatabaseError> {
        for group in self.spec.unique {
            let key: Vec<Option<Value>> = group.iter().map(|f| candidate.field(f)).collect();
            if key.iter().any(Option::is_none) {
                continue;
            }
            let clash = documents.iter().any(|existing| {
                existing.id != candidate.id && group.iter().map(|f| existing.field(f)).collect::<Vec<_>>() == key
            });
            if clash {
                return Err(DatabaseError::Duplicate(format!("{}_{}_key", self.spec.name, group.join("_"))));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    async fn count(&self, filter: &Filter) -> Result<u64, DatabaseError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().filter(|d| filter.matches(d)).count() as u64)
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>, DatabaseError> {
        let documents = self.documents.read().await;
        let mut matched: Vec<&Document> = documents.iter().filter(|d| filter.matches(d)).collect();
        matched.sort_by(|a, b| FilterOrder::compare(a, b, &options.order));

        let offset = usize::try_from(options.offset).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(matched.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Document>, DatabaseError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|d| d.id == id).cloned())
    }

    async fn insert(&self, fields: Map<String, Value>) -> Result<Document, DatabaseError> {
        self.insert_document(Document::new(fields)).await
    }

    async fn update(&self, id: Uuid, changes: Map<String, Value>) -> Result<Option<Document>, DatabaseError> {
        let mut documents = self.documents.write().await;
        let Some(index) = documents.iter().position(|d| d.id == id) else {
            return Ok(None);
        };

        let mut updated = documents[index].clone();
        updated.merge(changes);
        self.check_unique(&documents, &updated)?;

        documents[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn increment(&self, id: Uuid, field: &str, by: i64) -> Result<Option<Document>, DatabaseError> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };

        let current = document.get_i64(field).unwrap_or(0);
        let mut changes = Map::new();
        changes.insert(field.to_string(), Value::from(current.saturating_add(by)));
        document.merge(changes);
        Ok(Some(document.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|d| d.id != id);
        Ok(documents.len() != before)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, DatabaseError> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|d| !filter.matches(d));
        Ok((before - documents.len()) as u64)
    }
}
