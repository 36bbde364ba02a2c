use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::document::Document;
use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FindOptions};

/// Static description of a collection: its name and unique field groups
#[derive(Debug, Clone, Copy)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub unique: &'static [&'static [&'static str]],
}

/// A queryable set of documents
#[async_trait]
pub trait Collection: Send + Sync {
    fn spec(&self) -> &CollectionSpec;

    fn name(&self) -> &'static str {
        self.spec().name
    }

    async fn count(&self, filter: &Filter) -> Result<u64, DatabaseError>;

    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>, DatabaseError>;

    async fn get(&self, id: Uuid) -> Result<Option<Document>, DatabaseError>;

    async fn insert(&self, fields: Map<String, Value>) -> Result<Document, DatabaseError>;

    /// Merge `changes` into the stored fields. `None` when the id does not exist.
    async fn update(&self, id: Uuid, changes: Map<String, Value>) -> Result<Option<Document>, DatabaseError>;

    /// Add `by` to an integer field in one step; a missing field counts as 0.
    /// `None` when the id does not exist.
    async fn increment(&self, id: Uuid, field: &str, by: i64) -> Result<Option<Document>, DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn delete_where(&self, filter: &Filter) -> Result<u64, DatabaseError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, DatabaseError> {
        let options = FindOptions { limit: Some(1), ..FindOptions::default() };
        Ok(self.find(filter, &options).await?.into_iter().next())
    }

    async fn get_404(&self, id: Uuid) -> Result<Document, DatabaseError> {
        self.get(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No {} record with id {}", self.name(), id)))
    }
}
