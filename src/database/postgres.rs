use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use crate::database::collection::{Collection, CollectionSpec};
use crate::database::document::Document;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::query_builder::{bind_param_query, bind_param_query_as, QueryBuilder};
use crate::filter::{Filter, FindOptions};

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    doc: Value,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        let fields = match row.doc {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Document::with_timestamps(row.id, row.created_at, row.updated_at, fields)
    }
}

/// Collection stored as a PostgreSQL table with a JSONB document column
pub struct PgCollection {
    spec: CollectionSpec,
    builder: QueryBuilder,
    pool: PgPool,
}

impl PgCollection {
    pub fn new(spec: CollectionSpec, pool: PgPool) -> Result<Self, DatabaseError> {
        let builder = QueryBuilder::new(spec.name)?;
        Ok(Self { spec, builder, pool })
    }

    /// Create the table and its indexes when missing
    pub async fn ensure_table(&self) -> Result<(), DatabaseError> {
        let table = DatabaseManager::quote_identifier(self.spec.name);
        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                doc JSONB NOT NULL DEFAULT '{{}}'::jsonb
            )",
            table
        );
        sqlx::query(&create).execute(&self.pool).await?;

        let created_index = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (created_at)",
            DatabaseManager::quote_identifier(&format!("{}_created_at_idx", self.spec.name)),
            table
        );
        sqlx::query(&created_index).execute(&self.pool).await?;

        for group in self.spec.unique {
            let index_name = format!("{}_{}_key", self.spec.name, group.join("_"));
            let columns = group
                .iter()
                .map(|field| format!("(doc ->> '{}')", field.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(", ");
            let unique = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
                DatabaseManager::quote_identifier(&index_name),
                table,
                columns
            );
            sqlx::query(&unique).execute(&self.pool).await?;
        }

        tracing::debug!("Ensured table {}", self.spec.name);
        Ok(())
    }
}

#[async_trait]
impl Collection for PgCollection {
    fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    async fn count(&self, filter: &Filter) -> Result<u64, DatabaseError> {
        let sql = self.builder.count(filter)?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>, DatabaseError> {
        let sql = self.builder.select(filter, options)?;
        let mut q = sqlx::query_as::<_, DocumentRow>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Document>, DatabaseError> {
        let query = self.builder.get();
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn insert(&self, fields: Map<String, Value>) -> Result<Document, DatabaseError> {
        let document = Document::new(fields);
        let query = self.builder.insert();
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(document.id)
            .bind(document.created_at)
            .bind(document.updated_at)
            .bind(Value::Object(document.fields))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, changes: Map<String, Value>) -> Result<Option<Document>, DatabaseError> {
        let query = self.builder.update();
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .bind(Value::Object(changes))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn increment(&self, id: Uuid, field: &str, by: i64) -> Result<Option<Document>, DatabaseError> {
        let query = self.builder.increment();
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .bind(field)
            .bind(by)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let query = self.builder.delete_one();
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, DatabaseError> {
        let sql = self.builder.delete(filter)?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
