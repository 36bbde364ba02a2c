use sqlx::postgres::PgArguments;
use sqlx::{FromRow, Postgres};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::filter::filter_order::FilterOrder;
use crate::filter::{Filter, FindOptions, SqlParam, SqlResult};

pub const DOCUMENT_COLUMNS: &str = "id, created_at, updated_at, doc";

/// Builds SQL against a document table: `(id, created_at, updated_at, doc jsonb)`
pub struct QueryBuilder {
    table: String,
}

impl QueryBuilder {
    pub fn new(table_name: &str) -> Result<Self, DatabaseError> {
        if !DatabaseManager::is_valid_collection_name(table_name) {
            return Err(DatabaseError::InvalidCollection(table_name.to_string()));
        }
        Ok(Self { table: DatabaseManager::quote_identifier(table_name) })
    }

    pub fn select(&self, filter: &Filter, options: &FindOptions) -> Result<SqlResult, DatabaseError> {
        let where_sql = filter.to_where_sql(0)?;
        let mut query = format!(
            "SELECT {} FROM {} WHERE {} {}",
            DOCUMENT_COLUMNS,
            self.table,
            where_sql.query,
            FilterOrder::generate(&options.order)
        );
        if let Some(limit) = options.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }
        if options.offset > 0 {
            query.push_str(&format!(" OFFSET {}", options.offset));
        }
        Ok(SqlResult { query, params: where_sql.params })
    }

    pub fn count(&self, filter: &Filter) -> Result<SqlResult, DatabaseError> {
        let where_sql = filter.to_where_sql(0)?;
        Ok(SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM {} WHERE {}", self.table, where_sql.query),
            params: where_sql.params,
        })
    }

    pub fn delete(&self, filter: &Filter) -> Result<SqlResult, DatabaseError> {
        let where_sql = filter.to_where_sql(0)?;
        Ok(SqlResult {
            query: format!("DELETE FROM {} WHERE {}", self.table, where_sql.query),
            params: where_sql.params,
        })
    }

    pub fn get(&self) -> String {
        format!("SELECT {} FROM {} WHERE id = $1", DOCUMENT_COLUMNS, self.table)
    }

    pub fn insert(&self) -> String {
        format!(
            "INSERT INTO {} (id, created_at, updated_at, doc) VALUES ($1, $2, $3, $4) RETURNING {}",
            self.table, DOCUMENT_COLUMNS
        )
    }

    pub fn update(&self) -> String {
        format!(
            "UPDATE {} SET doc = doc || $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            self.table, DOCUMENT_COLUMNS
        )
    }

    /// Row-level read-modify-write of a numeric field: `$2` field, `$3` amount
    pub fn increment(&self) -> String {
        format!(
            "UPDATE {} SET doc = jsonb_set(doc, ARRAY[$2::text], \
             to_jsonb(COALESCE((doc ->> $2::text)::bigint, 0) + $3::bigint)), updated_at = $4 \
             WHERE id = $1 RETURNING {}",
            self.table, DOCUMENT_COLUMNS
        )
    }

    pub fn delete_one(&self) -> String {
        format!("DELETE FROM {} WHERE id = $1", self.table)
    }
}

pub fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    p: &SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match p {
        SqlParam::Json(v) => q.bind(v.clone()),
        SqlParam::Uuid(id) => q.bind(*id),
        SqlParam::UuidList(ids) => q.bind(ids.clone()),
        SqlParam::Timestamp(ts) => q.bind(*ts),
        SqlParam::TimestampList(stamps) => q.bind(stamps.clone()),
    }
}

pub fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    p: &SqlParam,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match p {
        SqlParam::Json(v) => q.bind(v.clone()),
        SqlParam::Uuid(id) => q.bind(*id),
        SqlParam::UuidList(ids) => q.bind(ids.clone()),
        SqlParam::Timestamp(ts) => q.bind(*ts),
        SqlParam::TimestampList(stamps) => q.bind(stamps.clone()),
    }
}
