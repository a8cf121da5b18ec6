//! The persistence collaborator: record lookups, bounded queries and counts.

use crate::error::AppError;
use crate::model::{ColumnKind, RecordType, Row};
use crate::schema::{FieldErrors, LoadedRecord};
use crate::sql::{self, bind_all, bind_all_as, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row as _;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

/// A query over one record type. `limit`/`offset` bound [`RecordStore::fetch`];
/// [`RecordStore::count`] ignores both.
#[derive(Clone, Copy, Debug)]
pub struct Query<'a> {
    pub record_type: &'a RecordType,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl<'a> Query<'a> {
    pub fn new(record_type: &'a RecordType) -> Self {
        Query {
            record_type,
            limit: None,
            offset: None,
        }
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u32) -> Self {
        self.offset = Some(n);
        self
    }
}

/// Rows come back with every relationship loaded as an array of related rows,
/// ordered by primary key.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, record_type: &RecordType, id: i64) -> Result<Option<Row>, AppError>;

    async fn fetch(&self, query: &Query<'_>) -> Result<Vec<Row>, AppError>;

    async fn count(&self, query: &Query<'_>) -> Result<u64, AppError>;

    /// Stores the loaded record and its associations, returning the new primary key.
    /// Related keys that do not exist fail with a validation error.
    async fn insert(&self, record_type: &RecordType, record: &LoadedRecord) -> Result<i64, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

/// Opens a pool for a `sqlite:` uri. File databases get their parent directory
/// and the file created when missing; in-memory databases are pinned to one
/// long-lived connection so every query sees the same data.
pub async fn connect(uri: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(uri)?
        .create_if_missing(true)
        .foreign_keys(true);
    let in_memory = uri.contains(":memory:") || uri.contains("mode=memory");
    if !in_memory {
        if let Some(parent) = opts.get_filename().parent() {
            if parent != Path::new("") {
                std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
            }
        }
    }
    let pool_opts = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let pool = pool_opts.connect_with(opts).await?;
    tracing::info!(uri = %uri, "database connected");
    Ok(pool)
}

pub struct SqliteStore {
    pool: SqlitePool,
    record_types: Vec<&'static RecordType>,
}

impl SqliteStore {
    /// `record_types` are the relationship targets the store can embed.
    pub fn new(pool: SqlitePool, record_types: &[&'static RecordType]) -> Self {
        SqliteStore {
            pool,
            record_types: record_types.to_vec(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn target(&self, name: &str) -> Result<&'static RecordType, AppError> {
        self.record_types
            .iter()
            .copied()
            .find(|rt| rt.name == name)
            .ok_or_else(|| {
                crate::error::ModelError::MissingReference {
                    kind: "record type",
                    id: name.to_string(),
                }
                .into()
            })
    }

    async fn query_many(&self, record_type: &RecordType, q: &QueryBuf) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| decode_row(r, record_type, &self.record_types))
            .collect()
    }

    /// Fails with a field error per relationship naming every unknown key.
    async fn check_related(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        record_type: &RecordType,
        record: &LoadedRecord,
    ) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        for (name, keys) in &record.related {
            let Some(rel) = record_type.relationship(name) else {
                continue;
            };
            let target = self.target(rel.target)?;
            let q = sql::select_existing_keys(target, keys);
            tracing::debug!(sql = %q.sql, params = ?q.params, "query");
            let found: HashSet<i64> = bind_all_as(sqlx::query_as::<_, (i64,)>(&q.sql), &q.params)
                .fetch_all(&mut **tx)
                .await?
                .into_iter()
                .map(|(k,)| k)
                .collect();
            for key in keys.iter().filter(|k| !found.contains(*k)) {
                errors.add(*name, format!("No {} with id {}.", target.name, key));
            }
        }
        errors.into_result(()).map_err(AppError::Validation)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, record_type: &RecordType, id: i64) -> Result<Option<Row>, AppError> {
        let q = sql::select_by_id(record_type, &self.record_types, id);
        Ok(self.query_many(record_type, &q).await?.into_iter().next())
    }

    async fn fetch(&self, query: &Query<'_>) -> Result<Vec<Row>, AppError> {
        let q = sql::select_list(query.record_type, &self.record_types, query.limit, query.offset);
        self.query_many(query.record_type, &q).await
    }

    async fn count(&self, query: &Query<'_>) -> Result<u64, AppError> {
        let q = sql::count(query.record_type);
        tracing::debug!(sql = %q.sql, "query");
        let (n,): (i64,) = sqlx::query_as(&q.sql).fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn insert(&self, record_type: &RecordType, record: &LoadedRecord) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;
        self.check_related(&mut tx, record_type, record).await?;

        let q = sql::insert(record_type, &record.values);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let (pk,): (i64,) = bind_all_as(sqlx::query_as(&q.sql), &q.params)
            .fetch_one(&mut *tx)
            .await?;

        for (name, keys) in &record.related {
            let Some(rel) = record_type.relationship(name) else {
                continue;
            };
            for key in keys {
                let link = sql::insert_link(rel, pk, *key);
                tracing::debug!(sql = %link.sql, params = ?link.params, "query");
                bind_all(sqlx::query(&link.sql), &link.params)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(pk)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Relationships are decoded only when their target is among `targets`, the
/// same set the SELECT embeds.
fn decode_row(
    row: &SqliteRow,
    record_type: &RecordType,
    targets: &[&RecordType],
) -> Result<Row, AppError> {
    let mut map = Row::new();
    for col in record_type.columns {
        let value = match col.kind {
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(col.name)?
                .map(Value::from),
            ColumnKind::Text { .. } | ColumnKind::Date => row
                .try_get::<Option<String>, _>(col.name)?
                .map(Value::String),
        };
        map.insert(col.name.to_string(), value.unwrap_or(Value::Null));
    }
    for rel in record_type.relationships {
        if !targets.iter().any(|t| t.name == rel.target) {
            continue;
        }
        let raw = row.try_get::<Option<String>, _>(rel.name)?;
        let related = match raw {
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| AppError::Db(sqlx::Error::Decode(Box::new(e))))?,
            None => Value::Array(Vec::new()),
        };
        map.insert(rel.name.to_string(), related);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::library::{AUTHOR, BOOK};
    use serde_json::json;

    async fn select_one(sql: &str) -> Result<SqliteRow, AppError> {
        let pool = connect("sqlite::memory:").await?;
        Ok(sqlx::query(sql).fetch_one(&pool).await?)
    }

    #[tokio::test]
    async fn relationships_outside_the_targets_are_not_decoded() {
        let row = select_one("SELECT 1 AS id, 'Either/Or' AS title, 1843 AS published")
            .await
            .unwrap();
        let decoded = decode_row(&row, &BOOK, &[&BOOK]).unwrap();
        assert_eq!(decoded.get("title"), Some(&json!("Either/Or")));
        assert!(decoded.get("authors").is_none());
        assert!(decode_row(&row, &BOOK, &[&AUTHOR, &BOOK]).is_err());
    }

    #[tokio::test]
    async fn mistyped_relationship_column_is_an_error() {
        let row = select_one("SELECT 1 AS id, 'Either/Or' AS title, NULL AS published, 42 AS authors")
            .await
            .unwrap();
        let err = decode_row(&row, &BOOK, &[&AUTHOR, &BOOK]).unwrap_err();
        assert!(matches!(err, AppError::Db(_)));

        let row = select_one("SELECT 1 AS id, 'Either/Or' AS title, NULL AS published, NULL AS authors")
            .await
            .unwrap();
        let decoded = decode_row(&row, &BOOK, &[&AUTHOR, &BOOK]).unwrap();
        assert_eq!(decoded.get("authors"), Some(&json!([])));
    }
}
