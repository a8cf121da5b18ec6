//! Apply the record descriptors to the database: record tables first, then the
//! association tables that reference them. Idempotent (`IF NOT EXISTS`).

use crate::error::{AppError, ModelError};
use crate::model::{validate, RecordType};
use crate::sql::{create_association_table, create_table};
use sqlx::SqlitePool;
use std::collections::HashSet;

/// DDL statements in dependency order.
pub fn migration_statements(record_types: &[&RecordType]) -> Result<Vec<String>, ModelError> {
    validate(record_types)?;

    let mut statements: Vec<String> = record_types.iter().map(|rt| create_table(rt)).collect();
    let mut seen = HashSet::new();
    for rt in record_types {
        for rel in rt.relationships {
            if !seen.insert(rel.secondary.table) {
                continue;
            }
            let target = record_types
                .iter()
                .find(|t| t.name == rel.target)
                .ok_or_else(|| ModelError::MissingReference {
                    kind: "record type",
                    id: rel.target.to_string(),
                })?;
            let refs = [(rel.local_key, *rt), (rel.remote_key, *target)];
            statements.push(create_association_table(rel.secondary, &refs));
        }
    }
    Ok(statements)
}

pub async fn apply_migrations(pool: &SqlitePool, record_types: &[&RecordType]) -> Result<(), AppError> {
    let statements = migration_statements(record_types)?;
    for sql in &statements {
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(sql).execute(pool).await?;
    }
    tracing::info!(statements = statements.len(), "migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RECORD_TYPES;

    #[test]
    fn association_table_is_created_once_after_record_tables() {
        let statements = migration_statements(RECORD_TYPES).unwrap();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].contains("\"authors\""));
        assert!(statements[1].contains("\"books\""));
        assert!(statements[2].starts_with("CREATE TABLE IF NOT EXISTS \"books_authors\""));
        assert!(statements[2].contains("REFERENCES \"authors\""));
    }
}
