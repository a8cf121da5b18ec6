//! Builds parameterized SELECT, COUNT and INSERT statements from record descriptors.

use crate::model::{Association, ColumnKind, RecordType, Relationship, Row};
use serde_json::Value;

const MAIN_ALIAS: &str = "main";
const REL_ALIAS: &str = "rel";
const LINK_ALIAS: &str = "link";

/// Quote identifier (safe: identifiers only come from descriptors).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn string_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: Value) {
        self.params.push(v);
    }
}

/// Column expression as selected: dates are read back as text.
fn column_expr(alias: &str, name: &str, kind: ColumnKind) -> String {
    let col = format!("{}.{}", alias, quoted(name));
    match kind {
        ColumnKind::Date => format!("CAST({} AS TEXT)", col),
        _ => col,
    }
}

fn select_column_list(record_type: &RecordType) -> Vec<String> {
    record_type
        .columns
        .iter()
        .map(|c| format!("{} AS {}", column_expr(MAIN_ALIAS, c.name, c.kind), quoted(c.name)))
        .collect()
}

/// Scalar subquery embedding every related row as a JSON array, ordered by the
/// related primary key.
fn relation_subquery(owner_pk: &str, rel: &Relationship, target: &RecordType) -> String {
    let fields = target
        .columns
        .iter()
        .map(|c| format!("{}, {}", string_literal(c.name), column_expr(REL_ALIAS, c.name, c.kind)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "(SELECT json_group_array(json(sub.obj)) FROM (SELECT json_object({fields}) AS obj \
         FROM {target} {rel} JOIN {link_table} {link} ON {link}.{remote} = {rel}.{target_pk} \
         WHERE {link}.{local} = {main}.{pk} ORDER BY {rel}.{target_pk}) sub)",
        fields = fields,
        target = quoted(target.table),
        rel = REL_ALIAS,
        link_table = quoted(rel.secondary.table),
        link = LINK_ALIAS,
        remote = quoted(rel.remote_key),
        target_pk = quoted(target.primary_key),
        local = quoted(rel.local_key),
        main = MAIN_ALIAS,
        pk = quoted(owner_pk),
    )
}

/// SELECT list with every relationship whose target is in `targets` embedded.
fn select_parts(record_type: &RecordType, targets: &[&RecordType]) -> String {
    let mut parts = select_column_list(record_type);
    for rel in record_type.relationships {
        if let Some(target) = targets.iter().find(|t| t.name == rel.target) {
            let sub = relation_subquery(record_type.primary_key, rel, target);
            parts.push(format!("{} AS {}", sub, quoted(rel.name)));
        }
    }
    parts.join(", ")
}

/// SELECT by primary key. Caller binds the id as the sole param.
pub fn select_by_id(record_type: &RecordType, targets: &[&RecordType], id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {}.{} = ?",
        select_parts(record_type, targets),
        quoted(record_type.table),
        MAIN_ALIAS,
        MAIN_ALIAS,
        quoted(record_type.primary_key)
    );
    q.push_param(Value::from(id));
    q
}

/// SELECT ordered by primary key with optional LIMIT/OFFSET.
pub fn select_list(
    record_type: &RecordType,
    targets: &[&RecordType],
    limit: Option<u32>,
    offset: Option<u32>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let order_clause = format!(" ORDER BY {}.{}", MAIN_ALIAS, quoted(record_type.primary_key));
    // SQLite only accepts OFFSET after a LIMIT; -1 means no limit.
    let limit_clause = match (limit, offset) {
        (Some(n), _) => format!(" LIMIT {}", n),
        (None, Some(_)) => " LIMIT -1".to_string(),
        (None, None) => String::new(),
    };
    let offset_clause = offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {} {}{}{}{}",
        select_parts(record_type, targets),
        quoted(record_type.table),
        MAIN_ALIAS,
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

/// COUNT of every row of the record table.
pub fn count(record_type: &RecordType) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", quoted(record_type.table));
    q
}

/// INSERT of the given column values, returning the assigned primary key.
/// Primary key columns and unknown names are skipped.
pub fn insert(record_type: &RecordType, values: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    for c in record_type.columns.iter().filter(|c| !c.primary_key) {
        if let Some(v) = values.get(c.name) {
            cols.push(quoted(c.name));
            q.push_param(v.clone());
        }
    }
    let table = quoted(record_type.table);
    let pk = quoted(record_type.primary_key);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, pk)
    } else {
        let placeholders = vec!["?"; cols.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders,
            pk
        )
    };
    q
}

/// Association row linking `local` (our key) to `remote` (the related key).
pub fn insert_link(rel: &Relationship, local: i64, remote: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?, ?)",
        quoted(rel.secondary.table),
        quoted(rel.local_key),
        quoted(rel.remote_key)
    );
    q.push_param(Value::from(local));
    q.push_param(Value::from(remote));
    q
}

/// Primary keys among `keys` that exist in the record table.
pub fn select_existing_keys(record_type: &RecordType, keys: &[i64]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = quoted(record_type.primary_key);
    if keys.is_empty() {
        q.sql = format!("SELECT {} FROM {} WHERE 1 = 0", pk, quoted(record_type.table));
        return q;
    }
    for k in keys {
        q.push_param(Value::from(*k));
    }
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} IN ({})",
        pk,
        quoted(record_type.table),
        pk,
        vec!["?"; keys.len()].join(", ")
    );
    q
}

/// Association table DDL: both key columns, composite primary key.
pub fn create_association_table(assoc: &Association, refs: &[(&str, &RecordType)]) -> String {
    let mut defs: Vec<String> = assoc
        .columns
        .iter()
        .map(|c| format!("{} INTEGER NOT NULL", quoted(c)))
        .collect();
    defs.push(format!(
        "PRIMARY KEY ({})",
        assoc.columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ")
    ));
    for (col, target) in refs {
        defs.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            quoted(col),
            quoted(target.table),
            quoted(target.primary_key)
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quoted(assoc.table),
        defs.join(", ")
    )
}

/// Record table DDL from the column descriptors.
pub fn create_table(record_type: &RecordType) -> String {
    let defs: Vec<String> = record_type
        .columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", quoted(c.name), c.kind.sql_type());
            if c.primary_key {
                def.push_str(" PRIMARY KEY");
            } else if !c.nullable {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quoted(record_type.table),
        defs.join(", ")
    )
}
