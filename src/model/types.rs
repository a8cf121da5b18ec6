//! Record descriptors: columns, relationships, and the representation hints
//! (`nested` fields and the owning `resource`) declared per record type.

use crate::handlers::resource::ResourceDef;
use serde_json::{Map, Value};

/// A persisted record as fetched from the store: column values keyed by name,
/// with each loaded relationship holding an array of related rows.
pub type Row = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    /// Text with an optional maximum length in characters.
    Text { max_len: Option<u32> },
    /// Calendar date, `YYYY-MM-DD` on the wire.
    Date,
}

impl ColumnKind {
    pub fn sql_type(&self) -> String {
        match self {
            ColumnKind::Integer => "INTEGER".to_string(),
            ColumnKind::Text { max_len: Some(n) } => format!("VARCHAR({})", n),
            ColumnKind::Text { max_len: None } => "TEXT".to_string(),
            ColumnKind::Date => "DATE".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
    pub primary_key: bool,
}

impl ColumnDef {
    pub const fn integer(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Integer,
            nullable: true,
            primary_key: false,
        }
    }

    pub const fn text(name: &'static str, max_len: u32) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Text { max_len: Some(max_len) },
            nullable: true,
            primary_key: false,
        }
    }

    pub const fn date(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Date,
            nullable: true,
            primary_key: false,
        }
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Integer primary keys are assigned by the store.
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }
}

/// A many-to-many association table linking two record tables.
#[derive(Debug, PartialEq, Eq)]
pub struct Association {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// A relationship from one record type to many records of `target`, through
/// an association table. `local_key` references our primary key,
/// `remote_key` references the target's.
#[derive(Debug, PartialEq, Eq)]
pub struct Relationship {
    pub name: &'static str,
    pub target: &'static str,
    pub secondary: &'static Association,
    pub local_key: &'static str,
    pub remote_key: &'static str,
    pub back_populates: Option<&'static str>,
}

/// A derived attribute computed from a row rather than stored.
pub struct Computed {
    pub name: &'static str,
    pub compute: fn(&Row) -> Option<Value>,
}

impl std::fmt::Debug for Computed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed").field("name", &self.name).finish()
    }
}

#[derive(Debug)]
pub struct RecordType {
    pub name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [ColumnDef],
    pub relationships: &'static [Relationship],
    pub computed: &'static [Computed],
    /// Field names exposed when this record is referenced from another record.
    pub nested: &'static [&'static str],
    /// The resource that resolves this record's canonical location.
    pub resource: Option<&'static ResourceDef>,
}

impl RecordType {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn computed(&self, name: &str) -> Option<&Computed> {
        self.computed.iter().find(|c| c.name == name)
    }

    /// Primary key of a row, when present and integral.
    pub fn pk_of(&self, row: &Row) -> Option<i64> {
        row.get(self.primary_key).and_then(Value::as_i64)
    }
}
