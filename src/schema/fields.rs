//! Field specifications resolved at schema-build time, and per-kind value coercion.

use crate::handlers::resource::ResourceDef;
use crate::model::{ColumnDef, ColumnKind, Computed, Row};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

pub(crate) const HREF: &str = "href";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// How one nested name of a related record is read.
#[derive(Debug)]
pub enum NestedField {
    /// A real column, coerced like any scalar field.
    Column(&'static ColumnDef),
    /// A computed attribute declared on the related record type.
    Computed(&'static Computed),
    /// Any other name, read off the related row as-is.
    Attribute(&'static str),
}

impl NestedField {
    pub fn name(&self) -> &'static str {
        match self {
            NestedField::Column(c) => c.name,
            NestedField::Computed(c) => c.name,
            NestedField::Attribute(name) => *name,
        }
    }
}

/// The reduced representation used for a related record: primary key, `href`
/// when the related type has a resource, and its nested fields.
#[derive(Debug)]
pub struct ReferenceView {
    pub record: &'static str,
    pub primary_key: &'static str,
    pub resource: Option<&'static ResourceDef>,
    pub nested: Vec<NestedField>,
}

impl ReferenceView {
    pub fn dump(&self, related: &Value) -> Result<Value, String> {
        let row = related
            .as_object()
            .ok_or_else(|| format!("Related {} is not a record.", self.record))?;
        let pk = row
            .get(self.primary_key)
            .and_then(Value::as_i64)
            .ok_or_else(|| format!("Related {} has no primary key.", self.record))?;

        let mut out = Map::new();
        out.insert(self.primary_key.to_string(), Value::from(pk));
        if let Some(resource) = self.resource {
            let href = resource
                .url_for(&[(self.primary_key, &Value::from(pk))])
                .map_err(|e| e.to_string())?;
            out.insert(HREF.to_string(), Value::String(href));
        }
        for field in &self.nested {
            let value = match field {
                NestedField::Column(col) => {
                    dump_scalar(col.kind, row.get(col.name).unwrap_or(&Value::Null))?
                }
                NestedField::Computed(computed) => (computed.compute)(row)
                    .ok_or_else(|| format!("Could not compute '{}' for {}.", computed.name, self.record))?,
                NestedField::Attribute(name) => row
                    .get(*name)
                    .cloned()
                    .ok_or_else(|| format!("{} has no attribute '{}'.", self.record, name))?,
            };
            out.insert(field.name().to_string(), value);
        }
        Ok(Value::Object(out))
    }

    /// Primary key from a load-side reference: a bare key or an object carrying one.
    pub fn load_key(&self, value: &Value) -> Result<i64, String> {
        let key = match value {
            Value::Object(obj) => obj.get(self.primary_key).unwrap_or(&Value::Null),
            other => other,
        };
        match coerce_integer(key) {
            Some(pk) => Ok(pk),
            None => Err(format!("Could not deserialize related value {}.", value)),
        }
    }
}

/// One field of a derived schema.
#[derive(Debug)]
pub enum FieldSpec {
    Scalar(&'static ColumnDef),
    Related { name: &'static str, view: ReferenceView },
}

impl FieldSpec {
    pub fn name(&self) -> &'static str {
        match self {
            FieldSpec::Scalar(c) => c.name,
            FieldSpec::Related { name, .. } => *name,
        }
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok()
                .map(|dt| dt.date())
        })
}

/// Wire value for a stored column value.
pub fn dump_scalar(kind: ColumnKind, value: &Value) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match kind {
        ColumnKind::Integer => coerce_integer(value)
            .map(Value::from)
            .ok_or_else(|| "Not a valid integer.".to_string()),
        ColumnKind::Text { .. } => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err("Not a valid string.".to_string()),
        },
        ColumnKind::Date => value
            .as_str()
            .and_then(coerce_date)
            .map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
            .ok_or_else(|| "Not a valid date.".to_string()),
    }
}

/// Validated column value from an incoming body.
pub fn load_scalar(column: &ColumnDef, value: &Value) -> Result<Value, String> {
    if value.is_null() {
        return if column.nullable {
            Ok(Value::Null)
        } else {
            Err("Field may not be null.".to_string())
        };
    }
    match column.kind {
        ColumnKind::Integer => coerce_integer(value)
            .map(Value::from)
            .ok_or_else(|| "Not a valid integer.".to_string()),
        ColumnKind::Text { max_len } => {
            let s = value.as_str().ok_or_else(|| "Not a valid string.".to_string())?;
            match max_len {
                Some(max) if s.chars().count() > max as usize => {
                    Err(format!("Longer than maximum length {}.", max))
                }
                _ => Ok(value.clone()),
            }
        }
        ColumnKind::Date => value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
            .map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
            .ok_or_else(|| "Not a valid date.".to_string()),
    }
}

/// Whether a row carries a value for a column (used for required checks).
pub(crate) fn has_value(row: &Row, name: &str) -> bool {
    row.get(name).is_some_and(|v| !v.is_null())
}
