//! Schemas derived from record descriptors.
//!
//! A [`Schema`] is built once per record type. Scalar columns are copied with
//! per-kind coercion, relationships are reduced to reference views of the
//! related record, and multi-record input is wrapped in the collection
//! envelope. Dump errors are collected per field rather than raised, so a
//! single malformed field never costs the rest of the representation.

use crate::error::ModelError;
use crate::handlers::resource::ResourceDef;
use crate::model::{RecordType, Row};
use crate::response::{unwrap_items, CollectionContext, Envelope, ENVELOPE_KEY};
use crate::schema::errors::{FieldErrors, SCHEMA_KEY};
use crate::schema::fields::{
    dump_scalar, has_value, load_scalar, FieldSpec, NestedField, ReferenceView, HREF,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const MISSING: &str = "Missing data for required field.";

/// Input to [`Schema::dump`]: one record, or a record set to be enveloped.
#[derive(Clone, Copy, Debug)]
pub enum Records<'a> {
    One(&'a Row),
    Many(&'a [Row]),
}

impl<'a> From<&'a Row> for Records<'a> {
    fn from(row: &'a Row) -> Self {
        Records::One(row)
    }
}

impl<'a> From<&'a [Row]> for Records<'a> {
    fn from(rows: &'a [Row]) -> Self {
        Records::Many(rows)
    }
}

impl<'a> From<&'a Vec<Row>> for Records<'a> {
    fn from(rows: &'a Vec<Row>) -> Self {
        Records::Many(rows.as_slice())
    }
}

/// A dumped representation together with the field errors met on the way.
#[derive(Clone, Debug, PartialEq)]
pub struct Dumped<T> {
    pub data: T,
    pub errors: FieldErrors,
}

/// Column values and related keys read from an incoming body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedRecord {
    pub primary_key: Option<i64>,
    /// Validated non-key column values.
    pub values: Row,
    /// Related primary keys per relationship present in the body.
    pub related: BTreeMap<&'static str, Vec<i64>>,
}

#[derive(Debug)]
pub struct Schema {
    record: &'static RecordType,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Resolves every field of `record` against the registered record types.
    pub fn build(
        record: &'static RecordType,
        all: &[&'static RecordType],
    ) -> Result<Schema, ModelError> {
        let mut fields: Vec<FieldSpec> = record.columns.iter().map(FieldSpec::Scalar).collect();
        for rel in record.relationships {
            let target = all
                .iter()
                .copied()
                .find(|rt| rt.name == rel.target)
                .ok_or_else(|| ModelError::MissingReference {
                    kind: "record type",
                    id: rel.target.to_string(),
                })?;
            fields.push(FieldSpec::Related {
                name: rel.name,
                view: reference_view(target),
            });
        }
        Ok(Schema { record, fields })
    }

    pub fn record(&self) -> &'static RecordType {
        self.record
    }

    pub fn resource(&self) -> Option<&'static ResourceDef> {
        self.record.resource
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(FieldSpec::name)
    }

    /// Flat representation for one record, enveloped collection for many.
    pub fn dump<'a>(&self, input: impl Into<Records<'a>>, ctx: &CollectionContext) -> Dumped<Value> {
        match input.into() {
            Records::One(row) => {
                let (data, errors) = self.dump_row(row);
                Dumped { data, errors }
            }
            Records::Many(rows) => {
                let mut errors = FieldErrors::new();
                let mut items = Vec::with_capacity(rows.len());
                for (i, row) in rows.iter().enumerate() {
                    let (item, item_errors) = self.dump_row(row);
                    errors.extend_prefixed(&format!("{}.{}", ENVELOPE_KEY, i), item_errors);
                    items.push(item);
                }
                let data = Envelope::wrap(items, ctx).into_value().unwrap_or_else(|e| {
                    errors.add(SCHEMA_KEY, e.to_string());
                    Value::Null
                });
                Dumped { data, errors }
            }
        }
    }

    pub fn dumps<'a>(
        &self,
        input: impl Into<Records<'a>>,
        ctx: &CollectionContext,
    ) -> Result<Dumped<String>, serde_json::Error> {
        let Dumped { data, errors } = self.dump(input, ctx);
        Ok(Dumped {
            data: serde_json::to_string(&data)?,
            errors,
        })
    }

    fn dump_row(&self, row: &Row) -> (Value, FieldErrors) {
        let mut out = Map::new();
        let mut errors = FieldErrors::new();

        for field in &self.fields {
            match field {
                FieldSpec::Scalar(col) => {
                    let Some(value) = row.get(col.name) else {
                        continue;
                    };
                    match dump_scalar(col.kind, value) {
                        Ok(v) => {
                            out.insert(col.name.to_string(), v);
                        }
                        Err(msg) => errors.add(col.name, msg),
                    }
                }
                FieldSpec::Related { name, view } => match row.get(*name) {
                    Some(Value::Array(related)) => {
                        let mut refs = Vec::with_capacity(related.len());
                        for (i, item) in related.iter().enumerate() {
                            match view.dump(item) {
                                Ok(r) => refs.push(r),
                                Err(msg) => errors.add(format!("{}.{}", name, i), msg),
                            }
                        }
                        out.insert(name.to_string(), Value::Array(refs));
                    }
                    _ => errors.add(*name, "Relationship was not loaded."),
                },
            }
        }

        if let Some(resource) = self.record.resource {
            match self.href(resource, row) {
                Ok(href) => {
                    out.insert(HREF.to_string(), Value::String(href));
                }
                Err(msg) => errors.add(HREF, msg),
            }
        }

        (Value::Object(out), errors)
    }

    fn href(&self, resource: &ResourceDef, row: &Row) -> Result<String, String> {
        let pk = row.get(self.record.primary_key).unwrap_or(&Value::Null);
        resource
            .url_for(&[(self.record.primary_key, pk)])
            .map_err(|e| e.to_string())
    }

    /// Validates one body. Unknown fields and `href` are ignored.
    pub fn load(&self, data: &Value) -> Result<LoadedRecord, FieldErrors> {
        let obj = data
            .as_object()
            .ok_or_else(|| FieldErrors::single(SCHEMA_KEY, "Invalid input type."))?;
        let mut loaded = LoadedRecord::default();
        let mut errors = FieldErrors::new();

        for field in &self.fields {
            match field {
                FieldSpec::Scalar(col) if col.primary_key => {
                    if has_value(obj, col.name) {
                        match load_scalar(col, &obj[col.name]) {
                            Ok(v) => loaded.primary_key = v.as_i64(),
                            Err(msg) => errors.add(col.name, msg),
                        }
                    }
                }
                FieldSpec::Scalar(col) => match obj.get(col.name) {
                    Some(value) => match load_scalar(col, value) {
                        Ok(v) => {
                            loaded.values.insert(col.name.to_string(), v);
                        }
                        Err(msg) => errors.add(col.name, msg),
                    },
                    None if !col.nullable => errors.add(col.name, MISSING),
                    None => {}
                },
                FieldSpec::Related { name, view } => match obj.get(*name) {
                    Some(Value::Array(items)) => {
                        let mut keys = Vec::with_capacity(items.len());
                        for (i, item) in items.iter().enumerate() {
                            match view.load_key(item) {
                                Ok(pk) => keys.push(pk),
                                Err(msg) => errors.add(format!("{}.{}", name, i), msg),
                            }
                        }
                        loaded.related.insert(*name, keys);
                    }
                    Some(Value::Null) | None => {}
                    Some(_) => errors.add(*name, "Not a valid list."),
                },
            }
        }

        errors.into_result(loaded)
    }

    /// Unwraps the collection envelope, then loads each item.
    pub fn load_many(&self, data: &Value) -> Result<Vec<LoadedRecord>, FieldErrors> {
        let items = unwrap_items(data)?;
        let mut errors = FieldErrors::new();
        let mut loaded = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match self.load(item) {
                Ok(record) => loaded.push(record),
                Err(item_errors) => {
                    errors.extend_prefixed(&format!("{}.{}", ENVELOPE_KEY, i), item_errors)
                }
            }
        }
        errors.into_result(loaded)
    }

    pub fn loads(&self, text: &str) -> Result<LoadedRecord, FieldErrors> {
        self.load(&parse(text)?)
    }

    pub fn loads_many(&self, text: &str) -> Result<Vec<LoadedRecord>, FieldErrors> {
        self.load_many(&parse(text)?)
    }
}

fn parse(text: &str) -> Result<Value, FieldErrors> {
    serde_json::from_str(text)
        .map_err(|e| FieldErrors::single(SCHEMA_KEY, format!("Invalid JSON: {}", e)))
}

fn reference_view(target: &'static RecordType) -> ReferenceView {
    let nested = target
        .nested
        .iter()
        .map(|&name| {
            if let Some(col) = target.column(name) {
                NestedField::Column(col)
            } else if let Some(computed) = target.computed(name) {
                NestedField::Computed(computed)
            } else {
                NestedField::Attribute(name)
            }
        })
        .collect();
    ReferenceView {
        record: target.name,
        primary_key: target.primary_key,
        resource: target.resource,
        nested,
    }
}
