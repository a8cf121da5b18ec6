//! Record types and their derived schemas, built and validated once at startup.

use crate::error::{AppError, ModelError};
use crate::model::types::RecordType;
use crate::model::validator::validate;
use crate::schema::Schema;

#[derive(Debug)]
pub struct Models {
    record_types: Vec<&'static RecordType>,
    schemas: Vec<Schema>,
}

impl Models {
    pub fn build(record_types: &[&'static RecordType]) -> Result<Models, ModelError> {
        validate(record_types)?;
        let schemas = record_types
            .iter()
            .map(|&rt| Schema::build(rt, record_types))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = schemas.len(), "schemas built");
        Ok(Models {
            record_types: record_types.to_vec(),
            schemas,
        })
    }

    pub fn record_types(&self) -> &[&'static RecordType] {
        &self.record_types
    }

    pub fn record_type(&self, name: &str) -> Result<&'static RecordType, AppError> {
        self.record_types
            .iter()
            .copied()
            .find(|rt| rt.name == name)
            .ok_or_else(|| missing(name))
    }

    pub fn schema(&self, name: &str) -> Result<&Schema, AppError> {
        self.schemas
            .iter()
            .find(|s| s.record().name == name)
            .ok_or_else(|| missing(name))
    }
}

fn missing(name: &str) -> AppError {
    ModelError::MissingReference {
        kind: "record type",
        id: name.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::library::RECORD_TYPES;

    #[test]
    fn every_record_type_gets_a_schema() {
        let models = Models::build(RECORD_TYPES).unwrap();
        assert_eq!(models.record_type("Book").unwrap().table, "books");
        assert_eq!(models.schema("Author").unwrap().record().table, "authors");
        assert!(matches!(models.schema("Shelf"), Err(AppError::Model(_))));
    }
}
