//! Descriptor validation: referential integrity and relationship symmetry.

use crate::error::ModelError;
use crate::model::types::{ColumnKind, RecordType};
use std::collections::{HashMap, HashSet};

pub fn validate(record_types: &[&RecordType]) -> Result<(), ModelError> {
    let mut by_name: HashMap<&str, &RecordType> = HashMap::new();
    let mut tables = HashSet::new();
    for &rt in record_types {
        if by_name.insert(rt.name, rt).is_some() || !tables.insert(rt.table) {
            return Err(ModelError::DuplicateRecordType(rt.name.to_string()));
        }
    }

    for &rt in record_types {
        let pk = rt.column(rt.primary_key).ok_or_else(|| ModelError::InvalidPrimaryKey {
            record: rt.name.to_string(),
            column: rt.primary_key.to_string(),
        })?;
        if !pk.primary_key || pk.kind != ColumnKind::Integer {
            return Err(ModelError::InvalidPrimaryKey {
                record: rt.name.to_string(),
                column: rt.primary_key.to_string(),
            });
        }

        if let Some(resource) = rt.resource {
            if resource.model != rt.name {
                return Err(ModelError::ResourceMismatch {
                    endpoint: resource.endpoint.to_string(),
                    served: resource.model.to_string(),
                    record: rt.name.to_string(),
                });
            }
        }

        for rel in rt.relationships {
            let target = by_name.get(rel.target).ok_or_else(|| ModelError::MissingReference {
                kind: "record type",
                id: rel.target.to_string(),
            })?;
            for key in [rel.local_key, rel.remote_key] {
                if !rel.secondary.columns.contains(&key) {
                    return Err(ModelError::MissingReference {
                        kind: "association column",
                        id: format!("{}.{}", rel.secondary.table, key),
                    });
                }
            }
            if let Some(back) = rel.back_populates {
                let mirrors = target.relationship(back).is_some_and(|reverse| {
                    reverse.target == rt.name
                        && reverse.back_populates == Some(rel.name)
                        && std::ptr::eq(reverse.secondary, rel.secondary)
                        && reverse.local_key == rel.remote_key
                        && reverse.remote_key == rel.local_key
                });
                if !mirrors {
                    return Err(ModelError::AsymmetricRelationship {
                        record: rt.name.to_string(),
                        relationship: rel.name.to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}
