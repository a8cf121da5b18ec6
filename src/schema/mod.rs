//! Serialization schemas derived from record descriptors.

pub mod derive;
pub mod errors;
pub mod fields;

pub use derive::{Dumped, LoadedRecord, Records, Schema};
pub use errors::{FieldErrors, SCHEMA_KEY};
