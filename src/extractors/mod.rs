//! Request extractors.

pub mod collection;
pub use collection::CollectionArgs;
