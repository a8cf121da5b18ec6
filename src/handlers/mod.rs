//! HTTP handlers for the library resources.

pub mod authors;
pub mod books;
pub mod resource;

pub use resource::ResourceDef;

/// Every registered resource, item and collection.
pub static RESOURCES: &[&ResourceDef] = &[
    &books::BOOKS_RESOURCE,
    &books::BOOK_RESOURCE,
    &authors::AUTHORS_RESOURCE,
    &authors::AUTHOR_RESOURCE,
];
