//! The library's record types: authors and books, linked many-to-many.

use crate::handlers::authors::AUTHOR_RESOURCE;
use crate::handlers::books::BOOK_RESOURCE;
use crate::model::types::{Association, ColumnDef, RecordType, Relationship};

pub static BOOKS_AUTHORS: Association = Association {
    table: "books_authors",
    columns: &["author_id", "book_id"],
};

pub static AUTHOR: RecordType = RecordType {
    name: "Author",
    table: "authors",
    primary_key: "id",
    columns: &[
        ColumnDef::integer("id").primary_key(),
        ColumnDef::date("birth").not_null(),
        ColumnDef::date("death"),
        ColumnDef::text("name", 128).not_null(),
    ],
    relationships: &[Relationship {
        name: "books",
        target: "Book",
        secondary: &BOOKS_AUTHORS,
        local_key: "author_id",
        remote_key: "book_id",
        back_populates: Some("authors"),
    }],
    computed: &[],
    nested: &["name"],
    resource: Some(&AUTHOR_RESOURCE),
};

pub static BOOK: RecordType = RecordType {
    name: "Book",
    table: "books",
    primary_key: "id",
    columns: &[
        ColumnDef::integer("id").primary_key(),
        ColumnDef::text("title", 512).not_null(),
        ColumnDef::integer("published"),
    ],
    relationships: &[Relationship {
        name: "authors",
        target: "Author",
        secondary: &BOOKS_AUTHORS,
        local_key: "book_id",
        remote_key: "author_id",
        back_populates: Some("books"),
    }],
    computed: &[],
    nested: &["title"],
    resource: Some(&BOOK_RESOURCE),
};

/// Every record type served by the application.
pub static RECORD_TYPES: &[&RecordType] = &[&AUTHOR, &BOOK];
