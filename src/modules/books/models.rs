use libris_db::{Record, Store};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::utils;

/// A stored book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Opaque identifier, assigned on creation
    pub id: String,
    pub title: String,
    /// Identifier of an existing author
    pub author_id: String,
    pub isbn: String,
    pub published_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated data for a new book.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author_id: String,
    pub isbn: String,
    pub published_year: i32,
    pub genre: Option<String>,
}

/// Validated partial update. `genre: Some("")` clears the genre.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author_id: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub genre: Option<String>,
}

/// Request body of `POST /books` and `PUT /books/{id}`.
///
/// `publishedYear` stays untyped so a wrong type is reported as a validation
/// failure alongside the other fields instead of a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[serde(default, deserialize_with = "utils::lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "utils::lenient_text")]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "utils::lenient_text")]
    pub isbn: Option<String>,
    #[serde(default)]
    pub published_year: Option<Value>,
    #[serde(default, deserialize_with = "utils::lenient_text")]
    pub genre: Option<String>,
}

impl Record for Book {
    type Draft = NewBook;
    type Patch = BookPatch;

    fn create(id: String, at: OffsetDateTime, draft: NewBook) -> Self {
        Self {
            id,
            title: draft.title,
            author_id: draft.author_id,
            isbn: draft.isbn,
            published_year: draft.published_year,
            genre: draft.genre,
            created_at: at,
            updated_at: at,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, patch: BookPatch, at: OffsetDateTime) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(author_id) = patch.author_id {
            self.author_id = author_id;
        }
        if let Some(isbn) = patch.isbn {
            self.isbn = isbn;
        }
        if let Some(year) = patch.published_year {
            self.published_year = year;
        }
        if let Some(genre) = patch.genre {
            self.genre = utils::non_blank(Some(genre));
        }
        self.updated_at = at;
    }
}

/// Book-specific lookups on the generic store.
pub trait BookStoreExt {
    fn find_by_author_id(&self, author_id: &str) -> Vec<Book>;
}

impl BookStoreExt for Store<Book> {
    fn find_by_author_id(&self, author_id: &str) -> Vec<Book> {
        self.filter(|book| book.author_id == author_id)
    }
}
