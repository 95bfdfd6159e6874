//! The catalog: authors and books held in memory, with the business rules that
//! keep them consistent.
//!
//! Both stores sit behind one lock and every operation takes it exactly once,
//! so a check and the write it guards are never interleaved with another
//! request. No lock is held across an `.await`.

mod error;

pub use error::CatalogError;

use std::sync::Arc;

use libris_db::Store;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::modules::authors::models::{Author, AuthorPayload};
use crate::modules::books::models::{Book, BookPayload, BookStoreExt};
use crate::modules::books::query::{BookQuery, BookQueryParams, Paged};
use crate::modules::books::validation::{validate_book_patch, validate_new_book};
use crate::utils;

struct Collections {
    authors: Store<Author>,
    books: Store<Book>,
}

/// Shared handle to one independent catalog. Clones share state.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<RwLock<Collections>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::with_stores(Store::new(), Store::new())
    }

    /// Build a catalog over pre-configured stores (e.g. custom id generators)
    pub fn with_stores(authors: Store<Author>, books: Store<Book>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collections { authors, books })),
        }
    }

    /// `(authors, books)` currently held
    pub fn counts(&self) -> (usize, usize) {
        let data = self.inner.read();
        (data.authors.len(), data.books.len())
    }

    pub fn list_authors(&self) -> Vec<Author> {
        self.inner.read().authors.find_all().to_vec()
    }

    pub fn get_author(&self, id: &str) -> Result<Author, CatalogError> {
        self.inner
            .read()
            .authors
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| CatalogError::AuthorNotFound { id: id.to_string() })
    }

    pub fn create_author(&self, payload: AuthorPayload) -> Result<Author, CatalogError> {
        let draft = payload.validate().map_err(CatalogError::Validation)?;

        let mut data = self.inner.write();
        ensure_author_name_free(&data.authors, &draft.name, None)?;

        let author = data.authors.insert(draft);
        info!(author_id = %author.id, "author created");
        Ok(author)
    }

    /// Replace an author's name (required) and, when given, bio.
    pub fn update_author(&self, id: &str, payload: AuthorPayload) -> Result<Author, CatalogError> {
        let patch = payload.into_patch().map_err(CatalogError::Validation)?;

        let mut data = self.inner.write();
        if data.authors.find_by_id(id).is_none() {
            return Err(CatalogError::AuthorNotFound { id: id.to_string() });
        }
        if let Some(name) = &patch.name {
            ensure_author_name_free(&data.authors, name, Some(id))?;
        }

        let author = data
            .authors
            .update(id, patch)
            .ok_or_else(|| CatalogError::AuthorNotFound { id: id.to_string() })?;
        info!(author_id = %author.id, "author updated");
        Ok(author)
    }

    /// Authors that still own books cannot be deleted.
    pub fn delete_author(&self, id: &str) -> Result<(), CatalogError> {
        let mut data = self.inner.write();
        if data.authors.find_by_id(id).is_none() {
            return Err(CatalogError::AuthorNotFound { id: id.to_string() });
        }

        let books = data.books.find_by_author_id(id).len();
        if books > 0 {
            return Err(CatalogError::AuthorHasBooks {
                id: id.to_string(),
                books,
            });
        }

        data.authors.delete(id);
        info!(author_id = id, "author deleted");
        Ok(())
    }

    /// Search, filter, sort and paginate the books of one author.
    pub fn author_books(
        &self,
        author_id: &str,
        params: &BookQueryParams,
    ) -> Result<Paged<Book>, CatalogError> {
        let books = {
            let data = self.inner.read();
            if data.authors.find_by_id(author_id).is_none() {
                return Err(CatalogError::AuthorNotFound {
                    id: author_id.to_string(),
                });
            }
            data.books.find_by_author_id(author_id)
        };

        let query = BookQuery::parse(params)?;
        let page = query.apply(books);
        debug!(
            author_id,
            total = page.meta.total,
            page = page.meta.page,
            "author books listed"
        );
        Ok(page)
    }

    pub fn list_books(&self) -> Vec<Book> {
        self.inner.read().books.find_all().to_vec()
    }

    pub fn get_book(&self, id: &str) -> Result<Book, CatalogError> {
        self.inner
            .read()
            .books
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| CatalogError::BookNotFound { id: id.to_string() })
    }

    pub fn create_book(&self, payload: BookPayload) -> Result<Book, CatalogError> {
        let draft =
            validate_new_book(payload, utils::current_year()).map_err(CatalogError::Validation)?;

        let mut data = self.inner.write();
        ensure_isbn_free(&data.books, &draft.isbn, None)?;
        if data.authors.find_by_id(&draft.author_id).is_none() {
            return Err(CatalogError::UnknownAuthor {
                author_id: draft.author_id,
            });
        }

        let book = data.books.insert(draft);
        info!(book_id = %book.id, author_id = %book.author_id, "book created");
        Ok(book)
    }

    /// Merge the fields present in `payload` into an existing book.
    pub fn update_book(&self, id: &str, payload: BookPayload) -> Result<Book, CatalogError> {
        let patch =
            validate_book_patch(payload, utils::current_year()).map_err(CatalogError::Validation)?;

        let mut data = self.inner.write();
        if data.books.find_by_id(id).is_none() {
            return Err(CatalogError::BookNotFound { id: id.to_string() });
        }
        if let Some(author_id) = &patch.author_id {
            if data.authors.find_by_id(author_id).is_none() {
                return Err(CatalogError::UnknownAuthor {
                    author_id: author_id.clone(),
                });
            }
        }
        if let Some(isbn) = &patch.isbn {
            ensure_isbn_free(&data.books, isbn, Some(id))?;
        }

        let book = data
            .books
            .update(id, patch)
            .ok_or_else(|| CatalogError::BookNotFound { id: id.to_string() })?;
        info!(book_id = %book.id, "book updated");
        Ok(book)
    }

    pub fn delete_book(&self, id: &str) -> Result<(), CatalogError> {
        if !self.inner.write().books.delete(id) {
            return Err(CatalogError::BookNotFound { id: id.to_string() });
        }
        info!(book_id = id, "book deleted");
        Ok(())
    }
}

fn ensure_author_name_free(
    authors: &Store<Author>,
    name: &str,
    except_id: Option<&str>,
) -> Result<(), CatalogError> {
    let key = utils::normalize_key(name);
    let taken = authors
        .find(|author| Some(author.id.as_str()) != except_id && utils::normalize_key(&author.name) == key)
        .is_some();
    if taken {
        return Err(CatalogError::DuplicateAuthorName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn ensure_isbn_free(
    books: &Store<Book>,
    isbn: &str,
    except_id: Option<&str>,
) -> Result<(), CatalogError> {
    let key = utils::normalize_key(isbn);
    let owner = books.find(|book| {
        Some(book.id.as_str()) != except_id && utils::normalize_key(&book.isbn) == key
    });
    match (owner, except_id) {
        (None, _) => Ok(()),
        (Some(_), None) => Err(CatalogError::DuplicateIsbn {
            isbn: isbn.to_string(),
        }),
        (Some(_), Some(_)) => Err(CatalogError::IsbnTaken {
            isbn: isbn.to_string(),
        }),
    }
}
