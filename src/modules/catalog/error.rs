use libris_http::error::AppError;
use serde_json::json;
use thiserror::Error;

/// Failures raised by catalog operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Author not found")]
    AuthorNotFound { id: String },

    #[error("Book not found")]
    BookNotFound { id: String },

    /// A book refers to an author that does not exist.
    #[error("Author not found")]
    UnknownAuthor { author_id: String },

    #[error("Author already exists")]
    DuplicateAuthorName { name: String },

    #[error("Book with this ISBN already exists")]
    DuplicateIsbn { isbn: String },

    /// Raised on update when another record already owns the ISBN.
    #[error("Another book with this ISBN already exists")]
    IsbnTaken { isbn: String },

    #[error("Invalid sort field: {field}")]
    InvalidSortField { field: String },

    #[error("Author still has {books} book(s); delete or reassign them first")]
    AuthorHasBooks { id: String, books: usize },
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            CatalogError::Validation(errors) => AppError::validation(errors),
            CatalogError::AuthorNotFound { .. } | CatalogError::BookNotFound { .. } => {
                AppError::not_found(message)
            }
            CatalogError::UnknownAuthor { author_id } => AppError::bad_request(message)
                .with_code("unknown_author")
                .with_details(json!({ "field": "authorId", "value": author_id })),
            CatalogError::DuplicateAuthorName { .. } => {
                AppError::conflict(json!({ "field": "name" }), message)
            }
            CatalogError::DuplicateIsbn { .. } | CatalogError::IsbnTaken { .. } => {
                AppError::conflict(json!({ "field": "isbn" }), message)
            }
            CatalogError::InvalidSortField { field } => AppError::bad_request(message)
                .with_code("invalid_sort_field")
                .with_details(json!({ "field": "sort", "value": field })),
            CatalogError::AuthorHasBooks { books, .. } => {
                AppError::conflict(json!({ "field": "id", "books": books }), message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn report(err: CatalogError) -> libris_http::error::ErrorReport {
        AppError::from(err).into_report()
    }

    #[test]
    fn validation_joins_messages() {
        let report = report(CatalogError::Validation(vec![
            "Title is required".into(),
            "ISBN is required".into(),
        ]));
        assert_eq!(report.status, StatusCode::BAD_REQUEST);
        assert_eq!(report.message, "Title is required, ISBN is required");
        assert_eq!(
            report.details,
            Some(json!(["Title is required", "ISBN is required"]))
        );
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (CatalogError::AuthorNotFound { id: "x".into() }, StatusCode::NOT_FOUND, "not_found"),
            (CatalogError::BookNotFound { id: "x".into() }, StatusCode::NOT_FOUND, "not_found"),
            (
                CatalogError::UnknownAuthor { author_id: "x".into() },
                StatusCode::BAD_REQUEST,
                "unknown_author",
            ),
            (
                CatalogError::DuplicateAuthorName { name: "x".into() },
                StatusCode::CONFLICT,
                "conflict",
            ),
            (CatalogError::IsbnTaken { isbn: "x".into() }, StatusCode::CONFLICT, "conflict"),
            (
                CatalogError::InvalidSortField { field: "x".into() },
                StatusCode::BAD_REQUEST,
                "invalid_sort_field",
            ),
            (
                CatalogError::AuthorHasBooks { id: "x".into(), books: 2 },
                StatusCode::CONFLICT,
                "conflict",
            ),
        ];

        for (err, status, code) in cases {
            let report = report(err);
            assert_eq!(report.status, status);
            assert_eq!(report.code.as_deref(), Some(code));
        }
    }

    #[test]
    fn conflicts_identify_the_field() {
        let report = report(CatalogError::DuplicateIsbn { isbn: "123".into() });
        assert_eq!(report.message, "Book with this ISBN already exists");
        assert_eq!(report.details, Some(json!({ "field": "isbn" })));
    }
}
