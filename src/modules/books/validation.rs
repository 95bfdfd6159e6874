//! Field rules applied to book payloads before any store mutation.
//!
//! Every rule is checked so one response lists all violations.

use serde_json::Value;

use super::models::{BookPatch, BookPayload, NewBook};
use crate::utils;

/// Earliest accepted publication year. The latest is the current year.
pub const MIN_PUBLISHED_YEAR: i32 = 1000;

const TITLE_REQUIRED: &str = "Title is required";
const AUTHOR_REQUIRED: &str = "Author ID is required";
const ISBN_REQUIRED: &str = "ISBN is required";
const YEAR_REQUIRED: &str = "Published year is required";
const YEAR_INVALID: &str = "Invalid published year";

/// Validate a complete book for creation.
pub fn validate_new_book(payload: BookPayload, current_year: i32) -> Result<NewBook, Vec<String>> {
    let mut errors = Vec::new();

    let title = required(payload.title, TITLE_REQUIRED, &mut errors);
    let author_id = required(payload.author_id, AUTHOR_REQUIRED, &mut errors);
    let isbn = required(payload.isbn, ISBN_REQUIRED, &mut errors);
    let published_year = match payload.published_year {
        Some(value) => published_year(&value, current_year, &mut errors),
        None => {
            errors.push(YEAR_REQUIRED.to_string());
            None
        }
    };

    match (title, author_id, isbn, published_year) {
        (Some(title), Some(author_id), Some(isbn), Some(published_year)) if errors.is_empty() => {
            Ok(NewBook {
                title,
                author_id,
                isbn,
                published_year,
                genre: utils::non_blank(payload.genre),
            })
        }
        _ => Err(errors),
    }
}

/// Validate a partial update: only the fields present are checked.
pub fn validate_book_patch(payload: BookPayload, current_year: i32) -> Result<BookPatch, Vec<String>> {
    let mut errors = Vec::new();

    let title = present(payload.title, TITLE_REQUIRED, &mut errors);
    let author_id = present(payload.author_id, AUTHOR_REQUIRED, &mut errors);
    let isbn = present(payload.isbn, ISBN_REQUIRED, &mut errors);
    let published_year = payload
        .published_year
        .and_then(|value| published_year(&value, current_year, &mut errors));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(BookPatch {
        title,
        author_id,
        isbn,
        published_year,
        genre: payload.genre,
    })
}

fn required(value: Option<String>, message: &str, errors: &mut Vec<String>) -> Option<String> {
    let value = utils::non_blank(value);
    if value.is_none() {
        errors.push(message.to_string());
    }
    value
}

fn present(value: Option<String>, message: &str, errors: &mut Vec<String>) -> Option<String> {
    value.and_then(|v| required(Some(v), message, errors))
}

fn published_year(value: &Value, current_year: i32, errors: &mut Vec<String>) -> Option<i32> {
    let year = value
        .as_i64()
        .and_then(|year| i32::try_from(year).ok())
        .filter(|year| (MIN_PUBLISHED_YEAR..=current_year).contains(year));
    if year.is_none() {
        errors.push(YEAR_INVALID.to_string());
    }
    year
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YEAR: i32 = 2026;

    fn payload(value: Value) -> BookPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_complete_book() {
        let book = validate_new_book(
            payload(json!({
                "title": " Emma ",
                "authorId": "a1",
                "isbn": "123",
                "publishedYear": 1815,
                "genre": "Novel"
            })),
            YEAR,
        )
        .unwrap();

        assert_eq!(book.title, "Emma");
        assert_eq!(book.published_year, 1815);
        assert_eq!(book.genre.as_deref(), Some("Novel"));
    }

    #[test]
    fn lists_every_missing_field() {
        let errors = validate_new_book(payload(json!({ "title": "  " })), YEAR).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Title is required",
                "Author ID is required",
                "ISBN is required",
                "Published year is required",
            ]
        );
    }

    #[test]
    fn year_bounds_are_inclusive() {
        let base = json!({ "title": "T", "authorId": "a", "isbn": "i" });
        for (year, ok) in [
            (json!(999), false),
            (json!(1000), true),
            (json!(YEAR), true),
            (json!(YEAR + 1), false),
            (json!("1815"), false),
            (json!(1815.5), false),
        ] {
            let mut body = base.clone();
            body["publishedYear"] = year.clone();
            let result = validate_new_book(payload(body), YEAR);
            assert_eq!(result.is_ok(), ok, "year {year}");
            if !ok {
                assert_eq!(result.unwrap_err(), vec!["Invalid published year"]);
            }
        }
    }

    #[test]
    fn null_year_counts_as_missing() {
        let errors = validate_new_book(
            payload(json!({ "title": "T", "authorId": "a", "isbn": "i", "publishedYear": null })),
            YEAR,
        )
        .unwrap_err();
        assert_eq!(errors, vec!["Published year is required"]);
    }

    #[test]
    fn patch_checks_only_present_fields() {
        let patch = validate_book_patch(payload(json!({ "publishedYear": 1816 })), YEAR).unwrap();
        assert_eq!(patch.published_year, Some(1816));
        assert!(patch.title.is_none());

        let errors =
            validate_book_patch(payload(json!({ "isbn": "", "publishedYear": 3000 })), YEAR)
                .unwrap_err();
        assert_eq!(errors, vec!["ISBN is required", "Invalid published year"]);

        assert_eq!(
            validate_book_patch(BookPayload::default(), YEAR).unwrap(),
            BookPatch::default()
        );
    }
}
