//! Search, filter, sort and pagination for the books of one author.
//!
//! Stages run in a fixed order, each on the previous one's output:
//! free text, genre, minimum year, maximum year, sort, page slice.
//! Query strings are parsed leniently: malformed numbers fall back to defaults
//! and only an unknown sort field is rejected.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::models::Book;
use crate::modules::catalog::CatalogError;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;
const DEFAULT_SORT: &str = "publishedYear:desc";

/// Raw query string of `GET /authors/{id}/books`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookQueryParams {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub min_year: Option<String>,
    pub max_year: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    PublishedYear,
    CreatedAt,
    UpdatedAt,
}

impl FromStr for SortField {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "publishedYear" => Ok(Self::PublishedYear),
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            other => Err(CatalogError::InvalidSortField {
                field: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A parsed, validated query.
#[derive(Debug, Clone, PartialEq)]
pub struct BookQuery {
    /// Lowercased free-text needle
    pub search: Option<String>,
    /// Lowercased exact genre
    pub genre: Option<String>,
    pub min_year: Option<f64>,
    pub max_year: Option<f64>,
    pub sort_field: SortField,
    pub direction: SortDirection,
    pub page: usize,
    pub limit: usize,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            search: None,
            genre: None,
            min_year: None,
            max_year: None,
            sort_field: SortField::PublishedYear,
            direction: SortDirection::Desc,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    /// `ceil(total / limit)`, never below 1
    pub total_pages: usize,
}

impl BookQuery {
    pub fn parse(params: &BookQueryParams) -> Result<Self, CatalogError> {
        let (sort_field, direction) = parse_sort(params.sort.as_deref())?;

        Ok(Self {
            search: lowered(params.q.as_deref()),
            genre: lowered(params.genre.as_deref()),
            min_year: number(params.min_year.as_deref()),
            max_year: number(params.max_year.as_deref()),
            sort_field,
            direction,
            page: parse_page(params.page.as_deref()),
            limit: parse_limit(params.limit.as_deref()),
        })
    }

    /// Run every stage over `books` and cut out the requested page.
    pub fn apply(&self, mut books: Vec<Book>) -> Paged<Book> {
        if let Some(needle) = &self.search {
            books.retain(|book| matches_text(book, needle));
        }
        if let Some(genre) = &self.genre {
            books.retain(|book| genre_key(book) == *genre);
        }
        if let Some(min) = self.min_year {
            books.retain(|book| f64::from(book.published_year) >= min);
        }
        if let Some(max) = self.max_year {
            books.retain(|book| f64::from(book.published_year) <= max);
        }

        // `sort_by` is stable: equal keys keep insertion order.
        books.sort_by(|a, b| self.compare(a, b));

        let total = books.len();
        let start = self.page.saturating_sub(1).saturating_mul(self.limit);
        let data = books.into_iter().skip(start).take(self.limit).collect();

        Paged {
            data,
            meta: PageMeta {
                total,
                page: self.page,
                limit: self.limit,
                total_pages: total.div_ceil(self.limit).max(1),
            },
        }
    }

    fn compare(&self, a: &Book, b: &Book) -> Ordering {
        let ordering = match self.sort_field {
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::PublishedYear => a.published_year.cmp(&b.published_year),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

fn matches_text(book: &Book, needle: &str) -> bool {
    book.title.to_lowercase().contains(needle)
        || book.isbn.to_lowercase().contains(needle)
        || genre_key(book).contains(needle)
}

fn genre_key(book: &Book) -> String {
    book.genre.as_deref().unwrap_or_default().to_lowercase()
}

fn lowered(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

/// Finite number or nothing.
fn number(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_page(raw: Option<&str>) -> usize {
    match number(raw) {
        Some(page) if page >= 1.0 => page.trunc() as usize,
        _ => DEFAULT_PAGE,
    }
}

fn parse_limit(raw: Option<&str>) -> usize {
    match number(raw) {
        Some(limit) if limit != 0.0 => limit.clamp(1.0, MAX_LIMIT as f64).trunc() as usize,
        _ => DEFAULT_LIMIT,
    }
}

/// `"<field>[:<direction>]"`; the direction is ascending only for `asc`.
fn parse_sort(raw: Option<&str>) -> Result<(SortField, SortDirection), CatalogError> {
    let raw = raw.filter(|value| !value.is_empty()).unwrap_or(DEFAULT_SORT);
    let mut parts = raw.split(':');
    let field = parts.next().filter(|f| !f.is_empty()).unwrap_or("publishedYear");
    let direction = match parts.next().map(str::to_lowercase).as_deref() {
        Some("asc") => SortDirection::Asc,
        _ => SortDirection::Desc,
    };
    Ok((field.parse()?, direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime};

    fn book(n: i64, title: &str, year: i32, genre: Option<&str>) -> Book {
        let at = OffsetDateTime::UNIX_EPOCH + Duration::seconds(n);
        Book {
            id: format!("b{n}"),
            title: title.into(),
            author_id: "a1".into(),
            isbn: format!("978-{n}"),
            published_year: year,
            genre: genre.map(str::to_string),
            created_at: at,
            updated_at: at,
        }
    }

    fn shelf() -> Vec<Book> {
        vec![
            book(1, "Emma", 1815, Some("Romance")),
            book(2, "persuasion", 1817, Some("romance")),
            book(3, "Northanger Abbey", 1817, Some("Gothic")),
            book(4, "Lady Susan", 1871, None),
            book(5, "Sanditon", 1925, Some("Satire")),
        ]
    }

    fn params(pairs: &[(&str, &str)]) -> BookQueryParams {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        from_query_string(&query)
    }

    // Mirrors what axum's `Query` extractor would hand over.
    fn from_query_string(query: &str) -> BookQueryParams {
        let map: serde_json::Map<String, serde_json::Value> = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    fn run(pairs: &[(&str, &str)]) -> Paged<Book> {
        BookQuery::parse(&params(pairs)).unwrap().apply(shelf())
    }

    fn ids(page: &Paged<Book>) -> Vec<&str> {
        page.data.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn defaults_sort_by_year_descending() {
        let query = BookQuery::parse(&BookQueryParams::default()).unwrap();
        assert_eq!(query, BookQuery::default());

        let page = query.apply(shelf());
        // b2 and b3 share 1817 and keep insertion order.
        assert_eq!(ids(&page), ["b5", "b4", "b2", "b3", "b1"]);
        assert_eq!(
            page.meta,
            PageMeta {
                total: 5,
                page: 1,
                limit: 10,
                total_pages: 1
            }
        );
    }

    #[test]
    fn free_text_matches_title_isbn_or_genre() {
        assert_eq!(ids(&run(&[("q", "EMMA")])), ["b1"]);
        assert_eq!(ids(&run(&[("q", "978-4")])), ["b4"]);
        assert_eq!(ids(&run(&[("q", "goth"), ("sort", "title:asc")])), ["b3"]);
        assert_eq!(run(&[("q", "   ")]).meta.total, 5);
    }

    #[test]
    fn genre_is_exact_and_case_insensitive() {
        assert_eq!(
            ids(&run(&[("genre", "ROMANCE"), ("sort", "title:asc")])),
            ["b1", "b2"]
        );
        assert!(run(&[("genre", "rom")]).data.is_empty());
    }

    #[test]
    fn year_range_is_inclusive_and_ignores_garbage() {
        assert_eq!(
            ids(&run(&[("minYear", "1817"), ("maxYear", "1871"), ("sort", "publishedYear:asc")])),
            ["b2", "b3", "b4"]
        );
        assert_eq!(run(&[("minYear", "soon"), ("maxYear", "")]).meta.total, 5);
    }

    #[test]
    fn stages_compose() {
        let page = run(&[("q", "o"), ("genre", "romance"), ("minYear", "1816")]);
        assert_eq!(ids(&page), ["b2"]);
    }

    #[test]
    fn sort_is_case_insensitive_and_direction_defaults_to_desc() {
        assert_eq!(
            ids(&run(&[("sort", "title:asc")])),
            ["b1", "b4", "b3", "b2", "b5"]
        );
        assert_eq!(
            ids(&run(&[("sort", "title")])),
            ["b5", "b2", "b3", "b4", "b1"]
        );
        assert_eq!(
            ids(&run(&[("sort", "createdAt:ASC")])),
            ["b1", "b2", "b3", "b4", "b5"]
        );
        assert_eq!(ids(&run(&[("sort", ":asc")]))[0], "b1");
    }

    #[test]
    fn ascending_output_is_ordered() {
        let page = run(&[("sort", "publishedYear:asc")]);
        assert!(page
            .data
            .windows(2)
            .all(|pair| pair[0].published_year <= pair[1].published_year));
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let err = BookQuery::parse(&params(&[("sort", "isbn:asc")])).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSortField { ref field } if field == "isbn"));
        assert_eq!(err.to_string(), "Invalid sort field: isbn");
    }

    #[test]
    fn page_and_limit_are_clamped() {
        let parse = |pairs: &[(&str, &str)]| BookQuery::parse(&params(pairs)).unwrap();

        assert_eq!(parse(&[("page", "0")]).page, 1);
        assert_eq!(parse(&[("page", "-3")]).page, 1);
        assert_eq!(parse(&[("page", "two")]).page, 1);
        assert_eq!(parse(&[("page", "3")]).page, 3);

        assert_eq!(parse(&[("limit", "0")]).limit, 10);
        assert_eq!(parse(&[("limit", "abc")]).limit, 10);
        assert_eq!(parse(&[("limit", "-5")]).limit, 1);
        assert_eq!(parse(&[("limit", "500")]).limit, 100);
        assert_eq!(parse(&[("limit", "25")]).limit, 25);
    }

    #[test]
    fn pagination_slices_and_counts_pages() {
        for limit in 1..=6usize {
            for page in 1..=7usize {
                let result = run(&[
                    ("limit", limit.to_string().as_str()),
                    ("page", page.to_string().as_str()),
                ]);
                let total = 5usize;
                let expected_len = limit.min(total.saturating_sub((page - 1) * limit));
                assert_eq!(result.data.len(), expected_len, "limit {limit} page {page}");
                assert_eq!(result.meta.total_pages, total.div_ceil(limit).max(1));
            }
        }
    }

    #[test]
    fn empty_input_still_has_one_page() {
        let page = BookQuery::default().apply(Vec::new());
        assert!(page.data.is_empty());
        assert_eq!(page.meta.total, 0);
        assert_eq!(page.meta.total_pages, 1);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let pairs = [("sort", "publishedYear:asc"), ("limit", "2"), ("page", "2")];
        assert_eq!(run(&pairs), run(&pairs));
    }

    #[test]
    fn serializes_meta_in_camel_case() {
        let json = serde_json::to_value(run(&[("limit", "2")])).unwrap();
        assert_eq!(json["meta"]["totalPages"], 3);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }
}
