//! Project-specific utilities live here.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::OffsetDateTime;

/// Formats a shared log prefix for project logs.
pub fn log_prefix(module: &str) -> String {
    format!("libris::{module}")
}

/// Comparison key for case-insensitive uniqueness checks.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// `None` for absent or blank input, the trimmed text otherwise.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads an optional text field without rejecting the whole body.
///
/// `null` reads as absent and any non-string value as blank, so the field
/// fails its own validation rule instead of failing deserialization.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(_) => Some(String::new()),
    })
}

pub fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_ignore_case_and_padding() {
        assert_eq!(normalize_key("  Jane AUSTEN "), "jane austen");
        assert_eq!(normalize_key("978-0"), normalize_key("978-0 "));
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" Fantasy ".into())), Some("Fantasy".into()));
    }

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "lenient_text")]
        name: Option<String>,
    }

    #[test]
    fn lenient_text_blanks_wrong_types() {
        let read = |json: &str| serde_json::from_str::<Body>(json).unwrap().name;
        assert_eq!(read(r#"{"name":"Jane"}"#), Some("Jane".into()));
        assert_eq!(read(r#"{"name":123}"#), Some(String::new()));
        assert_eq!(read(r#"{"name":["a"]}"#), Some(String::new()));
        assert_eq!(read(r#"{"name":null}"#), None);
        assert_eq!(read("{}"), None);
    }

    #[test]
    fn current_year_is_plausible() {
        assert!(current_year() >= 2024);
        assert_eq!(log_prefix("books"), "libris::books");
    }
}
