//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

use super::{error::DomainError, fragments::FragmentSet};

pub const DEFAULT_REPL_TITLE: &str = "Untitled Repl";
pub const MAX_REPL_TITLE_CHARS: usize = 200;

/// Trim a user-supplied title; blank titles fall back to [`DEFAULT_REPL_TITLE`].
pub fn normalize_title(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_REPL_TITLE.to_string());
    }

    if trimmed.chars().count() > MAX_REPL_TITLE_CHARS {
        return Err(DomainError::validation(format!(
            "title must be at most {MAX_REPL_TITLE_CHARS} characters"
        )));
    }

    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplRecord {
    pub id: i64,
    pub title: String,
    pub html: String,
    pub css: String,
    pub js: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ReplRecord {
    pub fn fragments(&self) -> FragmentSet {
        FragmentSet::new(self.html.clone(), self.css.clone(), self.js.clone())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn serializes_with_camel_case_timestamp() {
        let record = ReplRecord {
            id: 7,
            title: "Hello".to_string(),
            html: "<h1>x</h1>".to_string(),
            css: String::new(),
            js: String::new(),
            created_at: datetime!(2025-01-02 03:04:05 UTC),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["createdAt"], "2025-01-02T03:04:05Z");
        assert_eq!(record.fragments().markup, "<h1>x</h1>");
    }

    #[test]
    fn blank_titles_fall_back_to_default() {
        assert_eq!(normalize_title("   ").unwrap(), DEFAULT_REPL_TITLE);
        assert_eq!(normalize_title("  Counter \n").unwrap(), "Counter");
    }

    #[test]
    fn overlong_titles_are_rejected() {
        let exact = "é".repeat(MAX_REPL_TITLE_CHARS);
        assert_eq!(normalize_title(&exact).unwrap(), exact);

        let err = normalize_title(&"x".repeat(MAX_REPL_TITLE_CHARS + 1)).unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }
}
