//! Query and result types.

use serde::{Deserialize, Serialize};

use gazette_core::{Error, Result};
use gazette_store::ArticleRecord;

/// Longest body excerpt in a summary, in characters.
pub const SUMMARY_CHARS: usize = 200;

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Keyword,
    #[default]
    Content,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Content => "content",
        }
    }
}

impl std::str::FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "content" => Ok(Self::Content),
            other => Err(Error::Input(format!(
                "unknown search type '{}' (expected keyword or content)",
                other
            ))),
        }
    }
}

/// One search hit as shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// ISO `YYYY-MM-DD`.
    pub date: Option<String>,
    pub newspaper: String,
    pub page_number: i64,
    pub keywords: Vec<String>,
}

impl From<&ArticleRecord> for ArticleSummary {
    fn from(record: &ArticleRecord) -> Self {
        let a = &record.article;
        Self {
            id: a.id,
            title: a.title.clone(),
            content: excerpt(&a.content, SUMMARY_CHARS),
            date: a.extracted_date.map(|d| d.format("%Y-%m-%d").to_string()),
            newspaper: record.newspaper.name.clone(),
            page_number: record.page.page_number,
            keywords: record.keywords.clone(),
        }
    }
}

/// First `max` characters, with `...` appended when anything was cut.
pub fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_counts_chars() {
        let body = "经".repeat(SUMMARY_CHARS);
        assert_eq!(excerpt(&body, SUMMARY_CHARS), body);

        let longer = "济".repeat(SUMMARY_CHARS + 1);
        let cut = excerpt(&longer, SUMMARY_CHARS);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), SUMMARY_CHARS + 3);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("content".parse::<SearchMode>().unwrap(), SearchMode::Content);
        assert_eq!(" Keyword ".parse::<SearchMode>().unwrap(), SearchMode::Keyword);
        assert!(matches!(
            "fuzzy".parse::<SearchMode>(),
            Err(Error::Input(_))
        ));
        assert_eq!(SearchMode::default(), SearchMode::Content);
    }
}
