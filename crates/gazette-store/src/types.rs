//! Row types for newspapers, pages, articles and keywords.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Processing state of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewspaperStatus {
    Pending,
    Processed,
    Failed,
}

impl NewspaperStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processed" => Some(Self::Processed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Forward moves only, plus retrying a failed document.
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(&self, next: NewspaperStatus) -> bool {
        use NewspaperStatus::*;
        matches!(
            (self, next),
            (Pending, Processed) | (Pending, Failed) | (Failed, Pending)
        ) || *self == next
    }
}

impl std::fmt::Display for NewspaperStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for NewspaperStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for NewspaperStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown status '{}'", s).into()))
    }
}

/// Page-normalized rectangle, all components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Newspaper {
    pub id: i64,
    pub name: String,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<String>,
    pub total_pages: i64,
    pub status: NewspaperStatus,
    /// Unix milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub newspaper_id: i64,
    pub page_number: i64,
    pub image_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub page_id: i64,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    pub extracted_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<serde_json::Value>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i64,
    pub word: String,
}

/// An article with its keywords, page and newspaper resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(flatten)]
    pub article: Article,
    pub keywords: Vec<String>,
    pub page: Page,
    pub newspaper: Newspaper,
}

/// A newspaper with its pages, in page order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewspaperDetail {
    #[serde(flatten)]
    pub newspaper: Newspaper,
    pub pages: Vec<Page>,
}

/// Fields for a new newspaper row.
#[derive(Debug, Clone, Default)]
pub struct NewNewspaper {
    pub name: String,
    pub file_path: String,
    pub issue_date: Option<NaiveDate>,
    pub issue_number: Option<String>,
    pub total_pages: i64,
}

/// Fields for a new article row.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub bbox: Option<BoundingBox>,
    pub extracted_date: Option<NaiveDate>,
    pub author: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub sentiment: Option<String>,
    pub entities: Option<serde_json::Value>,
}

/// Row counts for health reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub newspapers: i64,
    pub pages: i64,
    pub articles: i64,
    pub keywords: i64,
    pub db_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use NewspaperStatus::*;
        assert!(Pending.can_transition_to(Processed));
        assert!(Pending.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Pending));
        assert!(Processed.can_transition_to(Processed));
        assert!(!Processed.can_transition_to(Failed));
        assert!(!Processed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Processed));
    }

    #[test]
    fn test_status_names() {
        assert_eq!(NewspaperStatus::parse("failed"), Some(NewspaperStatus::Failed));
        assert_eq!(NewspaperStatus::parse("done"), None);
        assert_eq!(
            serde_json::to_string(&NewspaperStatus::Processed).unwrap(),
            "\"processed\""
        );
    }
}
