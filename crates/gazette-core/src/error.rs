//! Error types for the newspaper archive.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or empty upload, disallowed file kind, empty saved file.
    #[error("Input error: {0}")]
    Input(String),

    /// The rasterization tool is not installed or not reachable.
    #[error("Renderer unavailable: {0}")]
    RendererUnavailable(String),

    /// The document could not be rasterized (malformed or unreadable).
    #[error("Render error: {0}")]
    Render(String),

    #[error("Recognition error on page {page}: {message}")]
    Recognition { page: u32, message: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Referential integrity violation: {0}")]
    Referential(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Caller-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Input,
    Render,
    Recognition,
    Persistence,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Render => write!(f, "render"),
            Self::Recognition => write!(f, "recognition"),
            Self::Persistence => write!(f, "persistence"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Input(_) => ErrorCategory::Input,
            Self::RendererUnavailable(_) | Self::Render(_) => ErrorCategory::Render,
            Self::Recognition { .. } => ErrorCategory::Recognition,
            Self::Constraint(_) | Self::Referential(_) | Self::Database(_) | Self::NotFound(_) => {
                ErrorCategory::Persistence
            }
            Self::Io(_) | Self::Json(_) | Self::Config(_) | Self::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn recognition(page: u32, message: impl Into<String>) -> Self {
        Self::Recognition {
            page,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_failures_share_a_category_but_not_a_variant() {
        let missing = Error::RendererUnavailable("pdftoppm not found".into());
        let bad = Error::Render("syntax error in xref".into());
        assert_eq!(missing.category(), ErrorCategory::Render);
        assert_eq!(bad.category(), ErrorCategory::Render);
        assert!(missing.to_string().starts_with("Renderer unavailable"));
        assert!(bad.to_string().starts_with("Render error"));
    }

    #[test]
    fn test_persistence_category() {
        assert_eq!(
            Error::Referential("newspaper 9".into()).category(),
            ErrorCategory::Persistence
        );
        assert_eq!(
            Error::Constraint("name is required".into()).category(),
            ErrorCategory::Persistence
        );
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&ErrorCategory::Recognition).unwrap();
        assert_eq!(json, "\"recognition\"");
        let err = Error::recognition(3, "engine crashed");
        assert_eq!(err.to_string(), "Recognition error on page 3: engine crashed");
    }
}
