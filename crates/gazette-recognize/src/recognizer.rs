//! Recognition engine trait.

use gazette_core::{Error, Result};

use crate::types::{PageImage, RecognizedLine};

/// Trait for text recognition backends.
pub trait Recognizer: Send + Sync {
    /// Recognize the lines of one page, in engine reading order.
    /// An empty list is a valid result (blank page).
    fn recognize(&self, page: &PageImage) -> Result<Vec<RecognizedLine>>;

    /// Check if the engine is ready to accept pages.
    fn is_available(&self) -> bool;

    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Release engine resources. Called once when the pipeline shuts down.
    fn shutdown(&self) {}
}

/// Placeholder used when no recognition engine is configured.
pub struct UnavailableRecognizer;

impl Recognizer for UnavailableRecognizer {
    fn recognize(&self, page: &PageImage) -> Result<Vec<RecognizedLine>> {
        Err(Error::recognition(
            page.number,
            "no recognition engine configured (set GAZETTE_RECOGNIZER)",
        ))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
