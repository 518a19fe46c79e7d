//! Gazette Recognize: adapters for the external rasterization and
//! recognition collaborators.
//!
//! `Rasterizer` turns a stored document into ordered page images;
//! `PopplerRasterizer` shells out to `pdftoppm` for PDFs and copies image
//! uploads through as a single page. `Recognizer` turns one page image into
//! ordered `RecognizedLine`s; `CommandRecognizer` runs an external OCR
//! command and validates its JSON output at this boundary. Without a
//! configured command, `UnavailableRecognizer` is used and every page fails
//! with a recognition error.

pub mod command;
pub mod rasterizer;
pub mod recognizer;
pub mod types;

pub use command::{parse_recognition_output, CommandRecognizer};
pub use rasterizer::{PopplerRasterizer, Rasterizer};
pub use recognizer::{Recognizer, UnavailableRecognizer};
pub use types::*;

use std::sync::Arc;

use gazette_core::GazetteConfig;

/// Create the rasterizer for the given configuration.
pub fn create_rasterizer(config: &GazetteConfig) -> Arc<dyn Rasterizer> {
    Arc::new(PopplerRasterizer::new(config.poppler_path.clone()))
}

/// Create the best available recognizer for the given configuration.
pub fn create_recognizer(config: &GazetteConfig) -> Arc<dyn Recognizer> {
    match config.recognizer_command.as_deref() {
        Some(cmd) => match CommandRecognizer::from_command_line(cmd) {
            Some(recognizer) => {
                tracing::info!("Using command recognizer: {}", cmd);
                return Arc::new(recognizer);
            }
            None => {
                tracing::warn!("GAZETTE_RECOGNIZER is blank, recognition disabled");
            }
        },
        None => {
            tracing::warn!("No recognition engine configured (GAZETTE_RECOGNIZER unset)");
        }
    }
    Arc::new(UnavailableRecognizer)
}
