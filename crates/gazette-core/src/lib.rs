//! Gazette Core: error taxonomy, configuration, data directory layout.

pub mod config;
pub mod error;

pub use config::{DataPaths, GazetteConfig};
pub use error::{Error, ErrorCategory, Result};
