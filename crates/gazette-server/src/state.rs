//! Shared application state.

use gazette_core::GazetteConfig;
use gazette_runtime::PipelineContext;
use gazette_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: GazetteConfig,
    pub store: SqliteStore,
    pub pipeline: PipelineContext,
}

impl AppState {
    pub fn new(config: GazetteConfig, store: SqliteStore, pipeline: PipelineContext) -> Self {
        Self {
            config,
            store,
            pipeline,
        }
    }
}
