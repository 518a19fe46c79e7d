//! Gazette server: HTTP surface over the archive pipeline and store.

pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
