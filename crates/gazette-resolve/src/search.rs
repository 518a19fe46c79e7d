//! Search query engine over the article store.

use gazette_core::{Error, Result};
use gazette_store::SqliteStore;
use tracing::debug;

use crate::types::{ArticleSummary, SearchMode};

pub struct SearchEngine<'a> {
    store: &'a SqliteStore,
}

impl<'a> SearchEngine<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Run a query in the given mode. A blank query is an input error.
    ///
    /// Keyword mode matches the trimmed query exactly, since stored keywords
    /// never carry surrounding whitespace. Content mode matches the query as
    /// given, whitespace included, as a substring anywhere in the body.
    pub fn search(&self, query: &str, mode: SearchMode, limit: usize) -> Result<Vec<ArticleSummary>> {
        if query.trim().is_empty() {
            return Err(Error::Input("search query is empty".into()));
        }

        let records = match mode {
            SearchMode::Keyword => self.store.search_by_keyword(query.trim(), limit)?,
            SearchMode::Content => self.store.search_by_content(query, limit)?,
        };
        debug!(
            "Search '{}' ({}): {} result(s)",
            query,
            mode.as_str(),
            records.len()
        );
        Ok(records.iter().map(ArticleSummary::from).collect())
    }
}
