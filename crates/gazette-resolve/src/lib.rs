//! Resolvers: turn a user query into ordered article summaries.
//!
//! Two modes: exact keyword lookup through the article-keyword relation,
//! and case-sensitive substring match on article bodies.

pub mod search;
pub mod types;

pub use search::SearchEngine;
pub use types::*;
