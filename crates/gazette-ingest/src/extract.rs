//! Metadata extraction for article text.
//!
//! Five independent extractors run over the same text: publication date,
//! ranked keywords, topical category, sentiment and entity candidates. Each
//! is a pure function of its input, so re-running extraction on the same
//! text gives the same metadata.

pub mod category;
pub mod dates;
pub mod entities;
pub mod keywords;
pub mod segmenter;
pub mod sentiment;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

pub use category::Category;
pub use dates::DateOutcome;
pub use entities::Entities;
pub use keywords::{RankedKeyword, DEFAULT_TOP_K};
pub use segmenter::{JiebaSegmenter, WordSegmenter};
pub use sentiment::Sentiment;

/// Everything derived from one article's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleMetadata {
    pub date: DateOutcome,
    pub keywords: Vec<RankedKeyword>,
    pub category: Category,
    pub sentiment: Sentiment,
    pub entities: Entities,
}

impl ArticleMetadata {
    /// Keyword words in rank order.
    pub fn keyword_words(&self) -> Vec<String> {
        self.keywords.iter().map(|k| k.word.clone()).collect()
    }
}

/// Runs all extractors with a shared word segmenter.
#[derive(Clone)]
pub struct MetadataExtractor {
    segmenter: Arc<dyn WordSegmenter>,
    top_k: usize,
}

impl MetadataExtractor {
    pub fn new(segmenter: Arc<dyn WordSegmenter>, top_k: usize) -> Self {
        Self { segmenter, top_k }
    }

    pub fn segmenter_name(&self) -> &str {
        self.segmenter.name()
    }

    pub fn extract(&self, text: &str) -> ArticleMetadata {
        let tokens = self.segmenter.segment(text);
        let meta = ArticleMetadata {
            date: dates::extract_date(text),
            keywords: self.segmenter.extract_keywords(text, self.top_k),
            category: category::classify(&tokens),
            sentiment: sentiment::analyze(&tokens),
            entities: entities::extract(&tokens),
        };
        debug!(
            "Extracted {} token(s): {} keyword(s), category={}, sentiment={}",
            tokens.len(),
            meta.keywords.len(),
            meta.category,
            meta.sentiment
        );
        meta
    }
}

impl std::fmt::Debug for MetadataExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataExtractor")
            .field("segmenter", &self.segmenter.name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use once_cell::sync::Lazy;

    static SEGMENTER: Lazy<Arc<JiebaSegmenter>> = Lazy::new(|| {
        let mut dict = "张三 20000 nr\n上海市 20000 ns\n".as_bytes();
        Arc::new(JiebaSegmenter::with_user_dict(&mut dict).unwrap())
    });

    fn extractor() -> MetadataExtractor {
        MetadataExtractor::new(SEGMENTER.clone(), DEFAULT_TOP_K)
    }

    #[test]
    fn test_extract_all_fields() {
        let text = "1926年5月3日 经济 市场 物价 金融 经济 发展 繁荣 危机 上海市 张三";
        let meta = extractor().extract(text);
        assert_eq!(
            meta.date,
            DateOutcome::Found(NaiveDate::from_ymd_opt(1926, 5, 3).unwrap())
        );
        assert_eq!(meta.category, Category::Economy);
        assert_eq!(meta.sentiment, Sentiment::Positive);
        assert!(meta.keyword_words().contains(&"经济".to_string()));
        assert!(meta.keywords.len() <= DEFAULT_TOP_K);
        assert_eq!(meta.entities.locations, vec!["上海市".to_string()]);
        assert_eq!(meta.entities.persons, vec!["张三".to_string()]);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "商业 不振 市场 萧条 物价 下跌 百业 凋敝 民生 困苦 经济 危机 经济";
        let ex = extractor();
        let first = ex.extract(text);
        for _ in 0..5 {
            assert_eq!(ex.extract(text), first);
        }
    }

    #[test]
    fn test_empty_text() {
        let meta = extractor().extract("");
        assert_eq!(meta.date, DateOutcome::NotFound);
        assert!(meta.keywords.is_empty());
        assert_eq!(meta.category, Category::Other);
        assert_eq!(meta.sentiment, Sentiment::Neutral);
        assert!(meta.entities.is_empty());
    }
}
