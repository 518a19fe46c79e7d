//! TF-IDF keyword ranking over jieba's bundled IDF table.

use jieba_rs::{Jieba, KeywordExtract, TfIdf};
use serde::Serialize;

use super::segmenter::{is_punctuation, is_stop_word};

pub const DEFAULT_TOP_K: usize = 10;

/// Minimum keyword length, in characters.
const MIN_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedKeyword {
    pub word: String,
    pub weight: f64,
}

fn is_candidate(word: &str) -> bool {
    word.chars().count() >= MIN_CHARS
        && !is_stop_word(word)
        && !word
            .chars()
            .all(|c| c.is_whitespace() || c.is_numeric() || is_punctuation(c))
}

/// Rank the words of `text` by TF-IDF and keep the top `top_k`.
///
/// Equal weights fall back to first appearance in the text, then to the
/// word itself, so equal input always yields the same ranking.
pub fn rank_keywords(tfidf: &TfIdf, jieba: &Jieba, text: &str, top_k: usize) -> Vec<RankedKeyword> {
    if top_k == 0 || text.trim().is_empty() {
        return Vec::new();
    }

    // Fetch every candidate; the filters below may drop some of the top ones.
    let pool = text.chars().count().max(top_k);
    let mut ranked: Vec<(RankedKeyword, usize)> = tfidf
        .extract_keywords(jieba, text, pool, Vec::new())
        .into_iter()
        .filter(|k| is_candidate(&k.keyword))
        .map(|k| {
            let first = text.find(k.keyword.as_str()).unwrap_or(usize::MAX);
            (
                RankedKeyword {
                    word: k.keyword,
                    weight: k.weight,
                },
                first,
            )
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.0.weight
            .total_cmp(&a.0.weight)
            .then(a.1.cmp(&b.1))
            .then_with(|| a.0.word.cmp(&b.0.word))
    });
    ranked.into_iter().take(top_k).map(|(k, _)| k).collect()
}
