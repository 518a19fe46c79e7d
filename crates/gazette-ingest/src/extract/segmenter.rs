//! Word segmentation.

use std::collections::HashSet;
use std::io::BufRead;

use jieba_rs::{Jieba, TfIdf};
use once_cell::sync::Lazy;
use tracing::info;

use gazette_core::{Error, Result};

use super::keywords::{rank_keywords, RankedKeyword};

/// Function words removed before ranking.
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "的", "了", "和", "是", "在", "有", "与", "为", "以", "之", "于", "不", "也", "而", "其",
        "中", "此", "又", "等", "被",
    ]
    .into_iter()
    .collect()
});

/// Splits text into word tokens borrowed from the input, and ranks its
/// keywords with the same dictionary.
pub trait WordSegmenter: Send + Sync {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// Up to `top_k` keywords of `text`, highest weight first.
    fn extract_keywords(&self, text: &str, top_k: usize) -> Vec<RankedKeyword>;

    fn name(&self) -> &str;
}

/// Dictionary-based Chinese segmentation with TF-IDF keyword ranking.
pub struct JiebaSegmenter {
    jieba: Jieba,
    tfidf: TfIdf,
}

impl JiebaSegmenter {
    /// Load the bundled dictionary and IDF table. Expensive; build once per
    /// pipeline.
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
            tfidf: TfIdf::default(),
        }
    }

    /// Bundled dictionary extended with a user dictionary
    /// (`word [freq] [tag]` per line).
    pub fn with_user_dict<R: BufRead>(dict: &mut R) -> Result<Self> {
        let mut jieba = Jieba::new();
        jieba
            .load_dict(dict)
            .map_err(|e| Error::Config(format!("invalid user dictionary: {}", e)))?;
        info!("Loaded user dictionary into word segmenter");
        Ok(Self {
            jieba,
            tfidf: TfIdf::default(),
        })
    }
}

impl Default for JiebaSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl WordSegmenter for JiebaSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.jieba.cut(text, true)
    }

    fn extract_keywords(&self, text: &str, top_k: usize) -> Vec<RankedKeyword> {
        rank_keywords(&self.tfidf, &self.jieba, text, top_k)
    }

    fn name(&self) -> &str {
        "jieba"
    }
}

/// ASCII or CJK punctuation.
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '，' | '。' | '、' | '；' | '：' | '？' | '！' | '“' | '”' | '‘' | '’' | '（' | '）'
                | '【' | '】' | '《' | '》' | '「' | '」' | '『' | '』' | '…' | '—' | '·' | '［'
                | '］' | '〔' | '〕'
        )
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jieba_covers_input() {
        let seg = JiebaSegmenter::new();
        let text = "近来全国商业不振，市场萧条";
        let tokens = seg.segment(text);
        assert!(tokens.len() > 1);
        assert_eq!(tokens.concat(), text);
    }

    #[test]
    fn test_jieba_user_dict() {
        let mut dict = "李文通 20000 nr\n".as_bytes();
        let seg = JiebaSegmenter::with_user_dict(&mut dict).unwrap();
        assert!(seg.segment("商报记者李文通").contains(&"李文通"));
    }

    #[test]
    fn test_stop_words_and_punctuation() {
        assert!(is_stop_word("的"));
        assert!(!is_stop_word("经济"));
        assert!(is_punctuation('，'));
        assert!(is_punctuation('.'));
        assert!(!is_punctuation('经'));
    }

    #[test]
    fn test_jieba_keywords_skip_stop_words() {
        let seg = JiebaSegmenter::new();
        let words: Vec<String> = seg
            .extract_keywords("银行与钱庄之间的往来，银行利率上升。", 5)
            .into_iter()
            .map(|k| k.word)
            .collect();
        assert!(words.contains(&"银行".to_string()), "{:?}", words);
        assert!(words.iter().all(|w| !is_stop_word(w)));
    }
}
