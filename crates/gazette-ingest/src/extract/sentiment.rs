//! Lexicon sentiment.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static POSITIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "好", "正", "优", "佳", "美", "赞", "成功", "进步", "胜利", "繁荣", "发展", "提高", "增长",
        "改善", "幸福", "和平", "稳定",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "坏", "差", "劣", "败", "负", "失败", "衰退", "下降", "危机", "困难", "问题", "冲突", "战争",
        "灾害", "贫困", "腐败", "混乱",
    ]
    .into_iter()
    .collect()
});

pub fn analyze(tokens: &[&str]) -> Sentiment {
    let positive = tokens.iter().filter(|t| POSITIVE.contains(*t)).count();
    let negative = tokens.iter().filter(|t| NEGATIVE.contains(*t)).count();
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}
