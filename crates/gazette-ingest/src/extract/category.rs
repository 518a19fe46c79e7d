//! Keyword-bag topical classification.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Economy,
    Society,
    International,
    Other,
}

impl Category {
    /// Scored categories, in a fixed order.
    pub const SCORED: [Category; 4] = [
        Self::Politics,
        Self::Economy,
        Self::Society,
        Self::International,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Politics => "politics",
            Self::Economy => "economy",
            Self::Society => "society",
            Self::International => "international",
            Self::Other => "other",
        }
    }

}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Term → category.
static TERMS: Lazy<HashMap<&'static str, Category>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for t in [
        "政府", "总统", "国家", "政策", "法律", "党", "军事", "战争", "军队",
    ] {
        m.insert(t, Category::Politics);
    }
    for t in [
        "经济", "商业", "贸易", "货币", "银行", "产业", "市场", "价格", "金融", "物价",
    ] {
        m.insert(t, Category::Economy);
    }
    for t in [
        "社会", "民众", "生活", "教育", "文化", "艺术", "风俗", "习惯",
    ] {
        m.insert(t, Category::Society);
    }
    for t in [
        "国际", "外交", "条约", "外国", "世界", "洋人", "欧洲", "美国", "日本",
    ] {
        m.insert(t, Category::International);
    }
    m
});

/// Count term hits per category. A unique highest score wins; a tie for
/// the top or no hits at all gives `Other`.
pub fn classify(tokens: &[&str]) -> Category {
    let mut scores = [0usize; 4];
    for token in tokens {
        if let Some(cat) = TERMS.get(token) {
            if let Some(i) = Category::SCORED.iter().position(|c| c == cat) {
                scores[i] += 1;
            }
        }
    }

    let max = scores.iter().copied().max().unwrap_or(0);
    if max == 0 || scores.iter().filter(|&&s| s == max).count() > 1 {
        return Category::Other;
    }
    scores
        .iter()
        .position(|&s| s == max)
        .map(|i| Category::SCORED[i])
        .unwrap_or(Category::Other)
}
