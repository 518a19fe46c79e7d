//! Author and source attribution at the foot of an article.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bracketed attribution such as `(记者 王五)` or `【商报记者 李文通】`.
static AUTHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[（(【［\[]\s*(?:记者|作者|编辑)?\s*[:：]?\s*([^）)】］\]]+?)\s*[）)】］\]]")
        .expect("valid author regex")
});

/// `来源: X` / `来源：X`.
static SOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"来源\s*[:：]?\s*(\S+)").expect("valid source regex"));

/// Number of trailing lines inspected for attribution.
const ATTRIBUTION_WINDOW: usize = 3;

/// Author and source found in the last non-empty lines of `text`.
pub fn extract_attribution(text: &str) -> (Option<String>, Option<String>) {
    let mut author = None;
    let mut source = None;
    let lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    for line in lines.rev().take(ATTRIBUTION_WINDOW) {
        if author.is_none() {
            author = capture(&AUTHOR_RE, line);
        }
        if source.is_none() {
            source = capture(&SOURCE_RE, line);
        }
    }
    (author, source)
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
    中华民国十五年五月三日

    经济困难之原因与对策

    近来全国商业不振，市场萧条，物价下跌，百业凋敝，民生困苦。
    唯有全国上下一心，共同努力，方能渡过此次经济危机。

    【商报记者 李文通】
    ";

    #[test]
    fn test_attribution_of_sample() {
        let (author, source) = extract_attribution(SAMPLE);
        assert_eq!(author.as_deref(), Some("商报记者 李文通"));
        assert_eq!(source, None);
    }

    #[test]
    fn test_reporter_prefix_is_stripped() {
        let (author, _) = extract_attribution("正文\n(记者 王五)");
        assert_eq!(author.as_deref(), Some("王五"));
    }

    #[test]
    fn test_source_pattern() {
        let (_, source) = extract_attribution("正文第一行\n来源：大公报 天津\n完");
        assert_eq!(source.as_deref(), Some("大公报"));
    }

    #[test]
    fn test_nearest_to_end_wins() {
        let text = "标题\n【甲报导】\n正文\n【乙报导】";
        let (author, _) = extract_attribution(text);
        assert_eq!(author.as_deref(), Some("乙报导"));
    }

    #[test]
    fn test_attribution_outside_window_is_ignored() {
        let text = "标题\n【甲报导】\n一\n二\n三";
        assert_eq!(extract_attribution(text), (None, None));
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(extract_attribution("  \n\n"), (None, None));
    }
}
