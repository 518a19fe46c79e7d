//! Article segmentation.
//!
//! A segmenter turns one assembled page into article drafts. The only policy
//! shipped today treats the whole page as a single article; the trait exists
//! so a layout-aware segmenter can replace it without touching the pipeline.

use gazette_store::BoundingBox;

use crate::assemble::AssembledPage;
use crate::structure::extract_attribution;

/// Title used when a page has no recognized text.
pub const UNKNOWN_TITLE: &str = "unknown title";

/// One article cut out of a page, before metadata extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDraft {
    pub title: String,
    pub body: String,
    pub author: Option<String>,
    pub source: Option<String>,
    /// Page-normalized region, when page geometry is known.
    pub bbox: Option<BoundingBox>,
}

/// Splits an assembled page into article drafts.
pub trait ArticleSegmenter: Send + Sync {
    /// Must return at least one draft for every page, blank pages included.
    fn segment(&self, page: &AssembledPage) -> Vec<ArticleDraft>;

    fn name(&self) -> &str;
}

/// One page, one article.
#[derive(Debug, Default, Clone, Copy)]
pub struct WholePageSegmenter;

impl ArticleSegmenter for WholePageSegmenter {
    fn segment(&self, page: &AssembledPage) -> Vec<ArticleDraft> {
        let title = page.first_line().unwrap_or(UNKNOWN_TITLE).to_string();
        let (author, source) = extract_attribution(&page.text);
        vec![ArticleDraft {
            title,
            body: page.text.clone(),
            author,
            source,
            bbox: text_region(page),
        }]
    }

    fn name(&self) -> &str {
        "whole-page"
    }
}

/// Union of all line quads, normalized to the page size and clamped to [0, 1].
fn text_region(page: &AssembledPage) -> Option<BoundingBox> {
    let (width, height) = page.dimensions?;
    if width == 0 || height == 0 || page.lines.is_empty() {
        return None;
    }

    let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for line in &page.lines {
        let (min_x, min_y, max_x, max_y) = line.quad.bounds();
        x0 = x0.min(min_x);
        y0 = y0.min(min_y);
        x1 = x1.max(max_x);
        y1 = y1.max(max_y);
    }

    let w = width as f64;
    let h = height as f64;
    let left = (x0 / w).clamp(0.0, 1.0);
    let top = (y0 / h).clamp(0.0, 1.0);
    let right = (x1 / w).clamp(0.0, 1.0);
    let bottom = (y1 / h).clamp(0.0, 1.0);

    Some(BoundingBox {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::assemble::tests::line;

    #[test]
    fn test_blank_page_yields_one_placeholder_draft() {
        let page = assemble(Vec::new(), Some((1000, 1000)));
        let drafts = WholePageSegmenter.segment(&page);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, UNKNOWN_TITLE);
        assert_eq!(drafts[0].body, "");
        assert!(drafts[0].bbox.is_none());
    }

    #[test]
    fn test_body_includes_title_line() {
        let page = assemble(
            vec![line("经济困难之原因与对策", 100.0), line("近来全国商业不振", 150.0)],
            None,
        );
        let drafts = WholePageSegmenter.segment(&page);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "经济困难之原因与对策");
        assert_eq!(drafts[0].body, "经济困难之原因与对策\n近来全国商业不振");
        assert!(drafts[0].bbox.is_none());
    }

    #[test]
    fn test_attribution_on_draft() {
        let page = assemble(
            vec![
                line("标题", 10.0),
                line("正文", 60.0),
                line("【商报记者 李文通】", 110.0),
            ],
            None,
        );
        let draft = &WholePageSegmenter.segment(&page)[0];
        assert_eq!(draft.author.as_deref(), Some("商报记者 李文通"));
        assert!(draft.source.is_none());
    }

    #[test]
    fn test_region_is_normalized() {
        let page = assemble(
            vec![line("一", 100.0), line("二", 470.0)],
            Some((1000, 1000)),
        );
        let bbox = WholePageSegmenter.segment(&page)[0].bbox.unwrap();
        assert!((bbox.x - 0.1).abs() < 1e-9);
        assert!((bbox.y - 0.1).abs() < 1e-9);
        assert!((bbox.width - 0.8).abs() < 1e-9);
        assert!((bbox.height - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_region_clamps_overflowing_quads() {
        let page = assemble(vec![line("溢出", 990.0)], Some((800, 1000)));
        let bbox = WholePageSegmenter.segment(&page)[0].bbox.unwrap();
        assert!(bbox.x + bbox.width <= 1.0);
        assert!(bbox.y + bbox.height <= 1.0);
    }
}
