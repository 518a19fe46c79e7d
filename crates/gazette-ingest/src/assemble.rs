//! Page assembly: recognized lines → page text blob.

use gazette_recognize::RecognizedLine;

/// One page's recognized text, ready for segmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPage {
    /// Line texts joined by `\n`, in engine order.
    pub text: String,
    /// The engine's lines, unchanged.
    pub lines: Vec<RecognizedLine>,
    /// Page pixel size, when known; used to normalize article geometry.
    pub dimensions: Option<(u32, u32)>,
}

impl AssembledPage {
    /// Text of the first line that is not blank.
    pub fn first_line(&self) -> Option<&str> {
        self.lines
            .iter()
            .map(|l| l.text.trim())
            .find(|t| !t.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Concatenate line texts in the order the engine produced them.
///
/// No reordering, filtering or deduplication happens here.
pub fn assemble(lines: Vec<RecognizedLine>, dimensions: Option<(u32, u32)>) -> AssembledPage {
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    AssembledPage {
        text,
        lines,
        dimensions,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use gazette_recognize::{Point, Quad};

    pub(crate) fn line(text: &str, y: f64) -> RecognizedLine {
        RecognizedLine {
            quad: Quad([
                Point { x: 100.0, y },
                Point { x: 900.0, y },
                Point { x: 900.0, y: y + 30.0 },
                Point { x: 100.0, y: y + 30.0 },
            ]),
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_joins_in_engine_order() {
        let page = assemble(
            vec![line("第二行", 200.0), line("第一行", 100.0), line("第二行", 300.0)],
            None,
        );
        assert_eq!(page.text, "第二行\n第一行\n第二行");
        assert_eq!(page.lines.len(), 3);
    }

    #[test]
    fn test_blank_page() {
        let page = assemble(Vec::new(), Some((100, 100)));
        assert_eq!(page.text, "");
        assert!(page.is_blank());
        assert_eq!(page.first_line(), None);
    }

    #[test]
    fn test_first_line_skips_blank_entries() {
        let mut low = line("申报", 120.0);
        low.confidence = 0.12;
        let page = assemble(vec![line("  ", 80.0), low], None);
        assert_eq!(page.first_line(), Some("申报"));
        assert_eq!(page.text, "  \n申报");
    }
}
