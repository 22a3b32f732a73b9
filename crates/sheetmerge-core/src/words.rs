use crate::geometry::BBox;
use crate::text::{Char, is_cjk_text};

/// Options for word extraction.
#[derive(Debug, Clone)]
pub struct WordOptions {
    /// Maximum horizontal gap between characters of one word.
    pub x_tolerance: f64,
    /// Maximum vertical offset between characters of one word.
    pub y_tolerance: f64,
    /// If true, blank characters stay inside words instead of splitting them.
    pub keep_blank_chars: bool,
}

impl Default for WordOptions {
    fn default() -> Self {
        Self {
            x_tolerance: 3.0,
            y_tolerance: 3.0,
            keep_blank_chars: false,
        }
    }
}

/// A word extracted from a PDF page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Word {
    /// The text content of this word.
    pub text: String,
    /// Bounding box encompassing all constituent characters.
    pub bbox: BBox,
}

impl Word {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }

    pub fn x0(&self) -> f64 {
        self.bbox.x0
    }

    pub fn x1(&self) -> f64 {
        self.bbox.x1
    }

    pub fn top(&self) -> f64 {
        self.bbox.top
    }

    /// Horizontal midpoint of the word.
    pub fn center_x(&self) -> f64 {
        self.bbox.center_x()
    }
}

/// Groups characters into words based on spatial proximity.
pub struct WordExtractor;

impl WordExtractor {
    /// Extract words from the given characters.
    ///
    /// Characters are sorted top-to-bottom, then left-to-right, and a new
    /// word starts whenever the horizontal gap to the previous glyph exceeds
    /// `x_tolerance` or the baseline jumps by more than `y_tolerance`. For
    /// CJK glyphs the previous glyph's width is used as the horizontal
    /// tolerance, since Japanese text is typeset without inter-word spaces
    /// but with full-width advance.
    pub fn extract(chars: &[Char], options: &WordOptions) -> Vec<Word> {
        if chars.is_empty() {
            return Vec::new();
        }

        let mut sorted: Vec<&Char> = chars.iter().collect();
        sorted.sort_by(|a, b| {
            a.bbox
                .top
                .total_cmp(&b.bbox.top)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });
        // Re-cluster tops that differ by less than the tolerance so that
        // glyphs of one visual line are not split by sub-point jitter.
        let sorted = Self::order_by_line(sorted, options.y_tolerance);

        let mut words = Vec::new();
        let mut current: Vec<&Char> = Vec::new();

        for ch in sorted {
            let is_blank = ch.text.chars().all(char::is_whitespace);
            if is_blank && !options.keep_blank_chars {
                if !current.is_empty() {
                    words.push(Self::make_word(&current));
                    current.clear();
                }
                continue;
            }

            if let Some(last) = current.last() {
                if Self::should_split(last, ch, options) {
                    words.push(Self::make_word(&current));
                    current.clear();
                }
            }
            current.push(ch);
        }

        if !current.is_empty() {
            words.push(Self::make_word(&current));
        }

        words
    }

    fn order_by_line(sorted: Vec<&Char>, y_tolerance: f64) -> Vec<&Char> {
        let mut lines: Vec<Vec<&Char>> = Vec::new();
        for ch in sorted {
            match lines.last_mut() {
                Some(line) if (ch.bbox.top - line[0].bbox.top).abs() <= y_tolerance => {
                    line.push(ch);
                }
                _ => lines.push(vec![ch]),
            }
        }
        lines
            .into_iter()
            .flat_map(|mut line| {
                line.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
                line
            })
            .collect()
    }

    fn should_split(last: &Char, current: &Char, options: &WordOptions) -> bool {
        // Distance between the x-intervals; zero for touching or overlapping glyphs.
        let x_gap =
            (last.bbox.x0.max(current.bbox.x0) - last.bbox.x1.min(current.bbox.x1)).max(0.0);
        let y_diff = (current.bbox.top - last.bbox.top).abs();
        let x_tol = if is_cjk_text(&last.text) || is_cjk_text(&current.text) {
            last.bbox.width().max(options.x_tolerance)
        } else {
            options.x_tolerance
        };
        x_gap > x_tol || y_diff > options.y_tolerance
    }

    fn make_word(chars: &[&Char]) -> Word {
        let text: String = chars.iter().map(|c| c.text.as_str()).collect();
        let bbox = chars
            .iter()
            .map(|c| c.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(BBox::new(0.0, 0.0, 0.0, 0.0));
        Word { text, bbox }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_char(text: &str, x0: f64, top: f64, x1: f64, bottom: f64) -> Char {
        Char {
            text: text.to_string(),
            bbox: BBox::new(x0, top, x1, bottom),
            fontname: "TestFont".to_string(),
            size: 12.0,
            upright: true,
        }
    }

    #[test]
    fn test_empty_chars() {
        assert!(WordExtractor::extract(&[], &WordOptions::default()).is_empty());
    }

    #[test]
    fn test_touching_chars_form_one_word() {
        let chars = vec![
            make_char("T", 10.0, 100.0, 18.0, 112.0),
            make_char("a", 18.0, 100.0, 24.0, 112.0),
            make_char("r", 24.0, 100.0, 28.0, 112.0),
            make_char("o", 28.0, 100.0, 34.0, 112.0),
        ];
        let words = WordExtractor::extract(&chars, &WordOptions::default());
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "Taro");
        assert_eq!(words[0].bbox, BBox::new(10.0, 100.0, 34.0, 112.0));
    }

    #[test]
    fn test_space_splits_words() {
        let chars = vec![
            make_char("A", 10.0, 100.0, 18.0, 112.0),
            make_char(" ", 18.0, 100.0, 21.0, 112.0),
            make_char("B", 21.0, 100.0, 29.0, 112.0),
        ];
        let words = WordExtractor::extract(&chars, &WordOptions::default());
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
    }

    #[test]
    fn test_keep_blank_chars() {
        let chars = vec![
            make_char("A", 10.0, 100.0, 18.0, 112.0),
            make_char(" ", 18.0, 100.0, 21.0, 112.0),
            make_char("B", 21.0, 100.0, 29.0, 112.0),
        ];
        let opts = WordOptions {
            keep_blank_chars: true,
            ..WordOptions::default()
        };
        let words = WordExtractor::extract(&chars, &opts);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "A B");
    }

    #[test]
    fn test_large_gap_splits_words() {
        let chars = vec![
            make_char("A", 10.0, 100.0, 18.0, 112.0),
            make_char("B", 40.0, 100.0, 48.0, 112.0),
        ];
        let words = WordExtractor::extract(&chars, &WordOptions::default());
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn test_separate_lines_split_words() {
        let chars = vec![
            make_char("A", 10.0, 100.0, 18.0, 112.0),
            make_char("B", 18.0, 130.0, 26.0, 142.0),
        ];
        let words = WordExtractor::extract(&chars, &WordOptions::default());
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "A");
        assert_eq!(words[1].text, "B");
    }

    #[test]
    fn test_cjk_uses_glyph_width_as_tolerance() {
        // 10pt full-width glyphs with a 4pt gap: wider than x_tolerance but
        // narrower than one glyph, so they stay together.
        let chars = vec![
            make_char("山", 10.0, 100.0, 20.0, 110.0),
            make_char("田", 24.0, 100.0, 34.0, 110.0),
        ];
        let words = WordExtractor::extract(&chars, &WordOptions::default());
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "山田");
    }

    #[test]
    fn test_jittered_baseline_keeps_reading_order() {
        // "B" sits 0.5pt higher than "A" but belongs to the same line.
        let chars = vec![
            make_char("A", 10.0, 100.0, 18.0, 112.0),
            make_char("B", 18.0, 99.5, 26.0, 111.5),
        ];
        let words = WordExtractor::extract(&chars, &WordOptions::default());
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "AB");
    }
}
