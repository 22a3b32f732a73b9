//! Table layout reconstruction from word bounding boxes.
//!
//! Rebuilds a row/column grid for one page without relying on the PDF's
//! (usually absent) table structure:
//!
//! 1. [`group_lines`] clusters words into visual text lines by `top`.
//! 2. [`detect_column_boundaries`] derives vertical cut points from
//!    near-vertical ruling lines plus the outer word extents.
//! 3. [`split_row`] assigns each word of a line to the interval that
//!    contains its horizontal midpoint.
//! 4. [`prune_empty_columns`] drops columns that are blank on every row.
//!
//! [`reconstruct_page`] runs the whole pipeline and attaches a
//! [`LayoutConfidence`] so callers can tell a ruled table from a page that
//! fell back to word extents only.

use crate::shapes::RulingLine;
use crate::unicode_norm::UnicodeNorm;
use crate::words::Word;

/// Tunables for layout reconstruction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LayoutSettings {
    /// Maximum `top` difference from a line's first word for another word to
    /// join that line.
    pub y_tolerance: f64,
    /// Boundaries closer than this to the previously kept boundary are
    /// merged away.
    pub min_column_gap: f64,
    /// A ruling line counts as vertical when `|x1 - x0|` is below this.
    pub vertical_line_tolerance: f64,
    /// Pages whose confidence score is below this are reported as low
    /// confidence.
    pub min_confidence: f64,
    /// Normalization applied to each cell's text.
    pub normalization: UnicodeNorm,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            y_tolerance: 5.0,
            min_column_gap: 20.0,
            vertical_line_tolerance: 2.0,
            min_confidence: 0.5,
            normalization: UnicodeNorm::None,
        }
    }
}

/// Where a column boundary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BoundarySource {
    /// Midpoint of a near-vertical ruling line.
    RulingLine,
    /// Leftmost `x0` or rightmost `x1` of the page's words.
    WordExtent,
}

/// One horizontal cut point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnBoundary {
    pub x: f64,
    pub source: BoundarySource,
}

/// How much of a page's column split is backed by drawn ruling lines.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutConfidence {
    /// Kept boundaries that came from ruling lines.
    pub ruling_boundaries: usize,
    /// Kept boundaries that came from word extents.
    pub extent_boundaries: usize,
    /// `ruling / (ruling + extent)`, 0.0 when there are no boundaries.
    pub score: f64,
}

impl LayoutConfidence {
    pub fn from_boundaries(boundaries: &[ColumnBoundary]) -> Self {
        let ruling_boundaries = boundaries
            .iter()
            .filter(|b| b.source == BoundarySource::RulingLine)
            .count();
        let extent_boundaries = boundaries.len() - ruling_boundaries;
        let score = if boundaries.is_empty() {
            0.0
        } else {
            ruling_boundaries as f64 / boundaries.len() as f64
        };
        Self {
            ruling_boundaries,
            extent_boundaries,
            score,
        }
    }

    pub fn is_low(&self, threshold: f64) -> bool {
        self.score < threshold
    }
}

/// The reconstructed grid for one PDF page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageTable {
    /// 1-based page number.
    pub page_number: usize,
    /// Boundaries used for the split (before pruning).
    pub boundaries: Vec<ColumnBoundary>,
    /// Rows after empty-column pruning; all rows have the same length.
    pub rows: Vec<Vec<String>>,
    pub confidence: LayoutConfidence,
}

impl PageTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// True when no row holds any non-blank cell.
    pub fn is_blank(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(|cell| cell.trim().is_empty()))
    }
}

/// Cluster words into visual lines.
///
/// Words are sorted by `top`; a new group starts whenever a word's `top`
/// differs from the current group's anchor (its first word) by more than
/// `y_tolerance`. Each group is returned ordered left-to-right by `x0`.
pub fn group_lines(words: &[Word], y_tolerance: f64) -> Vec<Vec<&Word>> {
    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| a.top().total_cmp(&b.top()));

    let mut groups: Vec<Vec<&Word>> = Vec::new();
    for word in sorted {
        match groups.last_mut() {
            Some(group) if (word.top() - group[0].top()).abs() <= y_tolerance => {
                group.push(word);
            }
            _ => groups.push(vec![word]),
        }
    }

    for group in &mut groups {
        // Stable, so the anchor stays first among equal x0.
        group.sort_by(|a, b| a.x0().total_cmp(&b.x0()));
    }
    groups
}

/// Derive column boundaries for a page.
///
/// Candidates are the midpoints of near-vertical ruling lines plus the
/// leftmost word `x0` and rightmost word `x1`. After sorting (a ruling line
/// wins an exact tie with a word extent) each candidate is kept only if it
/// lies at least `min_column_gap` right of the last kept boundary.
/// Returns an empty list when there are no words.
pub fn detect_column_boundaries(
    lines: &[RulingLine],
    words: &[Word],
    settings: &LayoutSettings,
) -> Vec<ColumnBoundary> {
    if words.is_empty() {
        return Vec::new();
    }

    let left = words.iter().map(Word::x0).fold(f64::INFINITY, f64::min);
    let right = words.iter().map(Word::x1).fold(f64::NEG_INFINITY, f64::max);

    let mut candidates: Vec<ColumnBoundary> = lines
        .iter()
        .filter(|line| line.is_near_vertical(settings.vertical_line_tolerance))
        .map(|line| ColumnBoundary {
            x: line.center_x(),
            source: BoundarySource::RulingLine,
        })
        .collect();
    candidates.push(ColumnBoundary {
        x: left,
        source: BoundarySource::WordExtent,
    });
    candidates.push(ColumnBoundary {
        x: right,
        source: BoundarySource::WordExtent,
    });

    candidates.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.source.cmp(&b.source)));
    candidates.dedup_by(|next, kept| next.x == kept.x);

    let mut merged: Vec<ColumnBoundary> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match merged.last() {
            Some(last) if candidate.x - last.x < settings.min_column_gap => {}
            _ => merged.push(candidate),
        }
    }

    tracing::trace!(
        boundaries = ?merged.iter().map(|b| b.x).collect::<Vec<_>>(),
        "column boundaries"
    );
    merged
}

/// Split one line group into cells, one per boundary interval.
///
/// A word belongs to interval `i` when its midpoint lies in
/// `[boundaries[i], boundaries[i + 1])`; the first matching interval wins.
/// The last interval is open on the right so that words past a merged-away
/// right edge are not lost, and a single boundary yields a single column.
pub fn split_row(group: &[&Word], boundaries: &[ColumnBoundary]) -> Vec<String> {
    let column_count = match boundaries.len() {
        0 => return Vec::new(),
        1 => 1,
        n => n - 1,
    };

    let mut cells: Vec<Vec<&str>> = vec![Vec::new(); column_count];
    for word in group {
        let mid = word.center_x();
        let column = (0..column_count).find(|&i| {
            let left = boundaries[i].x;
            let right = if i + 1 == column_count {
                f64::INFINITY
            } else {
                boundaries[i + 1].x
            };
            mid >= left && mid < right
        });
        if let Some(column) = column {
            cells[column].push(word.text.as_str());
        }
    }

    cells.into_iter().map(|texts| texts.join(" ")).collect()
}

/// Drop columns that are blank in every row.
///
/// Rows shorter than the widest row are padded with empty strings, so every
/// returned row has the same length.
pub fn prune_empty_columns(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let keep: Vec<usize> = (0..width)
        .filter(|&col| {
            rows.iter()
                .any(|row| row.get(col).is_some_and(|cell| !cell.trim().is_empty()))
        })
        .collect();

    rows.into_iter()
        .map(|mut row| {
            keep.iter()
                .map(|&col| row.get_mut(col).map(std::mem::take).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Reconstruct the table for one page.
pub fn reconstruct_page(
    page_number: usize,
    words: &[Word],
    lines: &[RulingLine],
    settings: &LayoutSettings,
) -> PageTable {
    let boundaries = detect_column_boundaries(lines, words, settings);
    let rows: Vec<Vec<String>> = group_lines(words, settings.y_tolerance)
        .iter()
        .map(|group| {
            split_row(group, &boundaries)
                .into_iter()
                .map(|cell| settings.normalization.apply(&cell).into_owned())
                .collect()
        })
        .collect();
    let rows = prune_empty_columns(rows);
    let confidence = LayoutConfidence::from_boundaries(&boundaries);

    tracing::debug!(
        page = page_number,
        words = words.len(),
        rows = rows.len(),
        columns = rows.first().map_or(0, Vec::len),
        score = confidence.score,
        "reconstructed page table"
    );

    PageTable {
        page_number,
        boundaries,
        rows,
        confidence,
    }
}
