//! Content handler callback trait.
//!
//! The interpreter reports every shown glyph and every painted path to a
//! [`ContentHandler`]; implementors keep whatever they need.

use sheetmerge_core::Matrix;

use crate::path::PathSegment;

/// How a path was painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOp {
    Stroke,
    Fill,
    FillAndStroke,
}

/// One rendered glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct CharEvent {
    /// Raw character code from the shown string.
    pub char_code: u32,
    /// Decoded Unicode text.
    pub unicode: String,
    /// Base font name.
    pub font_name: String,
    /// Font size from `Tf`.
    pub font_size: f64,
    /// Text rendering matrix at the glyph origin (glyph space → page space).
    pub rendering_matrix: Matrix,
    /// Glyph width in glyph space units (1/1000 em), excluding spacing.
    pub width: f64,
    /// Font ascent in glyph space units.
    pub ascent: f64,
    /// Font descent in glyph space units (negative below the baseline).
    pub descent: f64,
}

/// A painted path, already transformed into page space.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEvent {
    pub segments: Vec<PathSegment>,
    pub paint_op: PaintOp,
    pub line_width: f64,
}

/// Callback handler for content stream interpretation.
///
/// Both methods default to no-ops so handlers subscribe only to what they use.
pub trait ContentHandler {
    fn on_char(&mut self, _event: CharEvent) {}

    fn on_path_painted(&mut self, _event: PathEvent) {}
}
