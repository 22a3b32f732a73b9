//! sheetmerge-core: Backend-independent data types and algorithms.
//!
//! This crate provides the foundational types (BBox, Char, Word, RulingLine)
//! and the layout reconstruction heuristic that turns a page's words and
//! ruling lines into a grid of rows and columns. It does not know how PDFs
//! are parsed or how spreadsheets are written.

pub mod error;
pub mod geometry;
pub mod layout;
pub mod shapes;
pub mod text;
pub mod unicode_norm;
pub mod words;

pub use error::PdfError;
pub use geometry::{BBox, Matrix, Point};
pub use layout::{
    BoundarySource, ColumnBoundary, LayoutConfidence, LayoutSettings, PageTable,
    detect_column_boundaries, group_lines, prune_empty_columns, reconstruct_page, split_row,
};
pub use shapes::{LineOrientation, RulingLine};
pub use text::{Char, is_cjk, is_cjk_text};
pub use unicode_norm::UnicodeNorm;
pub use words::{Word, WordExtractor, WordOptions};
