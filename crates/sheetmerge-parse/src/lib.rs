//! sheetmerge-parse: PDF parsing backend and content stream interpreter.
//!
//! Opens PDF bytes through a pluggable [`PdfBackend`] (the default is
//! [`LopdfBackend`]), interprets page content streams and reports glyphs and
//! painted path segments to a [`ContentHandler`]. Font decoding covers
//! simple fonts, Type0/CID fonts, ToUnicode CMaps and the predefined CJK
//! encodings Japanese office software emits.

pub mod backend;
pub mod char_extraction;
pub mod cjk_encoding;
pub mod cmap;
pub mod error;
pub mod font;
pub mod handler;
mod interpreter;
pub mod lopdf_backend;
pub mod path;
pub mod simple_encoding;
pub mod standard_fonts;
pub mod text_state;
pub mod tokenizer;

pub use backend::PdfBackend;
pub use char_extraction::char_from_event;
pub use error::BackendError;
pub use handler::{CharEvent, ContentHandler, PaintOp, PathEvent};
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};
pub use path::PathSegment;
pub use sheetmerge_core;
