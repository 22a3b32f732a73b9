//! PDF parsing backend trait.

use sheetmerge_core::{BBox, PdfError};

use crate::handler::ContentHandler;

/// Abstracts PDF parsing so the rest of the workspace never touches lopdf.
///
/// ```ignore
/// let doc = LopdfBackend::open(pdf_bytes)?;
/// for index in 0..LopdfBackend::page_count(&doc) {
///     let page = LopdfBackend::get_page(&doc, index)?;
///     let media_box = LopdfBackend::page_media_box(&doc, &page)?;
///     LopdfBackend::interpret_page(&doc, &page, &mut handler)?;
/// }
/// ```
pub trait PdfBackend {
    type Document;
    type Page;
    type Error: std::error::Error + Into<PdfError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Fails when the bytes are not a PDF or the document is encrypted.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    fn page_count(doc: &Self::Document) -> usize;

    /// Access a page by 0-based index.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error>;

    /// The page MediaBox as raw PDF coordinates `[x0 y0 x1 y1]`, normalized
    /// so that `x0 <= x1` and `top <= bottom` (here `top` holds the lower y).
    ///
    /// # Errors
    ///
    /// Fails when neither the page nor its ancestors define a MediaBox.
    fn page_media_box(doc: &Self::Document, page: &Self::Page) -> Result<BBox, Self::Error>;

    /// Run the page's content stream, reporting glyphs and paths to `handler`.
    ///
    /// # Errors
    ///
    /// Fails when the content stream cannot be read or tokenized.
    fn interpret_page(
        doc: &Self::Document,
        page: &Self::Page,
        handler: &mut dyn ContentHandler,
    ) -> Result<(), Self::Error>;
}
