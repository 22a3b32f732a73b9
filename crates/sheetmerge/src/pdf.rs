//! PDF documents opened for table reconstruction.

use sheetmerge_core::{
    Char, LayoutSettings, PageTable, PdfError, RulingLine, Word, WordExtractor, WordOptions,
    reconstruct_page,
};
use sheetmerge_parse::{
    CharEvent, ContentHandler, LopdfBackend, LopdfDocument, PathEvent, PdfBackend,
    char_from_event,
};

/// Words and ruling lines of one page, in top-left page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    pub width: f64,
    pub height: f64,
    pub words: Vec<Word>,
    pub lines: Vec<RulingLine>,
}

impl PageContent {
    /// Run layout reconstruction on this page.
    pub fn table(&self, settings: &LayoutSettings) -> PageTable {
        reconstruct_page(self.page_number, &self.words, &self.lines, settings)
    }
}

/// Iterator over pages, interpreting each one on demand.
pub struct PagesIter<'a> {
    pdf: &'a PdfDocument,
    current: usize,
    count: usize,
}

impl Iterator for PagesIter<'_> {
    type Item = Result<PageContent, PdfError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.count {
            return None;
        }
        let result = self.pdf.page(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PagesIter<'_> {}

struct CollectingHandler {
    page_top: f64,
    chars: Vec<Char>,
    lines: Vec<RulingLine>,
}

impl ContentHandler for CollectingHandler {
    fn on_char(&mut self, event: CharEvent) {
        self.chars.push(char_from_event(&event, self.page_top));
    }

    fn on_path_painted(&mut self, event: PathEvent) {
        let page_top = self.page_top;
        self.lines.extend(
            event
                .segments
                .iter()
                .map(|segment| segment.to_ruling_line(page_top, event.line_width)),
        );
    }
}

/// A parsed PDF.
///
/// # Example
///
/// ```ignore
/// let pdf = PdfDocument::open(&bytes)?;
/// for table in pdf.page_tables(&LayoutSettings::default())? {
///     println!("page {}: {} rows", table.page_number, table.row_count());
/// }
/// ```
pub struct PdfDocument {
    doc: LopdfDocument,
    word_options: WordOptions,
}

impl PdfDocument {
    /// Open a PDF from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PasswordRequired`] for encrypted files and
    /// [`PdfError::ParseError`] when the bytes are not a readable PDF.
    pub fn open(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = LopdfBackend::open(bytes).map_err(PdfError::from)?;
        Ok(Self {
            doc,
            word_options: WordOptions::default(),
        })
    }

    /// Replace the word grouping tolerances.
    pub fn with_word_options(mut self, options: WordOptions) -> Self {
        self.word_options = options;
        self
    }

    pub fn page_count(&self) -> usize {
        LopdfBackend::page_count(&self.doc)
    }

    /// Interpret the page at 0-based `index`.
    pub fn page(&self, index: usize) -> Result<PageContent, PdfError> {
        let page = LopdfBackend::get_page(&self.doc, index).map_err(PdfError::from)?;
        let media_box = LopdfBackend::page_media_box(&self.doc, &page).map_err(PdfError::from)?;

        // The MediaBox comes back in PDF space, so its `bottom` is the page top.
        let mut handler = CollectingHandler {
            page_top: media_box.bottom,
            chars: Vec::new(),
            lines: Vec::new(),
        };
        LopdfBackend::interpret_page(&self.doc, &page, &mut handler).map_err(PdfError::from)?;

        let words = WordExtractor::extract(&handler.chars, &self.word_options);
        tracing::debug!(
            page = index + 1,
            chars = handler.chars.len(),
            words = words.len(),
            lines = handler.lines.len(),
            "interpreted page"
        );

        Ok(PageContent {
            page_number: index + 1,
            width: media_box.width(),
            height: media_box.height(),
            words,
            lines: handler.lines,
        })
    }

    pub fn pages_iter(&self) -> PagesIter<'_> {
        PagesIter {
            pdf: self,
            current: 0,
            count: self.page_count(),
        }
    }

    /// Reconstruct a table for every page, in page order.
    pub fn page_tables(&self, settings: &LayoutSettings) -> Result<Vec<PageTable>, PdfError> {
        self.pages_iter()
            .map(|page| page.map(|p| p.table(settings)))
            .collect()
    }
}
