//! sheetmerge: merge an uploaded spreadsheet and PDF page tables into a
//! macro-enabled workbook template.
//!
//! This is the public API facade crate. It re-exports types from
//! sheetmerge-core and uses sheetmerge-parse for PDF reading.
//!
//! # Architecture
//!
//! - **sheetmerge-core**: geometry, words and the layout reconstruction heuristic
//! - **sheetmerge-parse**: PDF parsing and content stream interpretation
//! - **sheetmerge** (this crate): PDF → page tables, workbook merge, macro
//!   passthrough and ZIP bundles
//!
//! # Example
//!
//! ```ignore
//! use sheetmerge::{MergeOptions, UploadedFile, merge_with_template_file};
//!
//! let excel = UploadedFile::new("input.xlsx", std::fs::read("input.xlsx")?);
//! let pdf = UploadedFile::new("scan.pdf", std::fs::read("scan.pdf")?);
//! let out = merge_with_template_file(
//!     "template.xlsm".as_ref(),
//!     &excel,
//!     &[pdf],
//!     &MergeOptions::default(),
//! )?;
//! std::fs::write(out.file_name, &out.bytes)?;
//! ```

pub mod bundle;
mod error;
pub mod macros;
mod merge;
mod pdf;
mod report;
pub mod upload;
pub mod workbook;

pub use error::{MergeError, WorkbookRole};
pub use merge::{
    DEFAULT_PLACEHOLDER, MergeOptions, MergeOutput, OutputFormat, PAGE_SHEET_PREFIX,
    XLSM_CONTENT_TYPE, ZIP_CONTENT_TYPE, merge, merge_with_template_file,
};
pub use pdf::{PageContent, PagesIter, PdfDocument};
pub use report::{MergeReport, PageReport, PdfReport};
pub use upload::{PDF_EXTENSIONS, SPREADSHEET_EXTENSIONS, UploadedFile, secure_filename};

pub use sheetmerge_core;
pub use sheetmerge_core::{
    BoundarySource, ColumnBoundary, LayoutConfidence, LayoutSettings, PageTable, PdfError,
    UnicodeNorm, WordOptions,
};
pub use sheetmerge_parse;
