//! Error type for the merge pipeline.

use std::path::PathBuf;

use sheetmerge_core::PdfError;

/// Which workbook an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookRole {
    /// The spreadsheet uploaded with the request.
    Upload,
    /// The macro-enabled template read from disk.
    Template,
}

impl std::fmt::Display for WorkbookRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkbookRole::Upload => write!(f, "uploaded workbook"),
            WorkbookRole::Template => write!(f, "template workbook"),
        }
    }
}

/// Errors produced while merging uploads into the template.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// An uploaded file has an empty name.
    #[error("uploaded file has an empty name")]
    EmptyFileName,

    /// An uploaded file's extension is not in the allow-list.
    #[error("file type not allowed: {filename}")]
    UnsupportedFileType { filename: String },

    /// The template path does not exist.
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// A workbook has no sheets.
    #[error("{0} has no sheets")]
    EmptyWorkbook(WorkbookRole),

    /// The uploaded spreadsheet could not be read.
    #[error("failed to read spreadsheet {filename}: {message}")]
    Spreadsheet { filename: String, message: String },

    /// An uploaded PDF could not be parsed.
    #[error("failed to read PDF {filename}: {source}")]
    Pdf {
        filename: String,
        #[source]
        source: PdfError,
    },

    /// The template workbook could not be read or written.
    #[error("template workbook error: {0}")]
    Template(String),

    /// Reading or writing a ZIP container failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MergeError {
    /// True for errors caused by the uploaded files rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MergeError::EmptyFileName
                | MergeError::UnsupportedFileType { .. }
                | MergeError::EmptyWorkbook(_)
                | MergeError::Spreadsheet { .. }
                | MergeError::Pdf { .. }
        )
    }
}
