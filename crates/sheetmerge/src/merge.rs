//! The merge pipeline for one request.
//!
//! 1. Validate the uploads' file names.
//! 2. Read the uploaded spreadsheet and the template.
//! 3. Copy uploaded sheets into the template.
//! 4. Reconstruct a table per PDF page and add each non-blank page as a sheet.
//! 5. Serialize, restore the template's macro parts and optionally bundle.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sheetmerge_core::LayoutSettings;

use crate::bundle::{BUNDLE_FILE_NAME, WORKBOOK_FILE_NAME, write_bundle};
use crate::error::MergeError;
use crate::macros::{extract_macro_parts, restore_macro_parts};
use crate::pdf::PdfDocument;
use crate::report::{MergeReport, PageReport, PdfReport};
use crate::upload::{PDF_EXTENSIONS, SPREADSHEET_EXTENSIONS, UploadedFile};
use crate::workbook::{DEFAULT_COLUMN_WIDTH, TemplateWorkbook, read_spreadsheet};

pub const XLSM_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.12";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Written to `A1` of a sheet for PDFs without extractable text.
pub const DEFAULT_PLACEHOLDER: &str = "テキストを抽出できませんでした";

/// Prefix of sheets created for PDF pages (`Page1`, `Page2`, …).
pub const PAGE_SHEET_PREFIX: &str = "Page";

/// What the merge returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The merged macro-enabled workbook.
    #[default]
    Xlsm,
    /// A ZIP of the workbook, the uploaded PDFs and `report.json`.
    Zip,
}

impl OutputFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            OutputFormat::Xlsm => WORKBOOK_FILE_NAME,
            OutputFormat::Zip => BUNDLE_FILE_NAME,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Xlsm => XLSM_CONTENT_TYPE,
            OutputFormat::Zip => ZIP_CONTENT_TYPE,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Xlsm => write!(f, "xlsm"),
            OutputFormat::Zip => write!(f, "zip"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsm" => Ok(OutputFormat::Xlsm),
            "zip" => Ok(OutputFormat::Zip),
            other => Err(format!("unknown output format: {other} (expected xlsm or zip)")),
        }
    }
}

/// Tunables for one merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    pub layout: LayoutSettings,
    /// Width applied to every column of a page table sheet.
    pub column_width: f64,
    pub placeholder: String,
    pub output: OutputFormat,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            layout: LayoutSettings::default(),
            column_width: DEFAULT_COLUMN_WIDTH,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            output: OutputFormat::default(),
        }
    }
}

/// The finished download.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub bytes: Vec<u8>,
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub report: MergeReport,
}

/// Merge `spreadsheet` and `pdfs` into the template at `path`.
///
/// The template is read from disk on every call.
///
/// # Errors
///
/// [`MergeError::TemplateNotFound`] when `path` does not exist, otherwise
/// as [`merge`].
pub fn merge_with_template_file(
    path: &Path,
    spreadsheet: &UploadedFile,
    pdfs: &[UploadedFile],
    options: &MergeOptions,
) -> Result<MergeOutput, MergeError> {
    validate_uploads(spreadsheet, pdfs)?;
    let template = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MergeError::TemplateNotFound(path.to_path_buf()),
        _ => MergeError::Io(e),
    })?;
    merge_validated(&template, spreadsheet, pdfs, options)
}

/// Merge `spreadsheet` and `pdfs` into `template`.
pub fn merge(
    template: &[u8],
    spreadsheet: &UploadedFile,
    pdfs: &[UploadedFile],
    options: &MergeOptions,
) -> Result<MergeOutput, MergeError> {
    validate_uploads(spreadsheet, pdfs)?;
    merge_validated(template, spreadsheet, pdfs, options)
}

fn validate_uploads(spreadsheet: &UploadedFile, pdfs: &[UploadedFile]) -> Result<(), MergeError> {
    spreadsheet.validate(SPREADSHEET_EXTENSIONS)?;
    pdfs.iter().try_for_each(|pdf| pdf.validate(PDF_EXTENSIONS))
}

fn merge_validated(
    template: &[u8],
    spreadsheet: &UploadedFile,
    pdfs: &[UploadedFile],
    options: &MergeOptions,
) -> Result<MergeOutput, MergeError> {
    let sheets = read_spreadsheet(spreadsheet)?;
    let mut workbook = TemplateWorkbook::read(template)?;
    let mut report = MergeReport::new(options.layout.clone());

    for sheet in &sheets {
        report.copied_sheets.push(workbook.copy_sheet(sheet)?);
    }

    for pdf in pdfs {
        let pdf_report = add_pdf(&mut workbook, pdf, options)?;
        report.pdfs.push(pdf_report);
    }

    let bytes = restore_macro_parts(workbook.to_bytes()?, &extract_macro_parts(template)?)?;
    let bytes = match options.output {
        OutputFormat::Xlsm => bytes,
        OutputFormat::Zip => write_bundle(&bytes, pdfs, &report)?,
    };

    tracing::info!(
        sheets = report.copied_sheets.len(),
        pdfs = report.pdfs.len(),
        output = %options.output,
        bytes = bytes.len(),
        "merge complete"
    );

    Ok(MergeOutput {
        bytes,
        file_name: options.output.file_name(),
        content_type: options.output.content_type(),
        report,
    })
}

fn add_pdf(
    workbook: &mut TemplateWorkbook,
    pdf: &UploadedFile,
    options: &MergeOptions,
) -> Result<PdfReport, MergeError> {
    let file_name = pdf.safe_name();
    let pdf_error = |source| MergeError::Pdf {
        filename: pdf.filename.clone(),
        source,
    };

    let doc = PdfDocument::open(&pdf.bytes).map_err(pdf_error)?;
    let tables = doc.page_tables(&options.layout).map_err(pdf_error)?;

    let mut pages = Vec::with_capacity(tables.len());
    for table in &tables {
        let sheet_name = if table.is_blank() {
            None
        } else {
            let base = format!("{PAGE_SHEET_PREFIX}{}", table.page_number);
            Some(workbook.add_table_sheet(&base, table, options.column_width)?)
        };
        let page = PageReport::new(table, sheet_name, options.layout.min_confidence);
        if page.low_confidence {
            tracing::warn!(
                file = %file_name,
                page = page.page_number,
                score = page.confidence.score,
                "column split is not backed by ruling lines"
            );
        }
        pages.push(page);
    }

    let placeholder_sheet = if pages.iter().all(|p| p.sheet_name.is_none()) {
        tracing::warn!(file = %file_name, "no extractable text, writing placeholder");
        let base = format!("{PAGE_SHEET_PREFIX}1");
        Some(workbook.add_text_sheet(&base, &options.placeholder)?)
    } else {
        None
    };

    Ok(PdfReport {
        file_name,
        page_count: tables.len(),
        pages,
        placeholder_sheet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parsing() {
        assert_eq!("ZIP".parse::<OutputFormat>(), Ok(OutputFormat::Zip));
        assert_eq!(" xlsm ".parse::<OutputFormat>(), Ok(OutputFormat::Xlsm));
        assert!("pdf".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Zip.to_string(), "zip");
    }

    #[test]
    fn output_format_names_and_types() {
        assert_eq!(OutputFormat::Xlsm.file_name(), "Processed_Result.xlsm");
        assert_eq!(OutputFormat::Zip.file_name(), "Processed_Result.zip");
        assert_eq!(
            OutputFormat::Xlsm.content_type(),
            "application/vnd.ms-excel.sheet.macroEnabled.12"
        );
    }

    #[test]
    fn default_options() {
        let options = MergeOptions::default();
        assert_eq!(options.column_width, 20.0);
        assert_eq!(options.placeholder, "テキストを抽出できませんでした");
        assert_eq!(options.output, OutputFormat::Xlsm);
    }

    #[test]
    fn missing_template_file() {
        let err = merge_with_template_file(
            Path::new("/nonexistent/template.xlsm"),
            &UploadedFile::new("a.xlsx", Vec::new()),
            &[],
            &MergeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::TemplateNotFound(_)));
    }

    #[test]
    fn uploads_are_validated_before_the_template_is_read() {
        let err = merge_with_template_file(
            Path::new("/nonexistent/template.xlsm"),
            &UploadedFile::new("notes.txt", Vec::new()),
            &[],
            &MergeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::UnsupportedFileType { .. }));
    }

    #[test]
    fn bad_extension_is_checked_before_reading() {
        let err = merge(
            b"",
            &UploadedFile::new("a.xlsx", Vec::new()),
            &[UploadedFile::new("scan.png", Vec::new())],
            &MergeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::UnsupportedFileType { ref filename } if filename == "scan.png"));
    }
}
