//! ZIP bundle output: merged workbook, uploaded PDFs and the layout report.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::MergeError;
use crate::report::MergeReport;
use crate::upload::UploadedFile;

pub const BUNDLE_FILE_NAME: &str = "Processed_Result.zip";
pub const WORKBOOK_FILE_NAME: &str = "Processed_Result.xlsm";
pub const REPORT_FILE_NAME: &str = "report.json";

/// Return `name`, or `stem_2.ext`, `stem_3.ext`, … when already used.
fn unique_file_name(name: &str, used: &mut HashSet<String>) -> String {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{ext}")),
        _ => (name, String::new()),
    };
    let mut candidate = name.to_string();
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        candidate = format!("{stem}_{n}{ext}");
        n += 1;
    }
    candidate
}

/// Build the bundle archive.
pub fn write_bundle(
    workbook: &[u8],
    pdfs: &[UploadedFile],
    report: &MergeReport,
) -> Result<Vec<u8>, MergeError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used: HashSet<String> = [WORKBOOK_FILE_NAME, REPORT_FILE_NAME]
        .iter()
        .map(|n| n.to_lowercase())
        .collect();

    writer.start_file(WORKBOOK_FILE_NAME, options)?;
    writer.write_all(workbook)?;

    for pdf in pdfs {
        let name = unique_file_name(&pdf.safe_name(), &mut used);
        writer.start_file(name, options)?;
        writer.write_all(&pdf.bytes)?;
    }

    writer.start_file(REPORT_FILE_NAME, options)?;
    writer.write_all(report.to_json()?.as_bytes())?;

    Ok(writer.finish()?.into_inner())
}
