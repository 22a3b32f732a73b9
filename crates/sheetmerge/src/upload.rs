//! Uploaded files: extension allow-lists and safe file names.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::MergeError;

/// Spreadsheet extensions accepted for the primary upload.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm"];

/// Extensions accepted for PDF uploads.
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Name used when sanitizing leaves nothing behind.
const FALLBACK_STEM: &str = "upload";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"));

/// A file received from the client.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// The name as sent by the client.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Check the file name against `allowed` extensions.
    ///
    /// # Errors
    ///
    /// [`MergeError::EmptyFileName`] for a blank name,
    /// [`MergeError::UnsupportedFileType`] when the extension is not allowed.
    pub fn validate(&self, allowed: &[&str]) -> Result<(), MergeError> {
        if self.filename.trim().is_empty() {
            return Err(MergeError::EmptyFileName);
        }
        if !has_allowed_extension(&self.filename, allowed) {
            return Err(MergeError::UnsupportedFileType {
                filename: self.filename.clone(),
            });
        }
        Ok(())
    }

    /// [`secure_filename`] of the client-supplied name.
    pub fn safe_name(&self) -> String {
        secure_filename(&self.filename)
    }
}

/// Lower-cased text after the last `.`, if any.
pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether `filename` ends in one of `allowed` (case-insensitive).
pub fn has_allowed_extension(filename: &str, allowed: &[&str]) -> bool {
    extension(filename).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

/// Reduce a client-supplied file name to a safe ASCII name.
///
/// Decomposes to NFKD and drops non-ASCII, turns path separators and runs of
/// whitespace into `_`, removes everything outside `[A-Za-z0-9_.-]` and trims
/// leading/trailing `.` and `_`. A name whose stem has nothing left (such as
/// an all-Japanese name) becomes `upload`, keeping the extension.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename.nfkd().filter(char::is_ascii).collect();
    let (stem, ext) = match ascii.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric()) => {
            (stem, Some(ext))
        }
        _ => (ascii.as_str(), None),
    };

    let stem = sanitize(stem);
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem.as_str() };
    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}

fn sanitize(name: &str) -> String {
    let joined = name
        .replace(['/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    UNSAFE_CHARS
        .replace_all(&joined, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_checks_are_case_insensitive() {
        assert!(has_allowed_extension("Book1.XLSM", SPREADSHEET_EXTENSIONS));
        assert!(has_allowed_extension("a.b.xls", SPREADSHEET_EXTENSIONS));
        assert!(!has_allowed_extension("report.csv", SPREADSHEET_EXTENSIONS));
        assert!(!has_allowed_extension("xlsx", SPREADSHEET_EXTENSIONS));
        assert!(has_allowed_extension("scan.PDF", PDF_EXTENSIONS));
    }

    #[test]
    fn validate_reports_empty_and_bad_names() {
        let empty = UploadedFile::new("", b"x".to_vec());
        assert!(matches!(
            empty.validate(SPREADSHEET_EXTENSIONS),
            Err(MergeError::EmptyFileName)
        ));
        let bad = UploadedFile::new("notes.txt", b"x".to_vec());
        assert!(matches!(
            bad.validate(SPREADSHEET_EXTENSIONS),
            Err(MergeError::UnsupportedFileType { .. })
        ));
        let good = UploadedFile::new("book.xlsx", b"x".to_vec());
        assert!(good.validate(SPREADSHEET_EXTENSIONS).is_ok());
    }

    #[test]
    fn secure_filename_strips_paths_and_spaces() {
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename(r"C:\Users\taro\doc.pdf"), "C_Users_taro_doc.pdf");
        assert_eq!(secure_filename("résumé.pdf"), "resume.pdf");
    }

    #[test]
    fn secure_filename_falls_back_for_non_ascii_names() {
        assert_eq!(secure_filename("名簿.pdf"), "upload.pdf");
        assert_eq!(secure_filename("名簿"), "upload");
        assert_eq!(secure_filename("..."), "upload");
    }
}
