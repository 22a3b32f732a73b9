//! Per-request layout report, written as `report.json` in ZIP bundles.

use serde::Serialize;
use sheetmerge_core::{LayoutConfidence, LayoutSettings, PageTable};

/// What happened to one PDF page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub page_number: usize,
    /// Sheet the page table was written to; `None` for blank pages.
    pub sheet_name: Option<String>,
    pub rows: usize,
    pub columns: usize,
    pub confidence: LayoutConfidence,
    pub low_confidence: bool,
}

impl PageReport {
    pub fn new(table: &PageTable, sheet_name: Option<String>, min_confidence: f64) -> Self {
        Self {
            page_number: table.page_number,
            sheet_name,
            rows: table.row_count(),
            columns: table.column_count(),
            confidence: table.confidence,
            low_confidence: !table.is_blank() && table.confidence.is_low(min_confidence),
        }
    }
}

/// What happened to one uploaded PDF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfReport {
    /// Sanitized file name.
    pub file_name: String,
    pub page_count: usize,
    pub pages: Vec<PageReport>,
    /// Sheet holding the no-text placeholder, when the PDF had no words.
    pub placeholder_sheet: Option<String>,
}

/// Summary of one merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    /// Template sheets that received uploaded cells.
    pub copied_sheets: Vec<String>,
    pub pdfs: Vec<PdfReport>,
    pub settings: LayoutSettings,
}

impl MergeReport {
    pub fn new(settings: LayoutSettings) -> Self {
        Self {
            copied_sheets: Vec::new(),
            pdfs: Vec::new(),
            settings,
        }
    }

    /// Pages flagged as low confidence, as `(file name, page number)`.
    pub fn low_confidence_pages(&self) -> Vec<(&str, usize)> {
        self.pdfs
            .iter()
            .flat_map(|pdf| {
                pdf.pages
                    .iter()
                    .filter(|p| p.low_confidence)
                    .map(|p| (pdf.file_name.as_str(), p.page_number))
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetmerge_core::{BoundarySource, ColumnBoundary};

    fn table(rows: Vec<Vec<String>>, sources: &[BoundarySource]) -> PageTable {
        let boundaries: Vec<ColumnBoundary> = sources
            .iter()
            .enumerate()
            .map(|(i, &source)| ColumnBoundary {
                x: i as f64 * 100.0,
                source,
            })
            .collect();
        PageTable {
            page_number: 3,
            confidence: LayoutConfidence::from_boundaries(&boundaries),
            boundaries,
            rows,
        }
    }

    #[test]
    fn extent_only_page_is_low_confidence() {
        let t = table(
            vec![vec!["a".into()]],
            &[BoundarySource::WordExtent, BoundarySource::WordExtent],
        );
        let page = PageReport::new(&t, Some("Page3".into()), 0.5);
        assert!(page.low_confidence);
        assert_eq!((page.rows, page.columns), (1, 1));
    }

    #[test]
    fn blank_page_is_never_low_confidence() {
        let page = PageReport::new(&table(Vec::new(), &[]), None, 0.5);
        assert!(!page.low_confidence);
    }

    #[test]
    fn json_uses_snake_case_fields() {
        let mut report = MergeReport::new(LayoutSettings::default());
        let t = table(
            vec![vec!["a".into(), "b".into()]],
            &[
                BoundarySource::WordExtent,
                BoundarySource::RulingLine,
                BoundarySource::WordExtent,
            ],
        );
        report.pdfs.push(PdfReport {
            file_name: "a.pdf".into(),
            page_count: 3,
            pages: vec![PageReport::new(&t, Some("Page3".into()), 0.5)],
            placeholder_sheet: None,
        });

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let page = &value["pdfs"][0]["pages"][0];
        assert_eq!(page["sheet_name"], "Page3");
        assert_eq!(page["confidence"]["ruling_boundaries"], 1);
        assert_eq!(page["low_confidence"], true);
        assert_eq!(value["settings"]["min_column_gap"], 20.0);
        assert_eq!(report.low_confidence_pages(), [("a.pdf", 3)]);
    }
}
