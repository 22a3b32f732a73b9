//! Reading uploaded spreadsheets and writing into the template workbook.
//!
//! Uploads are read with `calamine`, which understands `xls`, `xlsx` and
//! `xlsm`. The template is edited with `umya-spreadsheet` so its styles,
//! defined names and sheets survive the round trip.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use sheetmerge_core::PageTable;
use umya_spreadsheet::{Border, Spreadsheet};

use crate::error::{MergeError, WorkbookRole};
use crate::upload::UploadedFile;

/// Default width of columns that receive page table cells.
pub const DEFAULT_COLUMN_WIDTH: f64 = 20.0;

/// A typed cell value copied from an uploaded sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

/// A non-empty cell at a 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    pub row: u32,
    pub column: u32,
    pub value: CellValue,
}

/// The used cells of one uploaded sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub cells: Vec<SheetCell>,
}

fn cell_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::String(s) => Some(CellValue::Text(s.clone())),
        // Dates stay serial numbers.
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(_) | Data::Empty => None,
    }
}

/// Read every sheet of an uploaded spreadsheet.
///
/// # Errors
///
/// [`MergeError::Spreadsheet`] when the bytes are not a readable workbook and
/// [`MergeError::EmptyWorkbook`] when it has no sheets.
pub fn read_spreadsheet(file: &UploadedFile) -> Result<Vec<SheetData>, MergeError> {
    let unreadable = |message: String| MergeError::Spreadsheet {
        filename: file.filename.clone(),
        message,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(&file.bytes))
        .map_err(|e| unreadable(e.to_string()))?;
    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(MergeError::EmptyWorkbook(WorkbookRole::Upload));
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| unreadable(format!("sheet {name}: {e}")))?;
        let (row0, col0) = range.start().unwrap_or((0, 0));
        let cells = range
            .cells()
            .filter_map(|(r, c, data)| {
                cell_value(data).map(|value| SheetCell {
                    row: row0 + r as u32 + 1,
                    column: col0 + c as u32 + 1,
                    value,
                })
            })
            .collect();
        sheets.push(SheetData { name, cells });
    }
    Ok(sheets)
}

/// Pick a sheet name not yet used, comparing case-insensitively.
///
/// Returns `base` when it is free, otherwise `base_2`, `base_3`, ….
pub fn unique_sheet_name(base: &str, existing: &[String]) -> String {
    let taken = |candidate: &str| {
        let lower = candidate.to_lowercase();
        existing.iter().any(|name| name.to_lowercase() == lower)
    };
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Spreadsheet column letters for a 1-based index (`1` → `A`, `27` → `AA`).
pub fn column_letter(mut index: u32) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push(b'A' + rem as u8);
        index = (index - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// The macro-enabled template being filled for one request.
pub struct TemplateWorkbook {
    book: Spreadsheet,
}

impl std::fmt::Debug for TemplateWorkbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateWorkbook")
            .field("sheets", &self.sheet_names())
            .finish()
    }
}

impl TemplateWorkbook {
    /// Read a template from its bytes.
    ///
    /// # Errors
    ///
    /// [`MergeError::Template`] for unreadable bytes and
    /// [`MergeError::EmptyWorkbook`] when the template has no sheets.
    pub fn read(bytes: &[u8]) -> Result<Self, MergeError> {
        let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
            .map_err(|e| MergeError::Template(e.to_string()))?;
        if book.get_sheet_collection().is_empty() {
            return Err(MergeError::EmptyWorkbook(WorkbookRole::Template));
        }
        Ok(Self { book })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    fn find_sheet_name(&self, name: &str) -> Option<String> {
        let lower = name.to_lowercase();
        self.sheet_names()
            .into_iter()
            .find(|existing| existing.to_lowercase() == lower)
    }

    fn new_sheet(&mut self, name: &str) -> Result<&mut umya_spreadsheet::Worksheet, MergeError> {
        self.book
            .new_sheet(name)
            .map_err(|e| MergeError::Template(format!("cannot add sheet {name}: {e}")))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut umya_spreadsheet::Worksheet, MergeError> {
        self.book
            .get_sheet_by_name_mut(name)
            .ok_or_else(|| MergeError::Template(format!("sheet {name} disappeared")))
    }

    /// Write an uploaded sheet into the template sheet of the same name
    /// (case-insensitive), appending a new sheet when there is none.
    ///
    /// Returns the name of the sheet written to.
    pub fn copy_sheet(&mut self, sheet: &SheetData) -> Result<String, MergeError> {
        let target = match self.find_sheet_name(&sheet.name) {
            Some(existing) => existing,
            None => {
                self.new_sheet(&sheet.name)?;
                sheet.name.clone()
            }
        };

        let ws = self.sheet_mut(&target)?;
        for cell in &sheet.cells {
            let dest = ws.get_cell_mut((cell.column, cell.row));
            match &cell.value {
                CellValue::Number(n) => {
                    dest.set_value_number(*n);
                }
                CellValue::Bool(b) => {
                    dest.set_value_bool(*b);
                }
                CellValue::Text(s) => {
                    dest.set_value_string(s.clone());
                }
            }
        }
        tracing::debug!(sheet = %target, cells = sheet.cells.len(), "copied uploaded sheet");
        Ok(target)
    }

    /// Add a sheet holding one page table.
    ///
    /// Every grid cell gets a thin border on all sides and every used column
    /// is set to `column_width`. Returns the (deduplicated) sheet name.
    pub fn add_table_sheet(
        &mut self,
        base_name: &str,
        table: &PageTable,
        column_width: f64,
    ) -> Result<String, MergeError> {
        let name = unique_sheet_name(base_name, &self.sheet_names());
        let ws = self.new_sheet(&name)?;

        for (r, row) in table.rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                let coordinate = (c as u32 + 1, r as u32 + 1);
                if !text.is_empty() {
                    ws.get_cell_mut(coordinate).set_value_string(text.clone());
                }
                let borders = ws.get_style_mut(coordinate).get_borders_mut();
                borders.get_left_mut().set_border_style(Border::BORDER_THIN);
                borders.get_right_mut().set_border_style(Border::BORDER_THIN);
                borders.get_top_mut().set_border_style(Border::BORDER_THIN);
                borders.get_bottom_mut().set_border_style(Border::BORDER_THIN);
            }
        }
        for c in 1..=table.column_count() as u32 {
            ws.get_column_dimension_mut(&column_letter(c))
                .set_width(column_width);
        }
        Ok(name)
    }

    /// Add a sheet with `text` in `A1`.
    pub fn add_text_sheet(&mut self, base_name: &str, text: &str) -> Result<String, MergeError> {
        let name = unique_sheet_name(base_name, &self.sheet_names());
        self.new_sheet(&name)?
            .get_cell_mut((1u32, 1u32))
            .set_value_string(text);
        Ok(name)
    }

    /// Serialize the workbook.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MergeError> {
        let mut cursor = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, &mut cursor)
            .map_err(|e| MergeError::Template(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetmerge_core::LayoutConfidence;

    fn sample_template() -> Vec<u8> {
        let mut book = umya_spreadsheet::new_file();
        book.get_sheet_by_name_mut("Sheet1")
            .unwrap()
            .get_cell_mut("A1")
            .set_value_string("template");
        let mut cursor = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut cursor).unwrap();
        cursor.into_inner()
    }

    fn table(rows: &[&[&str]]) -> PageTable {
        PageTable {
            page_number: 1,
            boundaries: Vec::new(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            confidence: LayoutConfidence::default(),
        }
    }

    #[test]
    fn unique_names_are_case_insensitive() {
        let existing = vec!["Sheet1".to_string(), "page1".to_string(), "Page1_2".to_string()];
        assert_eq!(unique_sheet_name("Page2", &existing), "Page2");
        assert_eq!(unique_sheet_name("Page1", &existing), "Page1_3");
        assert_eq!(unique_sheet_name("SHEET1", &existing), "SHEET1_2");
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(703), "AAA");
    }

    fn zip_entry(bytes: &[u8], name: &str) -> String {
        use std::io::Read;
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn table_sheet_gets_borders_and_widths() {
        let mut wb = TemplateWorkbook::read(&sample_template()).unwrap();
        let name = wb
            .add_table_sheet("Page1", &table(&[&["Name", "Taro"], &["Role", ""]]), 20.0)
            .unwrap();
        assert_eq!(name, "Page1");
        assert_eq!(wb.sheet_names(), ["Sheet1", "Page1"]);

        let ws = wb.book.get_sheet_by_name("Page1").unwrap();
        assert_eq!(ws.get_value((2u32, 1u32)), "Taro");
        assert_eq!(ws.get_value((2u32, 2u32)), "");

        let bytes = wb.to_bytes().unwrap();
        let styles = zip_entry(&bytes, "xl/styles.xml");
        assert!(styles.contains(r#"<left style="thin""#), "{styles}");
        let sheet = zip_entry(&bytes, "xl/worksheets/sheet2.xml");
        assert!(sheet.contains(r#"width="20""#), "{sheet}");
    }

    #[test]
    fn copy_into_existing_and_new_sheets() {
        let mut wb = TemplateWorkbook::read(&sample_template()).unwrap();
        let into_existing = wb
            .copy_sheet(&SheetData {
                name: "sheet1".into(),
                cells: vec![SheetCell {
                    row: 2,
                    column: 1,
                    value: CellValue::Number(42.0),
                }],
            })
            .unwrap();
        assert_eq!(into_existing, "Sheet1");

        let appended = wb
            .copy_sheet(&SheetData {
                name: "名簿".into(),
                cells: vec![SheetCell {
                    row: 1,
                    column: 1,
                    value: CellValue::Text("山田".into()),
                }],
            })
            .unwrap();
        assert_eq!(appended, "名簿");

        let bytes = wb.to_bytes().unwrap();
        let reread = TemplateWorkbook::read(&bytes).unwrap();
        let ws = reread.book.get_sheet_by_name("Sheet1").unwrap();
        assert_eq!(ws.get_value("A1"), "template");
        assert_eq!(ws.get_value("A2"), "42");
        assert_eq!(reread.book.get_sheet_by_name("名簿").unwrap().get_value("A1"), "山田");
    }

    #[test]
    fn garbage_template_is_rejected() {
        assert!(matches!(
            TemplateWorkbook::read(b"not a zip"),
            Err(MergeError::Template(_))
        ));
    }
}
