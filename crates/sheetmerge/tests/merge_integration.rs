//! End-to-end merge tests: template + spreadsheet + PDFs → xlsm / zip.
//!
//! Workbooks are created with umya-spreadsheet and PDFs with lopdf.

use std::io::{Cursor, Read};

use calamine::{Reader, open_workbook_auto_from_rs};
use lopdf::{Object, Stream, dictionary};
use sheetmerge::macros::{MacroPart, restore_macro_parts};
use sheetmerge::{MergeError, MergeOptions, OutputFormat, UploadedFile, merge};

const VBA_BYTES: &[u8] = b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1 fake vba project";

fn workbook_bytes(build: impl FnOnce(&mut umya_spreadsheet::Spreadsheet)) -> Vec<u8> {
    let mut book = umya_spreadsheet::new_file();
    build(&mut book);
    let mut cursor = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut cursor).unwrap();
    cursor.into_inner()
}

fn template() -> Vec<u8> {
    let plain = workbook_bytes(|book| {
        book.get_sheet_by_name_mut("Sheet1")
            .unwrap()
            .get_cell_mut("A1")
            .set_value_string("テンプレート");
    });
    restore_macro_parts(
        plain,
        &[MacroPart {
            name: "xl/vbaProject.bin".into(),
            bytes: VBA_BYTES.to_vec(),
        }],
    )
    .unwrap()
}

fn spreadsheet() -> UploadedFile {
    let bytes = workbook_bytes(|book| {
        let ws = book.get_sheet_by_name_mut("Sheet1").unwrap();
        ws.get_cell_mut("B2").set_value_string("氏名");
        ws.get_cell_mut("C3").set_value_number(3.5);
        book.new_sheet("Extra")
            .unwrap()
            .get_cell_mut("A1")
            .set_value_bool(true);
    });
    UploadedFile::new("入力.xlsx", bytes)
}

fn pdf(pages: &[&[u8]]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let kids: Vec<Object> = pages
        .iter()
        .map(|content| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            }))
        })
        .collect();
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

const TABLE_PAGE: &[u8] = b"BT /F1 10 Tf 20 700 Td (Name) Tj 200 0 Td (Taro) Tj ET \
    BT /F1 10 Tf 20 680 Td (Role) Tj 200 0 Td (Teacher) Tj ET \
    150 650 m 150 720 l S";

fn zip_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = Vec::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_end(&mut out)
        .unwrap();
    out
}

fn sheet_names(xlsm: &[u8]) -> Vec<String> {
    open_workbook_auto_from_rs(Cursor::new(xlsm))
        .unwrap()
        .sheet_names()
}

fn cell(xlsm: &[u8], sheet: &str, row: u32, col: u32) -> String {
    let mut wb = open_workbook_auto_from_rs(Cursor::new(xlsm)).unwrap();
    let range = wb.worksheet_range(sheet).unwrap();
    range
        .get_value((row, col))
        .map(ToString::to_string)
        .unwrap_or_default()
}

#[test]
fn xlsm_keeps_macro_and_adds_page_sheets() {
    let table_pdf = UploadedFile::new("table.pdf", pdf(&[TABLE_PAGE, b""]));
    let out = merge(&template(), &spreadsheet(), &[table_pdf], &MergeOptions::default()).unwrap();

    assert_eq!(out.file_name, "Processed_Result.xlsm");
    assert_eq!(out.content_type, "application/vnd.ms-excel.sheet.macroEnabled.12");
    assert_eq!(zip_entry(&out.bytes, "xl/vbaProject.bin"), VBA_BYTES);

    assert_eq!(sheet_names(&out.bytes), ["Sheet1", "Extra", "Page1"]);
    assert_eq!(cell(&out.bytes, "Sheet1", 0, 0), "テンプレート");
    assert_eq!(cell(&out.bytes, "Sheet1", 1, 1), "氏名");
    assert_eq!(cell(&out.bytes, "Sheet1", 2, 2), "3.5");
    assert_eq!(cell(&out.bytes, "Page1", 0, 0), "Name");
    assert_eq!(cell(&out.bytes, "Page1", 1, 1), "Teacher");

    let report = &out.report;
    assert_eq!(report.copied_sheets, ["Sheet1", "Extra"]);
    let pages = &report.pdfs[0].pages;
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].sheet_name.as_deref(), Some("Page1"));
    assert_eq!((pages[0].rows, pages[0].columns), (2, 2));
    assert_eq!(pages[1].sheet_name, None);
    assert_eq!(report.pdfs[0].placeholder_sheet, None);
}

#[test]
fn page_sheet_names_do_not_collide_across_pdfs() {
    let pdfs = [
        UploadedFile::new("a.pdf", pdf(&[TABLE_PAGE])),
        UploadedFile::new("b.pdf", pdf(&[TABLE_PAGE])),
    ];
    let out = merge(&template(), &spreadsheet(), &pdfs, &MergeOptions::default()).unwrap();
    assert_eq!(
        sheet_names(&out.bytes),
        ["Sheet1", "Extra", "Page1", "Page1_2"]
    );
}

#[test]
fn pdf_without_text_gets_placeholder_sheet() {
    let scan = UploadedFile::new("scan.pdf", pdf(&[b"0 0 m 100 100 l S"]));
    let out = merge(&template(), &spreadsheet(), &[scan], &MergeOptions::default()).unwrap();

    assert_eq!(out.report.pdfs[0].placeholder_sheet.as_deref(), Some("Page1"));
    assert_eq!(cell(&out.bytes, "Page1", 0, 0), "テキストを抽出できませんでした");
}

#[test]
fn zip_output_bundles_workbook_pdfs_and_report() {
    let options = MergeOptions {
        output: OutputFormat::Zip,
        ..MergeOptions::default()
    };
    let table_pdf = UploadedFile::new("名簿 2024.pdf", pdf(&[TABLE_PAGE]));
    let out = merge(&template(), &spreadsheet(), &[table_pdf.clone()], &options).unwrap();

    assert_eq!(out.file_name, "Processed_Result.zip");
    assert_eq!(out.content_type, "application/zip");

    let workbook = zip_entry(&out.bytes, "Processed_Result.xlsm");
    assert_eq!(zip_entry(&workbook, "xl/vbaProject.bin"), VBA_BYTES);
    assert_eq!(zip_entry(&out.bytes, "2024.pdf"), table_pdf.bytes);

    let report: serde_json::Value =
        serde_json::from_slice(&zip_entry(&out.bytes, "report.json")).unwrap();
    assert_eq!(report["pdfs"][0]["file_name"], "2024.pdf");
    assert_eq!(report["pdfs"][0]["pages"][0]["sheet_name"], "Page1");
}

#[test]
fn unreadable_inputs_are_client_errors() {
    let bad_excel = UploadedFile::new("broken.xlsx", b"not a workbook".to_vec());
    let err = merge(&template(), &bad_excel, &[], &MergeOptions::default()).unwrap_err();
    assert!(matches!(err, MergeError::Spreadsheet { .. }));
    assert!(err.is_client_error());

    let bad_pdf = UploadedFile::new("broken.pdf", b"%PDF-1.4 garbage".to_vec());
    let err = merge(&template(), &spreadsheet(), &[bad_pdf], &MergeOptions::default()).unwrap_err();
    assert!(matches!(err, MergeError::Pdf { ref filename, .. } if filename == "broken.pdf"));
}
