//! Integration tests for the `layout` subcommand.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cmd() -> Command {
    Command::cargo_bin("sheetmerge").unwrap()
}

/// Build a PDF with one page per content stream.
fn pdf_with_pages(contents: &[&[u8]]) -> Vec<u8> {
    use lopdf::{Object, Stream, dictionary};

    let mut doc = lopdf::Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

const TABLE: &[u8] = b"BT /F1 10 Tf 20 700 Td (Name) Tj 200 0 Td (Taro) Tj ET \
    BT /F1 10 Tf 20 680 Td (Role) Tj 200 0 Td (Teacher) Tj ET \
    150 650 m 150 720 l S";

fn write_temp_pdf(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn text_output_prints_rows_per_page() {
    let pdf = write_temp_pdf(&pdf_with_pages(&[TABLE, b""]));
    cmd()
        .arg("layout")
        .arg(pdf.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("--- page 1 (2 rows x 2 columns"))
        .stdout(predicate::str::contains("Name\tTaro"))
        .stdout(predicate::str::contains("Role\tTeacher"))
        .stdout(predicate::str::contains("--- page 2 (0 rows x 0 columns"));
}

#[test]
fn json_output_has_boundaries_and_rows() {
    let pdf = write_temp_pdf(&pdf_with_pages(&[TABLE]));
    let output = cmd()
        .arg("layout")
        .arg(pdf.path())
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let pages: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let page = &pages[0];
    assert_eq!(page["page"], 1);
    assert_eq!(page["rows"][0], serde_json::json!(["Name", "Taro"]));
    assert_eq!(page["rows"][1], serde_json::json!(["Role", "Teacher"]));
    let sources: Vec<&str> = page["boundaries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["source"].as_str().unwrap())
        .collect();
    assert_eq!(sources, ["extent", "ruling", "extent"]);
}

#[test]
fn csv_output_with_page_selection() {
    let pdf = write_temp_pdf(&pdf_with_pages(&[b"", TABLE]));
    cmd()
        .arg("layout")
        .arg(pdf.path())
        .args(["--format", "csv", "--pages", "2"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("page,row,column,text"))
        .stdout(predicate::str::contains("2,1,1,Name"))
        .stdout(predicate::str::contains("2,2,2,Teacher"));
}

#[test]
fn page_out_of_range_fails() {
    let pdf = write_temp_pdf(&pdf_with_pages(&[TABLE]));
    cmd()
        .arg("layout")
        .arg(pdf.path())
        .args(["--pages", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds document page count"));
}

#[test]
fn missing_file_fails() {
    cmd()
        .args(["layout", "/nonexistent/file.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}
