//! Byte-identical passthrough of the template's VBA project.
//!
//! The spreadsheet writer re-serializes every part it understands. The VBA
//! parts are copied raw from the template archive afterwards, replacing
//! whatever the writer produced, and the content types and workbook
//! relationships are patched if the writer dropped the macro entries.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::MergeError;

const CONTENT_TYPES: &str = "[Content_Types].xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const VBA_PROJECT: &str = "xl/vbaProject.bin";
const VBA_PROJECT_RELS: &str = "xl/_rels/vbaProject.bin.rels";

const VBA_CONTENT_TYPE: &str = "application/vnd.ms-office.vbaProject";
const VBA_SIGNATURE_CONTENT_TYPE: &str = "application/vnd.ms-office.vbaProjectSignature";
const VBA_RELATIONSHIP: &str = "http://schemas.microsoft.com/office/2006/relationships/vbaProject";
const WORKBOOK_MAIN: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const WORKBOOK_MACRO_MAIN: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

/// One raw part of the template's VBA project.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroPart {
    /// Path inside the archive, e.g. `xl/vbaProject.bin`.
    pub name: String,
    pub bytes: Vec<u8>,
}

fn is_macro_part(name: &str) -> bool {
    (name.starts_with("xl/vbaProject") && name.ends_with(".bin")) || name == VBA_PROJECT_RELS
}

/// Collect the VBA parts of a template archive.
///
/// Returns an empty list for a template without macros.
pub fn extract_macro_parts(template: &[u8]) -> Result<Vec<MacroPart>, MergeError> {
    let mut archive = ZipArchive::new(Cursor::new(template))?;
    let mut parts = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if !is_macro_part(file.name()) {
            continue;
        }
        let name = file.name().to_string();
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        parts.push(MacroPart { name, bytes });
    }
    Ok(parts)
}

/// Rewrite `workbook` so it carries exactly the given macro parts.
///
/// With no parts the workbook is returned unchanged.
pub fn restore_macro_parts(workbook: Vec<u8>, parts: &[MacroPart]) -> Result<Vec<u8>, MergeError> {
    if parts.is_empty() {
        return Ok(workbook);
    }

    let mut archive = ZipArchive::new(Cursor::new(workbook.as_slice()))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let name = archive.by_index_raw(i)?.name().to_string();
        if is_macro_part(&name) {
            continue;
        }
        match name.as_str() {
            CONTENT_TYPES | WORKBOOK_RELS => {
                let mut xml = String::new();
                archive.by_index(i)?.read_to_string(&mut xml)?;
                let patched = if name == CONTENT_TYPES {
                    patch_content_types(&xml, parts)
                } else {
                    patch_workbook_rels(&xml)
                };
                writer.start_file(name, options)?;
                writer.write_all(patched.as_bytes())?;
            }
            _ => writer.raw_copy_file(archive.by_index_raw(i)?)?,
        }
    }

    for part in parts {
        writer.start_file(part.name.as_str(), options)?;
        writer.write_all(&part.bytes)?;
    }

    tracing::debug!(parts = parts.len(), "restored macro parts from template");
    Ok(writer.finish()?.into_inner())
}

fn insert_before(xml: &str, closing_tag: &str, element: &str) -> String {
    match xml.rfind(closing_tag) {
        Some(pos) => format!("{}{element}{}", &xml[..pos], &xml[pos..]),
        None => xml.to_string(),
    }
}

fn patch_content_types(xml: &str, parts: &[MacroPart]) -> String {
    let mut xml = xml.replace(WORKBOOK_MAIN, WORKBOOK_MACRO_MAIN);
    for part in parts.iter().filter(|p| p.name.ends_with(".bin")) {
        let part_name = format!("/{}", part.name);
        if xml.contains(&format!("PartName=\"{part_name}\"")) {
            continue;
        }
        let content_type = if part.name == VBA_PROJECT {
            VBA_CONTENT_TYPE
        } else {
            VBA_SIGNATURE_CONTENT_TYPE
        };
        let element = format!(r#"<Override PartName="{part_name}" ContentType="{content_type}"/>"#);
        xml = insert_before(&xml, "</Types>", &element);
    }
    xml
}

fn patch_workbook_rels(xml: &str) -> String {
    if xml.contains(VBA_RELATIONSHIP) {
        return xml.to_string();
    }
    let element = format!(
        r#"<Relationship Id="rIdVbaProject" Type="{VBA_RELATIONSHIP}" Target="vbaProject.bin"/>"#
    );
    insert_before(xml, "</Relationships>", &element)
}
