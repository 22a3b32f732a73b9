use std::path::{Path, PathBuf};

use sheetmerge::{LayoutSettings, MergeOptions, OutputFormat, merge_with_template_file};

use crate::shared::read_upload;

pub fn run(
    template: &Path,
    excel: &Path,
    pdfs: &[PathBuf],
    output: Option<&Path>,
    zip: bool,
    settings: LayoutSettings,
) -> Result<(), i32> {
    let spreadsheet = read_upload(excel)?;
    let pdfs = pdfs
        .iter()
        .map(|p| read_upload(p))
        .collect::<Result<Vec<_>, _>>()?;

    let options = MergeOptions {
        layout: settings,
        output: if zip { OutputFormat::Zip } else { OutputFormat::Xlsm },
        ..MergeOptions::default()
    };

    let merged = merge_with_template_file(template, &spreadsheet, &pdfs, &options).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;

    let out_path = output.map_or_else(|| PathBuf::from(merged.file_name), Path::to_path_buf);
    std::fs::write(&out_path, &merged.bytes).map_err(|e| {
        eprintln!("Error: failed to write {}: {e}", out_path.display());
        1
    })?;

    for (file, page) in merged.report.low_confidence_pages() {
        eprintln!("Warning: {file} page {page}: column split not backed by ruling lines");
    }
    println!("{}", out_path.display());
    Ok(())
}
