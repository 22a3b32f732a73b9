use std::path::Path;

use sheetmerge::{BoundarySource, LayoutSettings, PageTable, PdfDocument, WordOptions};

use crate::cli::LayoutFormat;
use crate::shared::{csv_escape, read_file, resolve_pages};

pub fn run(
    file: &Path,
    pages: Option<&str>,
    format: LayoutFormat,
    x_tolerance: f64,
    settings: &LayoutSettings,
) -> Result<(), i32> {
    let bytes = read_file(file)?;
    let pdf = PdfDocument::open(&bytes)
        .map_err(|e| {
            eprintln!("Error: failed to open PDF: {e}");
            1
        })?
        .with_word_options(WordOptions {
            x_tolerance,
            ..WordOptions::default()
        });
    let page_indices = resolve_pages(pages, pdf.page_count())?;

    let mut tables = Vec::with_capacity(page_indices.len());
    for idx in page_indices {
        let page = pdf.page(idx).map_err(|e| {
            eprintln!("Error reading page {}: {e}", idx + 1);
            1
        })?;
        tables.push(page.table(settings));
    }

    match format {
        LayoutFormat::Text => write_text(&tables, settings),
        LayoutFormat::Json => write_json(&tables, settings),
        LayoutFormat::Csv => write_csv(&tables),
    }
}

fn source_str(source: BoundarySource) -> &'static str {
    match source {
        BoundarySource::RulingLine => "ruling",
        BoundarySource::WordExtent => "extent",
    }
}

fn write_text(tables: &[PageTable], settings: &LayoutSettings) -> Result<(), i32> {
    for table in tables {
        let low = !table.is_blank() && table.confidence.is_low(settings.min_confidence);
        println!(
            "--- page {} ({} rows x {} columns, confidence {:.2}{}) ---",
            table.page_number,
            table.row_count(),
            table.column_count(),
            table.confidence.score,
            if low { ", low" } else { "" },
        );
        for row in &table.rows {
            println!("{}", row.join("\t"));
        }
    }
    Ok(())
}

fn write_json(tables: &[PageTable], settings: &LayoutSettings) -> Result<(), i32> {
    let pages: Vec<_> = tables
        .iter()
        .map(|t| {
            serde_json::json!({
                "page": t.page_number,
                "boundaries": t.boundaries.iter().map(|b| serde_json::json!({
                    "x": b.x,
                    "source": source_str(b.source),
                })).collect::<Vec<_>>(),
                "rows": t.rows,
                "confidence": t.confidence.score,
                "low_confidence": !t.is_blank() && t.confidence.is_low(settings.min_confidence),
            })
        })
        .collect();

    let json_str = serde_json::to_string(&pages).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;
    println!("{json_str}");
    Ok(())
}

fn write_csv(tables: &[PageTable]) -> Result<(), i32> {
    println!("page,row,column,text");
    for table in tables {
        for (r, row) in table.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                println!(
                    "{},{},{},{}",
                    table.page_number,
                    r + 1,
                    c + 1,
                    csv_escape(cell)
                );
            }
        }
    }
    Ok(())
}
