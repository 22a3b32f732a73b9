//! End-to-end tests: PDF bytes → LopdfBackend → events → chars → words.
//!
//! Test PDFs are created programmatically using lopdf.

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use sheetmerge_parse::sheetmerge_core::{Char, WordExtractor, WordOptions};
use sheetmerge_parse::{
    CharEvent, ContentHandler, LopdfBackend, PathEvent, PdfBackend, char_from_event,
};

/// Build a one-page PDF with the given font resources and content streams.
fn build_pdf(fonts: lopdf::Dictionary, contents: &[&[u8]], compress: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let content_ids: Vec<Object> = contents
        .iter()
        .map(|c| Object::Reference(doc.add_object(Stream::new(dictionary! {}, c.to_vec()))))
        .collect();

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ],
        "Contents" => content_ids,
        "Resources" => dictionary! { "Font" => fonts },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1i64,
            "Kids" => vec![Object::Reference(page_id)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if compress {
        doc.compress();
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

#[derive(Default)]
struct Collector {
    page_top: f64,
    chars: Vec<Char>,
    paths: Vec<PathEvent>,
}

impl ContentHandler for Collector {
    fn on_char(&mut self, event: CharEvent) {
        self.chars.push(char_from_event(&event, self.page_top));
    }
    fn on_path_painted(&mut self, event: PathEvent) {
        self.paths.push(event);
    }
}

fn collect(bytes: &[u8]) -> Collector {
    let doc = LopdfBackend::open(bytes).unwrap();
    let page = LopdfBackend::get_page(&doc, 0).unwrap();
    let media_box = LopdfBackend::page_media_box(&doc, &page).unwrap();
    let mut collector = Collector {
        page_top: media_box.bottom,
        ..Collector::default()
    };
    LopdfBackend::interpret_page(&doc, &page, &mut collector).unwrap();
    collector
}

fn helvetica() -> lopdf::Dictionary {
    dictionary! {
        "F1" => dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        },
    }
}

#[test]
fn latin_words_in_top_left_coordinates() {
    let pdf = build_pdf(helvetica(), &[b"BT /F1 10 Tf 50 800 Td (Name Taro) Tj ET"], false);
    let collected = collect(&pdf);

    let words = WordExtractor::extract(&collected.chars, &WordOptions::default());
    let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, ["Name", "Taro"]);

    let first = &words[0];
    assert!((first.bbox.x0 - 50.0).abs() < 1e-6);
    // baseline 800 on an 842pt page, ascent 750/1000 of 10pt
    assert!((first.bbox.top - 34.5).abs() < 1e-6);
    assert!((first.bbox.bottom - 44.5).abs() < 1e-6);
}

#[test]
fn shift_jis_type0_font_decodes_japanese() {
    let fonts = dictionary! {
        "F1" => dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "ABCDEF+MS-Mincho",
            "Encoding" => "90ms-RKSJ-H",
        },
    };
    let content: &[u8] = b"BT /F1 12 Tf 72 700 Td (\x8e\x52\x93\x63) Tj ET";
    let collected = collect(&build_pdf(fonts, &[content], false));

    let text: String = collected.chars.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(text, "山田");
    assert_eq!(collected.chars[0].fontname, "MS-Mincho");
    // full-width advance of 12pt
    assert!((collected.chars[1].bbox.x0 - 84.0).abs() < 1e-6);

    let words = WordExtractor::extract(&collected.chars, &WordOptions::default());
    assert_eq!(words.len(), 1);
}

#[test]
fn compressed_multi_stream_content_with_ruling_lines() {
    let pdf = build_pdf(
        helvetica(),
        &[
            b"BT /F1 10 Tf 20 800 Td (A) Tj ET",
            b"0.5 w 100 100 m 100 820 l S 10 810 180 0.5 re f",
        ],
        true,
    );
    let collected = collect(&pdf);

    assert_eq!(collected.chars.len(), 1);
    assert_eq!(collected.paths.len(), 2);
    let vertical = collected.paths[0].segments[0].to_ruling_line(842.0, 0.5);
    assert!(vertical.is_near_vertical(2.0));
    assert_eq!(vertical.top, 22.0);
    assert_eq!(vertical.bottom, 742.0);
}

#[test]
fn page_without_contents_yields_nothing() {
    let pdf = build_pdf(helvetica(), &[], false);
    let collected = collect(&pdf);
    assert!(collected.chars.is_empty());
    assert!(collected.paths.is_empty());
}
