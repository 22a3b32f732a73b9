//! Character bounding boxes from content stream events.

use sheetmerge_core::{BBox, Char, Point};

use crate::handler::CharEvent;

/// Convert a [`CharEvent`] into a [`Char`] in top-left page coordinates.
///
/// The glyph box spans `[0, width]` horizontally and `[descent, ascent]`
/// vertically in glyph space; its four corners go through the rendering
/// matrix and the result is flipped against `page_top`, the upper edge of
/// the MediaBox in PDF space.
pub fn char_from_event(event: &CharEvent, page_top: f64) -> Char {
    let trm = &event.rendering_matrix;
    let w = event.width / 1000.0;
    let asc = event.ascent / 1000.0;
    let desc = event.descent / 1000.0;

    let corners = [
        trm.transform_point(Point::new(0.0, desc)),
        trm.transform_point(Point::new(w, desc)),
        trm.transform_point(Point::new(w, asc)),
        trm.transform_point(Point::new(0.0, asc)),
    ];
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    Char {
        text: event.unicode.clone(),
        bbox: BBox::new(min_x, page_top - max_y, max_x, page_top - min_y),
        fontname: event.font_name.clone(),
        size: event.font_size,
        upright: trm.b.abs() < 1e-6 && trm.c.abs() < 1e-6,
    }
}
