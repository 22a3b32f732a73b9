//! Path construction.
//!
//! Only straight segments matter for ruling-line detection, so curves move
//! the current point without producing a segment.

use sheetmerge_core::{Matrix, Point, RulingLine};

/// A straight segment in PDF page space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSegment {
    pub start: Point,
    pub end: Point,
}

impl PathSegment {
    /// Convert to a [`RulingLine`] in top-left coordinates.
    pub fn to_ruling_line(&self, page_top: f64, line_width: f64) -> RulingLine {
        RulingLine::from_points(
            self.start.x,
            page_top - self.start.y,
            self.end.x,
            page_top - self.end.y,
            line_width,
        )
    }
}

/// Accumulates segments of the current path, transformed by the CTM that is
/// current when each point is added.
#[derive(Debug, Default)]
pub struct PathBuilder {
    ctm: Matrix,
    segments: Vec<PathSegment>,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl PathBuilder {
    pub fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            ..Self::default()
        }
    }

    pub fn set_ctm(&mut self, ctm: Matrix) {
        self.ctm = ctm;
    }

    fn transform(&self, x: f64, y: f64) -> Point {
        self.ctm.transform_point(Point::new(x, y))
    }

    /// `m`
    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = self.transform(x, y);
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    /// `l`
    pub fn line_to(&mut self, x: f64, y: f64) {
        let p = self.transform(x, y);
        if let Some(start) = self.current {
            self.segments.push(PathSegment { start, end: p });
        } else {
            self.subpath_start = Some(p);
        }
        self.current = Some(p);
    }

    /// `c`, `v`, `y`: move to the end point only.
    pub fn curve_to(&mut self, x: f64, y: f64) {
        let p = self.transform(x, y);
        if self.subpath_start.is_none() {
            self.subpath_start = Some(p);
        }
        self.current = Some(p);
    }

    /// `re`: a closed four-edge subpath.
    pub fn rectangle(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.move_to(x, y);
        self.line_to(x + w, y);
        self.line_to(x + w, y + h);
        self.line_to(x, y + h);
        self.close_path();
    }

    /// `h`
    pub fn close_path(&mut self) {
        if let (Some(current), Some(start)) = (self.current, self.subpath_start) {
            if current != start {
                self.segments.push(PathSegment {
                    start: current,
                    end: start,
                });
            }
            self.current = Some(start);
        }
    }

    /// Finish the path for painting and reset.
    pub fn take(&mut self) -> Vec<PathSegment> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.segments)
    }
}
