//! Ruling lines derived from painted path segments.
//!
//! Coordinates use the top-left origin system, like [`BBox`](crate::BBox).

/// Orientation of a line segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineOrientation {
    Horizontal,
    Vertical,
    Diagonal,
}

/// A straight segment painted on the page: an explicit line, a closepath
/// segment, or one edge of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RulingLine {
    /// Left x coordinate.
    pub x0: f64,
    /// Top y coordinate (distance from top of page).
    pub top: f64,
    /// Right x coordinate.
    pub x1: f64,
    /// Bottom y coordinate (distance from top of page).
    pub bottom: f64,
    /// Stroke width from the graphics state.
    pub line_width: f64,
}

/// Tolerance used by [`RulingLine::orientation`].
const AXIS_TOLERANCE: f64 = 1e-6;

impl RulingLine {
    /// Build a segment from two endpoints, normalizing so that `x0 <= x1`
    /// and `top <= bottom`.
    pub fn from_points(xa: f64, ya: f64, xb: f64, yb: f64, line_width: f64) -> Self {
        Self {
            x0: xa.min(xb),
            top: ya.min(yb),
            x1: xa.max(xb),
            bottom: ya.max(yb),
            line_width,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Horizontal midpoint.
    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    /// Exact orientation classification.
    pub fn orientation(&self) -> LineOrientation {
        if self.height() < AXIS_TOLERANCE {
            LineOrientation::Horizontal
        } else if self.width() < AXIS_TOLERANCE {
            LineOrientation::Vertical
        } else {
            LineOrientation::Diagonal
        }
    }

    /// True when the horizontal delta is below `tolerance` and the segment
    /// has some vertical extent.
    pub fn is_near_vertical(&self, tolerance: f64) -> bool {
        self.width() < tolerance && self.height() > self.width()
    }
}
