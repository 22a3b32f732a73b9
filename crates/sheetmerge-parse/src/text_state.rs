//! Text state tracked across `BT`/`ET` blocks.
//!
//! [`TextParams`] is the part of the graphics state that `q`/`Q` save and
//! restore; the text and line matrices live only inside a text object.

use sheetmerge_core::Matrix;

/// Text parameters set by `Tc`, `Tw`, `Tz`, `TL`, `Tf` and `Ts`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// Horizontal scaling as a percentage (100 = normal).
    pub h_scaling: f64,
    pub leading: f64,
    /// Resource name of the current font (e.g. `F1`).
    pub font_name: String,
    pub font_size: f64,
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font_name: String::new(),
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextState {
    pub params: TextParams,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl TextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_matrix(&self) -> Matrix {
        self.text_matrix
    }

    /// Horizontal scaling as a fraction.
    pub fn h_scale(&self) -> f64 {
        self.params.h_scaling / 100.0
    }

    /// `BT`: reset both matrices.
    pub fn begin_text(&mut self) {
        self.text_matrix = Matrix::identity();
        self.line_matrix = Matrix::identity();
    }

    /// `Tm`
    pub fn set_text_matrix(&mut self, m: Matrix) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: start a new line offset from the current line start.
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: like `Td`, also setting leading to `-ty`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.params.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`
    pub fn move_to_next_line(&mut self) {
        let leading = self.params.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Advance the text matrix along the baseline by `tx` text space units.
    pub fn advance(&mut self, tx: f64) {
        self.text_matrix = Matrix::translation(tx, 0.0).concat(&self.text_matrix);
    }

    /// The text rendering matrix `[fs·Th 0 0 fs 0 rise] × Tm × CTM`.
    pub fn rendering_matrix(&self, ctm: &Matrix) -> Matrix {
        let p = &self.params;
        Matrix::new(p.font_size * self.h_scale(), 0.0, 0.0, p.font_size, 0.0, p.rise)
            .concat(&self.text_matrix)
            .concat(ctm)
    }
}
