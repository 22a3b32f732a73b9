//! Content stream interpreter.
//!
//! Walks tokenized operators while tracking the CTM, line width and text
//! state, and emits [`CharEvent`]s and [`PathEvent`]s. Form XObjects are
//! interpreted recursively with their own resources.

use std::collections::HashMap;

use sheetmerge_core::Matrix;

use crate::error::BackendError;
use crate::font::Font;
use crate::handler::{CharEvent, ContentHandler, PaintOp, PathEvent};
use crate::lopdf_backend::{dict_get, name_of, number_of, stream_bytes};
use crate::path::PathBuilder;
use crate::text_state::{TextParams, TextState};
use crate::tokenizer::{Operand, Operator, tokenize};

/// Form XObjects nested deeper than this are skipped.
const MAX_FORM_DEPTH: usize = 16;

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    line_width: f64,
    text: TextParams,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::identity(),
            line_width: 1.0,
            text: TextParams::default(),
        }
    }
}

struct Interpreter<'d, 'h> {
    doc: &'d lopdf::Document,
    handler: &'h mut dyn ContentHandler,
    gstate: GraphicsState,
    stack: Vec<GraphicsState>,
    tstate: TextState,
}

/// Interpret a page's content stream.
pub(crate) fn interpret_page_content(
    doc: &lopdf::Document,
    content: &[u8],
    resources: &lopdf::Dictionary,
    handler: &mut dyn ContentHandler,
) -> Result<(), BackendError> {
    let mut interpreter = Interpreter {
        doc,
        handler,
        gstate: GraphicsState::default(),
        stack: Vec::new(),
        tstate: TextState::new(),
    };
    interpreter.run(content, resources, 0)
}

fn f64_at(operands: &[Operand], index: usize) -> Option<f64> {
    operands.get(index).and_then(Operand::as_f64)
}

/// Read six numeric operands as a matrix.
fn matrix_operands(operands: &[Operand]) -> Option<Matrix> {
    let values: Vec<f64> = operands.iter().filter_map(Operand::as_f64).collect();
    <[f64; 6]>::try_from(values.as_slice())
        .ok()
        .map(Matrix::from_array)
}

impl Interpreter<'_, '_> {
    fn run(
        &mut self,
        content: &[u8],
        resources: &lopdf::Dictionary,
        depth: usize,
    ) -> Result<(), BackendError> {
        let operators = tokenize(content)?;
        let mut fonts: HashMap<String, Font> = HashMap::new();
        let mut path = PathBuilder::new(self.gstate.ctm);

        for op in &operators {
            let operands = op.operands.as_slice();
            match op.name.as_str() {
                // Graphics state
                "q" => {
                    let mut saved = self.gstate.clone();
                    saved.text = self.tstate.params.clone();
                    self.stack.push(saved);
                }
                "Q" => {
                    if let Some(saved) = self.stack.pop() {
                        self.tstate.params = saved.text.clone();
                        self.gstate = saved;
                        path.set_ctm(self.gstate.ctm);
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operands(operands) {
                        self.gstate.ctm = m.concat(&self.gstate.ctm);
                        path.set_ctm(self.gstate.ctm);
                    }
                }
                "w" => {
                    if let Some(w) = f64_at(operands, 0) {
                        self.gstate.line_width = w;
                    }
                }

                // Text objects and state
                "BT" => self.tstate.begin_text(),
                "ET" => {}
                "Tf" => {
                    if let (Some(name), Some(size)) =
                        (operands.first().and_then(Operand::as_name), f64_at(operands, 1))
                    {
                        self.tstate.params.font_name = name.to_string();
                        self.tstate.params.font_size = size;
                        if !fonts.contains_key(name) {
                            fonts.insert(name.to_string(), self.load_font(resources, name));
                        }
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operands(operands) {
                        self.tstate.set_text_matrix(m);
                    }
                }
                "Td" => {
                    if let (Some(tx), Some(ty)) = (f64_at(operands, 0), f64_at(operands, 1)) {
                        self.tstate.move_text_position(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (f64_at(operands, 0), f64_at(operands, 1)) {
                        self.tstate.move_text_position_and_set_leading(tx, ty);
                    }
                }
                "T*" => self.tstate.move_to_next_line(),
                "TL" => set_param(operands, &mut self.tstate.params.leading),
                "Tc" => set_param(operands, &mut self.tstate.params.char_spacing),
                "Tw" => set_param(operands, &mut self.tstate.params.word_spacing),
                "Tz" => set_param(operands, &mut self.tstate.params.h_scaling),
                "Ts" => set_param(operands, &mut self.tstate.params.rise),

                // Text showing
                "Tj" => {
                    if let Some(bytes) = operands.first().and_then(Operand::as_bytes) {
                        self.show_string(&fonts, bytes);
                    }
                }
                "'" => {
                    self.tstate.move_to_next_line();
                    if let Some(bytes) = operands.first().and_then(Operand::as_bytes) {
                        self.show_string(&fonts, bytes);
                    }
                }
                "\"" => {
                    set_param(operands, &mut self.tstate.params.word_spacing);
                    if let Some(ac) = f64_at(operands, 1) {
                        self.tstate.params.char_spacing = ac;
                    }
                    self.tstate.move_to_next_line();
                    if let Some(bytes) = operands.get(2).and_then(Operand::as_bytes) {
                        self.show_string(&fonts, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Operand::Array(items)) = operands.first() {
                        self.show_positioned(&fonts, items);
                    }
                }

                // Path construction
                "m" => {
                    if let (Some(x), Some(y)) = (f64_at(operands, 0), f64_at(operands, 1)) {
                        path.move_to(x, y);
                    }
                }
                "l" => {
                    if let (Some(x), Some(y)) = (f64_at(operands, 0), f64_at(operands, 1)) {
                        path.line_to(x, y);
                    }
                }
                "c" | "v" | "y" => {
                    let n = operands.len();
                    if n >= 4 {
                        if let (Some(x), Some(y)) = (f64_at(operands, n - 2), f64_at(operands, n - 1))
                        {
                            path.curve_to(x, y);
                        }
                    }
                }
                "re" => {
                    let values: Vec<f64> = operands.iter().filter_map(Operand::as_f64).collect();
                    if let [x, y, w, h] = values[..] {
                        path.rectangle(x, y, w, h);
                    }
                }
                "h" => path.close_path(),

                // Path painting
                "S" => self.paint(&mut path, PaintOp::Stroke, false),
                "s" => self.paint(&mut path, PaintOp::Stroke, true),
                "f" | "F" | "f*" => self.paint(&mut path, PaintOp::Fill, false),
                "B" | "B*" => self.paint(&mut path, PaintOp::FillAndStroke, false),
                "b" | "b*" => self.paint(&mut path, PaintOp::FillAndStroke, true),
                "n" => {
                    path.take();
                }

                "Do" => {
                    if let Some(name) = operands.first().and_then(Operand::as_name) {
                        self.do_xobject(resources, name, depth)?;
                        path.set_ctm(self.gstate.ctm);
                    }
                }

                _ => {}
            }
        }

        Ok(())
    }

    fn load_font(&self, resources: &lopdf::Dictionary, name: &str) -> Font {
        let dict = dict_get(self.doc, resources, b"Font")
            .and_then(|o| o.as_dict().ok())
            .and_then(|fonts| dict_get(self.doc, fonts, name.as_bytes()))
            .and_then(|o| o.as_dict().ok());
        match dict {
            Some(dict) => Font::load(self.doc, dict),
            None => {
                tracing::warn!(font = name, "font resource not found, using default metrics");
                Font::default()
            }
        }
    }

    fn show_string(&mut self, fonts: &HashMap<String, Font>, bytes: &[u8]) {
        let fallback = Font::default();
        let font = fonts
            .get(&self.tstate.params.font_name)
            .unwrap_or(&fallback);
        let params = &self.tstate.params;
        let (font_size, char_spacing, word_spacing) =
            (params.font_size, params.char_spacing, params.word_spacing);

        for glyph in font.decode(bytes) {
            let trm = self.tstate.rendering_matrix(&self.gstate.ctm);
            self.handler.on_char(CharEvent {
                char_code: glyph.code,
                unicode: glyph.unicode,
                font_name: font.name.clone(),
                font_size,
                rendering_matrix: trm,
                width: glyph.width,
                ascent: font.ascent,
                descent: font.descent,
            });

            let spacing = if glyph.is_space {
                char_spacing + word_spacing
            } else {
                char_spacing
            };
            let tx = (glyph.width / 1000.0 * font_size + spacing) * self.tstate.h_scale();
            self.tstate.advance(tx);
        }
    }

    fn show_positioned(&mut self, fonts: &HashMap<String, Font>, items: &[Operand]) {
        for item in items {
            match item {
                Operand::String(bytes) => self.show_string(fonts, bytes),
                other => {
                    if let Some(adjust) = other.as_f64() {
                        let tx = -adjust / 1000.0
                            * self.tstate.params.font_size
                            * self.tstate.h_scale();
                        self.tstate.advance(tx);
                    }
                }
            }
        }
    }

    fn paint(&mut self, path: &mut PathBuilder, paint_op: PaintOp, close: bool) {
        if close {
            path.close_path();
        }
        let segments = path.take();
        if segments.is_empty() {
            return;
        }
        self.handler.on_path_painted(PathEvent {
            segments,
            paint_op,
            line_width: self.gstate.line_width,
        });
    }

    fn do_xobject(
        &mut self,
        resources: &lopdf::Dictionary,
        name: &str,
        depth: usize,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let Some(stream) = dict_get(doc, resources, b"XObject")
            .and_then(|o| o.as_dict().ok())
            .and_then(|xobjects| dict_get(doc, xobjects, name.as_bytes()))
            .and_then(|o| o.as_stream().ok())
        else {
            tracing::debug!(xobject = name, "XObject not found");
            return Ok(());
        };

        let is_form = dict_get(doc, &stream.dict, b"Subtype")
            .and_then(name_of)
            .is_some_and(|s| s == "Form");
        if !is_form {
            return Ok(());
        }
        if depth + 1 > MAX_FORM_DEPTH {
            tracing::warn!(xobject = name, depth, "Form XObject nesting too deep, skipping");
            return Ok(());
        }

        let Some(content) = stream_bytes(stream) else {
            return Ok(());
        };
        let form_matrix = dict_get(doc, &stream.dict, b"Matrix")
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| {
                let values: Vec<f64> = arr.iter().filter_map(number_of).collect();
                <[f64; 6]>::try_from(values.as_slice()).ok()
            })
            .map_or_else(Matrix::identity, Matrix::from_array);
        let form_resources = dict_get(doc, &stream.dict, b"Resources")
            .and_then(|o| o.as_dict().ok())
            .unwrap_or(resources);

        let saved_gstate = self.gstate.clone();
        let saved_stack = self.stack.len();
        let saved_text = self.tstate.clone();
        self.gstate.ctm = form_matrix.concat(&self.gstate.ctm);

        let result = self.run(&content, form_resources, depth + 1);

        self.stack.truncate(saved_stack);
        self.gstate = saved_gstate;
        self.tstate = saved_text;
        result
    }
}

fn set_param(operands: &[Operand], target: &mut f64) {
    if let Some(v) = f64_at(operands, 0) {
        *target = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, Stream, dictionary};

    #[derive(Default)]
    struct Collector {
        chars: Vec<CharEvent>,
        paths: Vec<PathEvent>,
    }

    impl ContentHandler for Collector {
        fn on_char(&mut self, event: CharEvent) {
            self.chars.push(event);
        }
        fn on_path_painted(&mut self, event: PathEvent) {
            self.paths.push(event);
        }
    }

    fn helvetica_resources(doc: &mut lopdf::Document) -> lopdf::Dictionary {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "FirstChar" => 32i64,
            "Widths" => vec![Object::Integer(278), Object::Integer(0)],
        });
        dictionary! { "Font" => dictionary! { "F1" => font_id } }
    }

    fn run(doc: &lopdf::Document, content: &[u8], resources: &lopdf::Dictionary) -> Collector {
        let mut collector = Collector::default();
        interpret_page_content(doc, content, resources, &mut collector).unwrap();
        collector
    }

    #[test]
    fn glyph_advance_uses_widths_and_spacing() {
        let mut doc = lopdf::Document::with_version("1.5");
        let res = helvetica_resources(&mut doc);
        let c = run(&doc, b"BT /F1 10 Tf 2 Tc 5 Tw 100 700 Td ( A) Tj ET", &res);
        assert_eq!(c.chars.len(), 2);
        assert_eq!(c.chars[0].rendering_matrix.e, 100.0);
        // space: 278/1000*10 + 2 + 5 = 9.78
        assert!((c.chars[1].rendering_matrix.e - 109.78).abs() < 1e-9);
        assert_eq!(c.chars[1].width, 600.0);
    }

    #[test]
    fn tj_array_adjustment_moves_left_for_positive_numbers() {
        let mut doc = lopdf::Document::with_version("1.5");
        let res = helvetica_resources(&mut doc);
        let c = run(&doc, b"BT /F1 10 Tf [( ) 1000 ( )] TJ ET", &res);
        // 2.78 advance, then -10
        assert!((c.chars[1].rendering_matrix.e - (2.78 - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn q_restores_ctm_and_text_params() {
        let mut doc = lopdf::Document::with_version("1.5");
        let res = helvetica_resources(&mut doc);
        let c = run(
            &doc,
            b"q 2 0 0 2 0 0 cm /F1 20 Tf Q BT /F1 10 Tf (x) Tj ET q 3 Tc Q BT (x) Tj ET",
            &res,
        );
        assert_eq!(c.chars[0].rendering_matrix.a, 10.0);
        assert_eq!(c.chars[1].font_size, 10.0);
    }

    #[test]
    fn rectangle_fill_reports_four_segments() {
        let doc = lopdf::Document::with_version("1.5");
        let c = run(&doc, b"0.5 w 10 10 100 50 re f 0 0 m 5 5 l n", &lopdf::Dictionary::new());
        assert_eq!(c.paths.len(), 1);
        assert_eq!(c.paths[0].segments.len(), 4);
        assert_eq!(c.paths[0].paint_op, PaintOp::Fill);
        assert_eq!(c.paths[0].line_width, 0.5);
    }

    #[test]
    fn form_xobject_applies_matrix() {
        let mut doc = lopdf::Document::with_version("1.5");
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "Matrix" => vec![
                    Object::Integer(1), Object::Integer(0), Object::Integer(0),
                    Object::Integer(1), Object::Integer(50), Object::Integer(0),
                ],
            },
            b"0 0 m 0 100 l S".to_vec(),
        ));
        let res = dictionary! { "XObject" => dictionary! { "Fm1" => form_id } };
        let c = run(&doc, b"q 1 0 0 1 10 0 cm /Fm1 Do Q", &res);
        assert_eq!(c.paths.len(), 1);
        assert_eq!(c.paths[0].segments[0].start.x, 60.0);
    }

    #[test]
    fn self_referencing_form_stops_at_depth_limit() {
        let mut doc = lopdf::Document::with_version("1.5");
        let form_id = doc.new_object_id();
        let form = Stream::new(
            dictionary! {
                "Subtype" => "Form",
                "Resources" => dictionary! { "XObject" => dictionary! { "Me" => form_id } },
            },
            b"0 0 m 0 10 l S /Me Do".to_vec(),
        );
        doc.objects.insert(form_id, Object::Stream(form));
        let res = dictionary! { "XObject" => dictionary! { "Me" => form_id } };
        let c = run(&doc, b"/Me Do", &res);
        assert_eq!(c.paths.len(), MAX_FORM_DEPTH);
    }

    #[test]
    fn missing_font_uses_defaults() {
        let doc = lopdf::Document::with_version("1.5");
        let c = run(&doc, b"BT /F9 12 Tf (ab) Tj ET", &lopdf::Dictionary::new());
        assert_eq!(c.chars.len(), 2);
        assert_eq!(c.chars[0].width, 600.0);
        assert!((c.chars[1].rendering_matrix.e - 7.2).abs() < 1e-9);
    }
}
