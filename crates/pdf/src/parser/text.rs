//! PDF text state and text-showing operators.
//!
//! Advances use the font's glyph widths when the backend can resolve them.
//! Fonts without metrics fall back to half an em per decoded character.

use super::backend::{decode_text_simple, get_number_from_value, PageId, PdfBackend, PdfValue};
use super::fonts::FontMetrics;
use super::graphics::Matrix;

/// Character width, as a fraction of font size, for fonts without metrics.
pub const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Fraction of the font size above the baseline covered by a text box.
pub const ASCENT_RATIO: f32 = 0.8;

/// Fraction of the font size below the baseline covered by a text box.
pub const DESCENT_RATIO: f32 = 0.2;

/// A decoded text-showing operation in text space, before the CTM is
/// applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ShownText {
    pub text: String,
    /// Text-rendering matrix at the start of the run (text matrix with the
    /// rise applied, not yet multiplied by the CTM).
    pub matrix: Matrix,
    /// Advance in unscaled text-space units.
    pub width: f32,
    pub font_size: f32,
}

/// Mutable text state tracked while walking a content stream.
#[derive(Debug, Clone)]
pub struct TextState {
    /// Current font resource key (the `/F1`-style name).
    pub font_key: Vec<u8>,
    pub font_size: f32,
    pub text_matrix: Matrix,
    /// Set by BT and updated by Td/TD/T*/Tm.
    pub line_matrix: Matrix,
    /// Horizontal scaling (percent / 100).
    pub horiz_scale: f32,
    pub char_spacing: f32,
    pub word_spacing: f32,
    pub text_rise: f32,
    pub leading: f32,
    /// Metrics of the current font. The outer `None` means not looked up
    /// since the last `Tf`.
    metrics: Option<Option<FontMetrics>>,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
            metrics: None,
        }
    }
}

impl TextState {
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix = Matrix::translate(dx, 0.0).multiply(&self.text_matrix);
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn char_width(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn load_metrics(&mut self, backend: &dyn PdfBackend, page: PageId) {
        if self.metrics.is_none() {
            self.metrics = Some(backend.font_metrics(page, &self.font_key));
        }
    }

    /// Horizontal displacement of one shown string, spacing included.
    fn advance_of(&self, bytes: &[u8], text: &str) -> f32 {
        let glyph = |em: f32, is_space: bool| {
            let spacing = if is_space { self.word_spacing } else { 0.0 };
            (em * self.font_size + self.char_spacing + spacing) * self.horiz_scale
        };
        match self.metrics.as_ref().and_then(Option::as_ref) {
            Some(metrics) => {
                // Word spacing applies to the single-byte code 32 only.
                let single_byte = metrics.code_len() == 1;
                metrics
                    .codes(bytes)
                    .map(|code| glyph(metrics.width(code) / 1000.0, single_byte && code == 32))
                    .sum()
            }
            None => text
                .chars()
                .map(|ch| glyph(APPROX_CHAR_WIDTH_RATIO, ch == ' '))
                .sum(),
        }
    }

    fn run_matrix(&self) -> Matrix {
        Matrix::translate(0.0, self.text_rise).multiply(&self.text_matrix)
    }

    /// Apply a text-state or positioning operator. Returns `false` when the
    /// operator is not one of them.
    pub fn apply(&mut self, operator: &str, operands: &[PdfValue]) -> bool {
        let number = |i: usize| operands.get(i).and_then(get_number_from_value);
        match operator {
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            // Font state survives ET; some producers set it once per page.
            "ET" => {}
            "Tf" => self.set_font(operands),
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    self.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    self.leading = -ty;
                    self.translate_line(tx, ty);
                }
            }
            "T*" => self.next_line(),
            "TL" => self.leading = number(0).unwrap_or(self.leading),
            "Tc" => self.char_spacing = number(0).unwrap_or(self.char_spacing),
            "Tw" => self.word_spacing = number(0).unwrap_or(self.word_spacing),
            "Tz" => self.horiz_scale = number(0).map_or(self.horiz_scale, |v| v / 100.0),
            "Ts" => self.text_rise = number(0).unwrap_or(self.text_rise),
            _ => return false,
        }
        true
    }

    /// Unknown font keys are kept; the backend falls back to simple decoding.
    fn set_font(&mut self, operands: &[PdfValue]) {
        let key = match operands.first() {
            Some(PdfValue::Name(n)) | Some(PdfValue::Str(n)) => n.clone(),
            _ => return,
        };
        if key != self.font_key {
            self.metrics = None;
        }
        self.font_key = key;
        self.font_size = operands.get(1).and_then(get_number_from_value).unwrap_or(0.0);
    }

    /// Run a text-showing operator (`Tj`, `TJ`, `'`, `"`). Returns `None`
    /// for other operators and for runs that decode to nothing.
    pub fn show(
        &mut self,
        operator: &str,
        operands: &[PdfValue],
        backend: &dyn PdfBackend,
        page: PageId,
    ) -> Option<ShownText> {
        match operator {
            "Tj" => self.show_string(operands.first()?, backend, page),
            "TJ" => match operands.first()? {
                PdfValue::Array(items) => self.show_array(items, backend, page),
                _ => None,
            },
            "'" => {
                self.next_line();
                self.show_string(operands.first()?, backend, page)
            }
            "\"" => {
                if operands.len() < 3 {
                    return None;
                }
                if let Some(aw) = get_number_from_value(&operands[0]) {
                    self.word_spacing = aw;
                }
                if let Some(ac) = get_number_from_value(&operands[1]) {
                    self.char_spacing = ac;
                }
                self.next_line();
                self.show_string(&operands[2], backend, page)
            }
            _ => None,
        }
    }

    fn decode(&self, operand: &PdfValue, backend: &dyn PdfBackend, page: PageId) -> String {
        match operand {
            PdfValue::Str(bytes) => {
                let decoded = backend.decode_text(page, &self.font_key, bytes);
                if decoded.is_empty() {
                    decode_text_simple(bytes)
                } else {
                    decoded
                }
            }
            _ => String::new(),
        }
    }

    fn show_string(
        &mut self,
        operand: &PdfValue,
        backend: &dyn PdfBackend,
        page: PageId,
    ) -> Option<ShownText> {
        let PdfValue::Str(bytes) = operand else {
            return None;
        };
        let text = self.decode(operand, backend, page);
        if text.is_empty() {
            return None;
        }
        self.load_metrics(backend, page);
        let width = self.advance_of(bytes, &text);
        let shown = ShownText {
            matrix: self.run_matrix(),
            width,
            font_size: self.font_size,
            text,
        };
        self.advance_x(width);
        Some(shown)
    }

    /// A `TJ` array yields a single run. Kerning adjustments large enough
    /// to look like a word gap become a space.
    fn show_array(
        &mut self,
        items: &[PdfValue],
        backend: &dyn PdfBackend,
        page: PageId,
    ) -> Option<ShownText> {
        self.load_metrics(backend, page);
        let matrix = self.run_matrix();
        let start_x = self.text_matrix.0[4];
        let start_y = self.text_matrix.0[5];
        let mut buf = String::new();
        let mut summed = 0.0;

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let fragment = self.decode(item, backend, page);
                    let dx = self.advance_of(bytes, &fragment);
                    buf.push_str(&fragment);
                    summed += dx;
                    self.advance_x(dx);
                }
                other => {
                    // Thousandths of a text-space unit; negative moves right.
                    if let Some(adj) = get_number_from_value(other) {
                        let dx = -adj / 1000.0 * self.font_size * self.horiz_scale;
                        if dx > self.char_width() * 0.3 && !buf.is_empty() {
                            buf.push(' ');
                        }
                        summed += dx;
                        self.advance_x(dx);
                    }
                }
            }
        }

        let text = buf.trim_end();
        if text.is_empty() {
            return None;
        }

        // Width in text space from the actual advance, which includes the
        // kerning. Degenerate matrices fall back to the summed advances.
        let [a, b, ..] = self.text_matrix.0;
        let scale = (a * a + b * b).sqrt();
        let advanced = ((self.text_matrix.0[4] - start_x).powi(2)
            + (self.text_matrix.0[5] - start_y).powi(2))
        .sqrt();
        let width = if scale > 0.0 {
            advanced / scale
        } else {
            summed
        };

        Some(ShownText {
            text: text.to_string(),
            matrix,
            width,
            font_size: self.font_size,
        })
    }
}
