//! Glyph advance widths.
//!
//! Widths come from the font dictionary when it has them (`/FirstChar` and
//! `/Widths` for simple fonts, `/DW` and `/W` for the descendant of a Type0
//! font). Standard 14 fonts usually omit them, so AFM widths for the common
//! faces are built in. Everything is in glyph space: thousandths of an em.

use std::collections::BTreeMap;

use super::backend::{get_number_from_value, PdfValue};

/// Default `/DW` of a CIDFont.
pub const DEFAULT_CID_WIDTH: f32 = 1000.0;

/// Advance widths for one font.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    widths: BTreeMap<u32, f32>,
    default_width: f32,
    /// Bytes per character code: 1 for simple fonts, 2 for Type0.
    code_len: usize,
}

impl FontMetrics {
    /// A simple font's `/Widths` array starting at `/FirstChar`.
    pub fn simple(first_char: u32, widths: &[f32], missing_width: f32) -> Self {
        let widths = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| (first_char + i as u32, w))
            .collect();
        Self {
            widths,
            default_width: missing_width,
            code_len: 1,
        }
    }

    /// A CIDFont's `/W` array with its `/DW`. Two forms are mixed freely:
    /// `c [w1 w2 ...]` and `c_first c_last w`.
    pub fn composite(default_width: f32, w: &[PdfValue]) -> Self {
        let mut widths = BTreeMap::new();
        let mut i = 0;
        while i < w.len() {
            let Some(first) = w.get(i).and_then(get_number_from_value) else {
                break;
            };
            let first = first as u32;
            match w.get(i + 1) {
                Some(PdfValue::Array(run)) => {
                    for (offset, value) in run.iter().enumerate() {
                        if let Some(width) = get_number_from_value(value) {
                            widths.insert(first + offset as u32, width);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(width)) = (
                        get_number_from_value(last),
                        w.get(i + 2).and_then(get_number_from_value),
                    ) else {
                        break;
                    };
                    let last = last as u32;
                    if last < first || last - first > u16::MAX as u32 {
                        break;
                    }
                    for cid in first..=last {
                        widths.insert(cid, width);
                    }
                    i += 3;
                }
                None => break,
            }
        }
        Self {
            widths,
            default_width,
            code_len: 2,
        }
    }

    /// Built-in metrics for a standard font name (or a common metric-compatible
    /// alias such as Arial), ignoring any subset prefix.
    pub fn standard(base_font: &str) -> Option<Self> {
        let name = base_font
            .split_once('+')
            .map_or(base_font, |(_, rest)| rest);
        let widths = match name {
            "Courier" | "Courier-Bold" | "Courier-Oblique" | "Courier-BoldOblique"
            | "CourierNew" | "CourierNewPSMT" | "CourierNew,Bold" => {
                return Some(Self {
                    widths: BTreeMap::new(),
                    default_width: 600.0,
                    code_len: 1,
                })
            }
            "Helvetica" | "Helvetica-Oblique" | "Arial" | "ArialMT" | "Arial,Italic"
            | "Arial-ItalicMT" => &HELVETICA,
            "Helvetica-Bold" | "Helvetica-BoldOblique" | "Arial,Bold" | "Arial-BoldMT"
            | "Arial,BoldItalic" | "Arial-BoldItalicMT" => &HELVETICA_BOLD,
            // Italic Times shares the roman advances closely enough for boxes.
            "Times-Roman" | "Times-Italic" | "TimesNewRoman" | "TimesNewRomanPSMT"
            | "TimesNewRoman,Italic" | "TimesNewRomanPS-ItalicMT" => &TIMES_ROMAN,
            "Times-Bold" | "Times-BoldItalic" | "TimesNewRoman,Bold"
            | "TimesNewRomanPS-BoldMT" | "TimesNewRoman,BoldItalic"
            | "TimesNewRomanPS-BoldItalicMT" => &TIMES_BOLD,
            _ => return None,
        };
        Some(widths.metrics())
    }

    pub fn code_len(&self) -> usize {
        self.code_len
    }

    /// Split shown bytes into character codes. A trailing odd byte of a
    /// two-byte font is dropped.
    pub fn codes<'a>(&self, bytes: &'a [u8]) -> impl Iterator<Item = u32> + 'a {
        let len = self.code_len;
        bytes.chunks_exact(len).map(move |chunk| match len {
            1 => chunk[0] as u32,
            _ => u16::from_be_bytes([chunk[0], chunk[1]]) as u32,
        })
    }

    /// Advance of `code` in glyph space.
    pub fn width(&self, code: u32) -> f32 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }
}

/// AFM widths for printable ASCII (32..=126) and Latin-1 (160..=255).
struct StandardWidths {
    ascii: [u16; 95],
    latin1: [u16; 96],
}

impl StandardWidths {
    fn metrics(&self) -> FontMetrics {
        let ascii = (32u32..).zip(self.ascii.iter());
        let latin1 = (160u32..).zip(self.latin1.iter());
        FontMetrics {
            widths: ascii.chain(latin1).map(|(code, &w)| (code, w as f32)).collect(),
            // Codes 128..=159 (curly quotes, dashes, bullet) fall back here.
            default_width: 500.0,
            code_len: 1,
        }
    }
}

const HELVETICA: StandardWidths = StandardWidths {
    ascii: [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584,
        278, 333, 278, 278, 556, 556, 556, 556, 556, 556, 556, 556,
        556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
        722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278,
        278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
        556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
        278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
    ],
    latin1: [
        278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556,
        584, 333, 737, 333, 400, 584, 333, 333, 333, 556, 537, 278,
        333, 333, 365, 556, 834, 834, 834, 611, 667, 667, 667, 667,
        667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
        722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722,
        722, 667, 667, 611, 556, 556, 556, 556, 556, 556, 889, 500,
        556, 556, 556, 556, 278, 278, 278, 278, 556, 556, 556, 556,
        556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
    ],
};

const HELVETICA_BOLD: StandardWidths = StandardWidths {
    ascii: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584,
        278, 333, 278, 278, 556, 556, 556, 556, 556, 556, 556, 556,
        556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722,
        722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333,
        278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611,
        611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
        333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
    ],
    latin1: [
        278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556,
        584, 333, 737, 333, 400, 584, 333, 333, 333, 611, 556, 278,
        333, 333, 365, 556, 834, 834, 834, 611, 722, 722, 722, 722,
        722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
        722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722,
        722, 667, 667, 611, 556, 556, 556, 556, 556, 556, 889, 556,
        556, 556, 556, 556, 278, 278, 278, 278, 611, 611, 611, 611,
        611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
    ],
};

const TIMES_ROMAN: StandardWidths = StandardWidths {
    ascii: [
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564,
        250, 333, 250, 278, 500, 500, 500, 500, 500, 500, 500, 500,
        500, 500, 278, 278, 564, 564, 564, 444, 921, 722, 667, 667,
        722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
        556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333,
        278, 333, 469, 500, 333, 444, 500, 444, 500, 444, 333, 500,
        500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389,
        278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
    ],
    latin1: [
        250, 333, 500, 500, 500, 500, 200, 500, 333, 760, 276, 500,
        564, 333, 760, 333, 400, 564, 300, 300, 333, 500, 453, 250,
        333, 300, 310, 500, 750, 750, 750, 444, 722, 722, 722, 722,
        722, 722, 889, 667, 611, 611, 611, 611, 333, 333, 333, 333,
        722, 722, 722, 722, 722, 722, 722, 564, 722, 722, 722, 722,
        722, 722, 556, 500, 444, 444, 444, 444, 444, 444, 667, 444,
        444, 444, 444, 444, 278, 278, 278, 278, 500, 500, 500, 500,
        500, 500, 500, 564, 500, 500, 500, 500, 500, 500, 500, 500,
    ],
};

const TIMES_BOLD: StandardWidths = StandardWidths {
    ascii: [
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570,
        250, 333, 250, 278, 500, 500, 500, 500, 500, 500, 500, 500,
        500, 500, 333, 333, 570, 570, 570, 500, 930, 722, 667, 722,
        722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
        611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333,
        278, 333, 581, 500, 333, 500, 556, 444, 556, 444, 333, 500,
        556, 278, 333, 556, 278, 833, 556, 500, 556, 556, 444, 389,
        333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
    ],
    latin1: [
        250, 333, 500, 500, 500, 500, 220, 500, 333, 747, 300, 500,
        570, 333, 747, 333, 400, 570, 300, 300, 333, 556, 540, 250,
        333, 300, 330, 500, 750, 750, 750, 500, 722, 722, 722, 722,
        722, 722, 1000, 722, 667, 667, 667, 667, 389, 389, 389, 389,
        722, 722, 778, 778, 778, 778, 778, 570, 778, 722, 722, 722,
        722, 722, 611, 556, 500, 500, 500, 500, 500, 500, 722, 444,
        444, 444, 444, 444, 278, 278, 278, 278, 500, 556, 500, 500,
        500, 500, 500, 570, 500, 556, 556, 556, 556, 500, 556, 500,
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn text_width(metrics: &FontMetrics, text: &[u8], size: f32) -> f32 {
        metrics.codes(text).map(|c| metrics.width(c)).sum::<f32>() / 1000.0 * size
    }

    #[test]
    fn helvetica_widths_match_afm() {
        let helvetica = FontMetrics::standard("Helvetica").unwrap();
        assert_eq!(helvetica.width(b'B' as u32), 667.0);
        assert_eq!(helvetica.width(b'l' as u32), 222.0);
        assert_eq!(helvetica.width(0xE2), 556.0);
        assert!((text_width(&helvetica, b"2. Blue", 12.0) - 37.356).abs() < 1e-3);
    }

    #[test]
    fn standard_names_and_aliases() {
        let bold = FontMetrics::standard("ABCDEF+Arial-BoldMT").unwrap();
        assert_eq!(bold, FontMetrics::standard("Helvetica-Bold").unwrap());
        assert_eq!(FontMetrics::standard("Times-Roman").unwrap().width(b'a' as u32), 444.0);
        assert_eq!(FontMetrics::standard("Times-Bold").unwrap().width(b'W' as u32), 1000.0);
        assert_eq!(FontMetrics::standard("Courier").unwrap().width(b'i' as u32), 600.0);
        assert!(FontMetrics::standard("Calibri").is_none());
    }

    #[test]
    fn simple_widths_start_at_first_char() {
        let metrics = FontMetrics::simple(65, &[600.0, 700.0], 250.0);
        assert_eq!(metrics.width(65), 600.0);
        assert_eq!(metrics.width(66), 700.0);
        assert_eq!(metrics.width(32), 250.0);
        assert_eq!(metrics.codes(b"AB").collect::<Vec<_>>(), [65, 66]);
    }

    #[test]
    fn composite_w_array_both_forms() {
        let w = vec![
            PdfValue::Integer(3),
            PdfValue::Array(vec![PdfValue::Integer(500), PdfValue::Real(250.5)]),
            PdfValue::Integer(10),
            PdfValue::Integer(12),
            PdfValue::Integer(800),
        ];
        let metrics = FontMetrics::composite(DEFAULT_CID_WIDTH, &w);
        assert_eq!(metrics.width(3), 500.0);
        assert_eq!(metrics.width(4), 250.5);
        assert_eq!(metrics.width(11), 800.0);
        assert_eq!(metrics.width(13), 1000.0);
        assert_eq!(metrics.code_len(), 2);
        assert_eq!(
            metrics.codes(&[0x00, 0x03, 0x00, 0x0B, 0x01]).collect::<Vec<_>>(),
            [3, 11]
        );
    }
}
