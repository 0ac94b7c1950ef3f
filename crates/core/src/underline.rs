//! Underline detection from vector drawings.
//!
//! Correct answers are marked by a thin black bar drawn just under the text.
//! These show up as filled rectangles whose height is well under a point or
//! two. Every qualifying drawing becomes its own [`Underline`]; touching bars
//! are not merged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::UnderlineRules;
use crate::geometry::{underline_marks, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaintKind {
    Fill,
    Stroke,
    FillStroke,
}

/// A painted path as reported by the page interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub kind: PaintKind,
    /// Non-stroking colour as RGB in `0.0..=1.0`, if one was set.
    pub fill: Option<[f32; 3]>,
    pub rect: Rect,
    /// The path was a single axis-aligned rectangle.
    pub is_rect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Underline {
    pub bbox: Rect,
}

pub type UnderlineMap = BTreeMap<u32, Vec<Underline>>;

pub fn is_underline(drawing: &Drawing, rules: &UnderlineRules) -> bool {
    drawing.kind == PaintKind::Fill
        && drawing.is_rect
        && drawing.fill == Some([0.0, 0.0, 0.0])
        && drawing.rect.height() < rules.max_height
}

/// Keep the drawings of one page that look like underline strokes.
pub fn detect_underlines(drawings: &[Drawing], rules: &UnderlineRules) -> Vec<Underline> {
    drawings
        .iter()
        .filter(|d| is_underline(d, rules))
        .map(|d| Underline { bbox: d.rect })
        .collect()
}

/// True when any underline on the page marks `bbox` as correct.
pub fn is_underlined(bbox: &Rect, underlines: &[Underline], rules: &UnderlineRules) -> bool {
    underlines
        .iter()
        .any(|ul| underline_marks(bbox, &ul.bbox, rules.vertical_tolerance, rules.horizontal))
}
