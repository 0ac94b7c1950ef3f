//! Rectangles and the band tests used by the assembler.
//!
//! Coordinates are page-local with the origin at the top-left corner and `y`
//! growing downward, so `y0` is the top edge and `y1` the bottom edge.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `(x0, y0, x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// True when `other` lies entirely inside `self` (edges inclusive).
    pub fn contains(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }
}

impl From<[f32; 4]> for Rect {
    fn from(v: [f32; 4]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

/// How an underline must relate horizontally to the text it marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalMatch {
    /// The underline spans the whole text width.
    #[default]
    Cover,
    /// Any horizontal overlap is enough.
    Overlap,
}

/// Band test for correctness marks.
///
/// The underline must sit within `tolerance` of the text's bottom edge
/// (`ul.y0 >= bottom - tolerance` and `ul.y1 <= bottom + tolerance`) and
/// satisfy the horizontal rule.
pub fn underline_marks(
    text: &Rect,
    underline: &Rect,
    tolerance: f32,
    horizontal: HorizontalMatch,
) -> bool {
    let bottom = text.y1;
    let in_band = underline.y0 >= bottom - tolerance && underline.y1 <= bottom + tolerance;
    if !in_band {
        return false;
    }
    match horizontal {
        HorizontalMatch::Cover => underline.x0 <= text.x0 && underline.x1 >= text.x1,
        HorizontalMatch::Overlap => underline.x0 <= text.x1 && underline.x1 >= text.x0,
    }
}

/// Band test for image association: the image's top edge lies between the
/// question's bottom edge and the first answer's top edge, both inclusive.
pub fn image_between(question: &Rect, first_answer: &Rect, image: &Rect) -> bool {
    question.y1 <= image.y0 && image.y0 <= first_answer.y0
}
