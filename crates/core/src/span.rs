use serde::{Deserialize, Serialize};

use crate::config::PageNumberFilter;
use crate::geometry::Rect;

/// A positioned run of text as emitted by the page interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub bbox: Rect,
    /// 1-based page number.
    pub page: u32,
}

impl Span {
    pub fn new(text: impl Into<String>, bbox: Rect, page: u32) -> Self {
        Self {
            text: text.into(),
            bbox,
            page,
        }
    }
}

/// Whether `span` is a standalone page number sitting in a margin band.
pub fn is_page_number(span: &Span, filter: &PageNumberFilter) -> bool {
    let text = span.text.trim();
    if text.is_empty() || text.len() > filter.max_digits {
        return false;
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let value: u32 = match text.parse() {
        Ok(v) => v,
        Err(_) => return false,
    };

    let at_top = span.bbox.y0 < filter.top_margin;
    let at_bottom = span.bbox.y1 > filter.bottom_edge;
    let small = span.bbox.width() < filter.max_width;

    (at_top || at_bottom) && small && value > 0
}

/// Drop page-number spans, keeping everything else in order.
pub fn filter_page_numbers(spans: Vec<Span>, filter: &PageNumberFilter) -> Vec<Span> {
    spans
        .into_iter()
        .filter(|span| !is_page_number(span, filter))
        .collect()
}
