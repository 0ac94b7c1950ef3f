//! Span merging: flat spans in, question/answer segments out.
//!
//! The merger keeps a single open segment. A span that starts a question or
//! an answer closes the open segment and opens a new one; any other span is a
//! continuation (a wrapped line, a second font run) and is glued onto the open
//! segment. Continuations seen before anything is open cannot be attributed
//! and are dropped.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::patterns::{normalize, QuizPatterns, SpanKind};
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Question,
    Answer,
}

/// One question or answer with all of its continuation text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
    /// Union of every contributing span's bbox.
    pub bbox: Rect,
    /// Page of the span that opened the segment.
    pub page: u32,
}

impl Segment {
    fn open(kind: SegmentKind, text: String, span: &Span) -> Self {
        Segment {
            kind,
            text,
            bbox: span.bbox,
            page: span.page,
        }
    }

    fn extend(&mut self, text: &str, bbox: &Rect) {
        self.text.push(' ');
        self.text.push_str(text);
        self.bbox = self.bbox.union(bbox);
    }
}

/// Result of a merge pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    pub segments: Vec<Segment>,
    /// Continuation spans that arrived before any segment was open.
    pub unattributed: usize,
}

/// Single-pass state machine over spans.
#[derive(Debug)]
pub struct SegmentMerger<'a> {
    patterns: &'a QuizPatterns,
    current: Option<Segment>,
    output: Vec<Segment>,
    unattributed: usize,
}

impl<'a> SegmentMerger<'a> {
    pub fn new(patterns: &'a QuizPatterns) -> Self {
        Self {
            patterns,
            current: None,
            output: Vec::new(),
            unattributed: 0,
        }
    }

    /// Feed the next span in reading order.
    pub fn push(&mut self, span: &Span) {
        let text = span.text.trim();
        if text.is_empty() {
            return;
        }
        let text = normalize(text);

        match self.patterns.classify(&text) {
            SpanKind::QuestionStart => self.start(SegmentKind::Question, text, span),
            SpanKind::AnswerStart => self.start(SegmentKind::Answer, text, span),
            SpanKind::Continuation => match self.current.as_mut() {
                Some(segment) => segment.extend(&text, &span.bbox),
                None => self.unattributed += 1,
            },
        }
    }

    /// Flush the open segment and return everything merged so far.
    pub fn finish(mut self) -> Merged {
        self.flush();
        Merged {
            segments: self.output,
            unattributed: self.unattributed,
        }
    }

    fn start(&mut self, kind: SegmentKind, text: String, span: &Span) {
        self.flush();
        self.current = Some(Segment::open(kind, text, span));
    }

    fn flush(&mut self) {
        if let Some(segment) = self.current.take() {
            self.output.push(segment);
        }
    }
}

/// Merge a filtered span sequence into segments.
pub fn merge_spans(spans: &[Span], patterns: &QuizPatterns) -> Merged {
    let mut merger = SegmentMerger::new(patterns);
    for span in spans {
        merger.push(span);
    }
    merger.finish()
}
