//! Core library for quizpdf
//!
//! This crate implements the **Functional Core** of the quizpdf application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`quizpdf_core`** (this crate): Pure transformation functions with zero I/O
//! - **`pdf`**: Content-stream interpretation on top of `lopdf`
//! - **`quizpdf`**: I/O operations and orchestration (the Imperative Shell)
//!
//! Everything here works on plain data handed over by the shell: positioned
//! text spans, per-page underline drawings and per-page image blocks whose
//! bytes have already been written to disk.
//!
//! # Pipeline
//!
//! ```text
//! Span[]  ->  Span[]  ->  Segment[]  ->  Question[]
//!        filter        merge         assemble
//!   (page numbers)  (wrapped lines)  (ids, underlines, images)
//! ```
//!
//! # Module Organization
//!
//! - [`geometry`]: Rectangles and the band tests
//! - [`span`]: Text spans and the page-number filter
//! - [`patterns`]: Question/answer classification and id parsing
//! - [`merge`]: Span merging into segments
//! - [`underline`]: Underline detection from drawings
//! - [`assemble`]: Question assembly and image association
//! - [`config`]: Tunable thresholds
//!
//! # Example Usage
//!
//! ```rust
//! use quizpdf_core::{extract_questions, ExtractionConfig, ImageMap, Rect, Span, UnderlineMap};
//!
//! let spans = vec![
//!     Span::new("Câu 1. What color is the sky?", Rect::new(72.0, 110.0, 300.0, 122.0), 1),
//!     Span::new("1. Red", Rect::new(72.0, 130.0, 110.0, 142.0), 1),
//! ];
//! let config = ExtractionConfig::default();
//! let extraction =
//!     extract_questions(spans, &ImageMap::new(), &UnderlineMap::new(), &config).unwrap();
//!
//! assert_eq!(extraction.questions.len(), 1);
//! assert_eq!(extraction.questions[0].answers[0].text, "Red");
//! ```

pub mod assemble;
pub mod config;
pub mod geometry;
pub mod merge;
pub mod patterns;
pub mod span;
pub mod underline;

pub use assemble::{assemble_questions, Answer, Assembly, ImageBlock, ImageMap, Question};
pub use config::{ConfigError, ExtractionConfig, PageNumberFilter, Patterns, UnderlineRules};
pub use geometry::{HorizontalMatch, Rect};
pub use merge::{merge_spans, Merged, Segment, SegmentKind};
pub use patterns::QuizPatterns;
pub use span::{filter_page_numbers, Span};
pub use underline::{detect_underlines, Drawing, PaintKind, Underline, UnderlineMap};

/// Everything one run produces, including what had to be dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub questions: Vec<Question>,
    /// Answer segments seen before the first question.
    pub orphaned_answers: Vec<Segment>,
    /// Continuation spans seen before the first segment.
    pub unattributed_spans: usize,
    /// Spans removed as page numbers.
    pub page_numbers_removed: usize,
}

/// Filter, merge and assemble in one call.
pub fn extract_questions(
    spans: Vec<Span>,
    images: &ImageMap,
    underlines: &UnderlineMap,
    config: &ExtractionConfig,
) -> Result<Extraction, ConfigError> {
    let patterns = QuizPatterns::new(&config.patterns)?;

    let segmented = segment_spans(spans, config, &patterns);
    let assembly = assemble_questions(
        &segmented.segments,
        &patterns,
        &config.underline,
        images,
        underlines,
    );

    Ok(Extraction {
        questions: assembly.questions,
        orphaned_answers: assembly.orphaned_answers,
        unattributed_spans: segmented.unattributed_spans,
        page_numbers_removed: segmented.page_numbers_removed,
    })
}

/// Output of [`segment_spans`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmented {
    pub segments: Vec<Segment>,
    pub unattributed_spans: usize,
    pub page_numbers_removed: usize,
}

/// Filter page numbers and merge the remaining spans into segments.
pub fn segment_spans(
    spans: Vec<Span>,
    config: &ExtractionConfig,
    patterns: &QuizPatterns,
) -> Segmented {
    let before = spans.len();
    let filtered = filter_page_numbers(spans, &config.page_numbers);
    let page_numbers_removed = before - filtered.len();
    let merged = merge_spans(&filtered, patterns);
    Segmented {
        segments: merged.segments,
        unattributed_spans: merged.unattributed,
        page_numbers_removed,
    }
}
