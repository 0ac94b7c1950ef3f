//! Text patterns that give the flat span stream its structure.
//!
//! A span either starts a question (`Câu 12...`), starts an answer (`3.`), or
//! continues whatever segment is currently open. The same patterns are used
//! later to split the numeric id off the merged text.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::config::{ConfigError, Patterns};

/// Classification of a single trimmed span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    QuestionStart,
    AnswerStart,
    Continuation,
}

/// Compiled question/answer patterns for one keyword.
#[derive(Debug, Clone)]
pub struct QuizPatterns {
    question_start: Regex,
    question_parts: Regex,
}

impl QuizPatterns {
    pub fn new(patterns: &Patterns) -> Result<Self, ConfigError> {
        let keyword = regex::escape(&normalize(patterns.question_keyword.trim()));
        Ok(Self {
            question_start: compile(&format!(r"^{keyword}\s+\d+"))?,
            question_parts: compile(&format!(r"^{keyword}\s+(\d+)\.\s*(.+)$"))?,
        })
    }

    /// Classify trimmed span text. The question pattern wins ties.
    pub fn classify(&self, text: &str) -> SpanKind {
        if self.question_start.is_match(text) {
            SpanKind::QuestionStart
        } else if answer_start().is_match(text) {
            SpanKind::AnswerStart
        } else {
            SpanKind::Continuation
        }
    }

    /// Split a question segment into `(id, text)`.
    ///
    /// Falls back to `(None, cleaned text)` when the keyword/number/period
    /// prefix is not present. A trailing page number is stripped either way.
    pub fn parse_question(&self, text: &str) -> (Option<String>, String) {
        split_id(&self.question_parts, text)
    }
}

impl Default for QuizPatterns {
    fn default() -> Self {
        Self::new(&Patterns::default()).expect("default patterns are valid")
    }
}

/// Split an answer segment into `(id, text)`.
pub fn parse_answer(text: &str) -> (Option<String>, String) {
    split_id(answer_parts(), text)
}

/// Remove a page number that leaked onto the end of merged text
/// (`"... sky? 12"` becomes `"... sky?"`).
pub fn strip_trailing_page_number(text: &str) -> String {
    static RE_TRAILING: OnceLock<Regex> = OnceLock::new();
    let re = RE_TRAILING.get_or_init(|| Regex::new(r"\s+\d{1,3}$").unwrap());
    re.replace(text.trim(), "").into_owned()
}

/// Canonical (NFC) form so decomposed diacritics still match the keyword.
pub fn normalize(text: &str) -> String {
    text.nfc().collect()
}

fn split_id(re: &Regex, text: &str) -> (Option<String>, String) {
    let text = text.trim();
    match re.captures(text) {
        Some(caps) => {
            let id = caps.get(1).map(|m| m.as_str().to_string());
            let rest = caps
                .get(2)
                .map(|m| strip_trailing_page_number(m.as_str()))
                .unwrap_or_default();
            (id, rest)
        }
        None => (None, strip_trailing_page_number(text)),
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::Invalid {
        field: "patterns.question_keyword",
        reason: e.to_string(),
    })
}

fn answer_start() -> &'static Regex {
    static RE_ANSWER_START: OnceLock<Regex> = OnceLock::new();
    RE_ANSWER_START.get_or_init(|| Regex::new(r"^\d+\.").unwrap())
}

fn answer_parts() -> &'static Regex {
    static RE_ANSWER_PARTS: OnceLock<Regex> = OnceLock::new();
    RE_ANSWER_PARTS.get_or_init(|| Regex::new(r"^(\d+)\.\s*(.+)$").unwrap())
}
