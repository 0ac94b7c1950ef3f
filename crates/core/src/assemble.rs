//! Question assembly: merged segments in, finished questions out.
//!
//! The assembler is a two-state machine. While idle it waits for the first
//! question segment; once a question is open every answer segment is parsed,
//! checked against the page's underlines and appended to it. The next
//! question segment (or the end of input) finalizes the open question, which
//! is also when its image is resolved.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::UnderlineRules;
use crate::geometry::{image_between, Rect};
use crate::merge::{Segment, SegmentKind};
use crate::patterns::{parse_answer, QuizPatterns};
use crate::underline::{is_underlined, UnderlineMap};

/// A placed raster image, already written to disk under `file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub file: String,
    pub bbox: Rect,
}

pub type ImageMap = BTreeMap<u32, Vec<ImageBlock>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: Option<String>,
    pub text: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Option<String>,
    pub question: String,
    pub answers: Vec<Answer>,
    pub image: Option<String>,
}

/// Output of an assembly pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub questions: Vec<Question>,
    /// Answer segments that appeared before any question.
    pub orphaned_answers: Vec<Segment>,
}

/// An answer plus the bbox the image heuristic needs.
#[derive(Debug)]
struct PendingAnswer {
    answer: Answer,
    bbox: Rect,
}

#[derive(Debug)]
struct OpenQuestion {
    id: Option<String>,
    text: String,
    bbox: Rect,
    page: u32,
    answers: Vec<PendingAnswer>,
}

impl OpenQuestion {
    fn finalize(self, images: &ImageMap) -> Question {
        let first_answer = self.answers.first().map(|a| a.bbox);
        let page_images = images.get(&self.page).map(Vec::as_slice).unwrap_or(&[]);
        let image = find_image_for_question(&self.bbox, first_answer.as_ref(), page_images);
        Question {
            id: self.id,
            question: self.text,
            answers: self.answers.into_iter().map(|a| a.answer).collect(),
            image,
        }
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Open(OpenQuestion),
}

/// Segment-by-segment question builder.
pub struct Assembler<'a> {
    patterns: &'a QuizPatterns,
    rules: &'a UnderlineRules,
    images: &'a ImageMap,
    underlines: &'a UnderlineMap,
    state: State,
    output: Assembly,
}

impl<'a> Assembler<'a> {
    pub fn new(
        patterns: &'a QuizPatterns,
        rules: &'a UnderlineRules,
        images: &'a ImageMap,
        underlines: &'a UnderlineMap,
    ) -> Self {
        Self {
            patterns,
            rules,
            images,
            underlines,
            state: State::Idle,
            output: Assembly::default(),
        }
    }

    pub fn push(&mut self, segment: &Segment) {
        match segment.kind {
            SegmentKind::Question => self.open_question(segment),
            SegmentKind::Answer => self.add_answer(segment),
        }
    }

    pub fn finish(mut self) -> Assembly {
        self.close_question();
        self.output
    }

    fn open_question(&mut self, segment: &Segment) {
        self.close_question();
        let (id, text) = self.patterns.parse_question(&segment.text);
        self.state = State::Open(OpenQuestion {
            id,
            text,
            bbox: segment.bbox,
            page: segment.page,
            answers: Vec::new(),
        });
    }

    fn add_answer(&mut self, segment: &Segment) {
        let State::Open(question) = &mut self.state else {
            self.output.orphaned_answers.push(segment.clone());
            return;
        };

        let page_underlines = self
            .underlines
            .get(&segment.page)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let correct = is_underlined(&segment.bbox, page_underlines, self.rules);
        let (id, text) = parse_answer(&segment.text);

        question.answers.push(PendingAnswer {
            answer: Answer { id, text, correct },
            bbox: segment.bbox,
        });
    }

    fn close_question(&mut self) {
        if let State::Open(question) = std::mem::take(&mut self.state) {
            let finished = question.finalize(self.images);
            self.output.questions.push(finished);
        }
    }
}

/// Pick the image shown between a question and its first answer.
///
/// Returns the first block (in page order) whose top edge lies in the band
/// from the question's bottom edge to the first answer's top edge. Without an
/// answer there is no band and no image.
pub fn find_image_for_question(
    question: &Rect,
    first_answer: Option<&Rect>,
    page_images: &[ImageBlock],
) -> Option<String> {
    let first_answer = first_answer?;
    page_images
        .iter()
        .find(|img| image_between(question, first_answer, &img.bbox))
        .map(|img| img.file.clone())
}

/// Assemble questions from merged segments.
pub fn assemble_questions(
    segments: &[Segment],
    patterns: &QuizPatterns,
    rules: &UnderlineRules,
    images: &ImageMap,
    underlines: &UnderlineMap,
) -> Assembly {
    let mut assembler = Assembler::new(patterns, rules, images, underlines);
    for segment in segments {
        assembler.push(segment);
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::underline::Underline;

    fn segment(kind: SegmentKind, text: &str, bbox: Rect, page: u32) -> Segment {
        Segment {
            kind,
            text: text.to_string(),
            bbox,
            page,
        }
    }

    fn question(text: &str, y0: f32, y1: f32) -> Segment {
        segment(SegmentKind::Question, text, Rect::new(72.0, y0, 400.0, y1), 1)
    }

    fn answer(text: &str, y0: f32, y1: f32) -> Segment {
        segment(SegmentKind::Answer, text, Rect::new(72.0, y0, 114.0, y1), 1)
    }

    fn image(file: &str, y0: f32) -> ImageBlock {
        ImageBlock {
            file: file.to_string(),
            bbox: Rect::new(100.0, y0, 300.0, y0 + 50.0),
        }
    }

    fn run(segments: &[Segment], images: &ImageMap, underlines: &UnderlineMap) -> Assembly {
        let patterns = QuizPatterns::default();
        let rules = UnderlineRules::default();
        assemble_questions(segments, &patterns, &rules, images, underlines)
    }

    #[test]
    fn test_sky_question_with_underlined_answer() {
        let segments = vec![
            question("Câu 1. What color is the sky?", 88.0, 100.0),
            answer("1. Red", 108.0, 120.0),
            answer("2. Blue", 128.0, 140.0),
            answer("3. Green", 148.0, 160.0),
        ];
        let mut underlines = UnderlineMap::new();
        underlines.insert(
            1,
            vec![Underline {
                bbox: Rect::new(70.0, 140.5, 116.0, 141.3),
            }],
        );

        let assembly = run(&segments, &ImageMap::new(), &underlines);
        assert_eq!(assembly.questions.len(), 1);
        let q = &assembly.questions[0];
        assert_eq!(q.id.as_deref(), Some("1"));
        assert_eq!(q.question, "What color is the sky?");
        assert_eq!(q.image, None);
        assert_eq!(
            q.answers,
            vec![
                Answer {
                    id: Some("1".to_string()),
                    text: "Red".to_string(),
                    correct: false
                },
                Answer {
                    id: Some("2".to_string()),
                    text: "Blue".to_string(),
                    correct: true
                },
                Answer {
                    id: Some("3".to_string()),
                    text: "Green".to_string(),
                    correct: false
                },
            ]
        );
    }

    #[test]
    fn test_underline_on_other_page_ignored() {
        let segments = vec![
            question("Câu 1. Q", 88.0, 100.0),
            answer("1. A", 128.0, 140.0),
        ];
        let mut underlines = UnderlineMap::new();
        underlines.insert(
            2,
            vec![Underline {
                bbox: Rect::new(70.0, 140.5, 116.0, 141.3),
            }],
        );
        let assembly = run(&segments, &ImageMap::new(), &underlines);
        assert!(!assembly.questions[0].answers[0].correct);
    }

    #[test]
    fn test_orphan_answer_dropped_and_reported() {
        let segments = vec![
            answer("1. Stray", 50.0, 62.0),
            question("Câu 1. Q", 88.0, 100.0),
            answer("1. A", 108.0, 120.0),
        ];
        let assembly = run(&segments, &ImageMap::new(), &UnderlineMap::new());
        assert_eq!(assembly.questions.len(), 1);
        assert_eq!(assembly.questions[0].answers.len(), 1);
        assert_eq!(assembly.questions[0].answers[0].text, "A");
        assert_eq!(assembly.orphaned_answers.len(), 1);
        assert_eq!(assembly.orphaned_answers[0].text, "1. Stray");
    }

    #[test]
    fn test_answers_bound_to_nearest_preceding_question() {
        let segments = vec![
            question("Câu 1. First", 88.0, 100.0),
            answer("1. a", 108.0, 120.0),
            question("Câu 2. Second", 200.0, 212.0),
            answer("1. b", 220.0, 232.0),
            answer("2. c", 240.0, 252.0),
        ];
        let assembly = run(&segments, &ImageMap::new(), &UnderlineMap::new());
        assert_eq!(assembly.questions.len(), 2);
        assert_eq!(assembly.questions[0].answers.len(), 1);
        assert_eq!(assembly.questions[1].answers.len(), 2);
        assert_eq!(assembly.questions[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_question_without_answers_is_kept() {
        let segments = vec![question("Câu 5. Essay question", 88.0, 100.0)];
        let mut images = ImageMap::new();
        images.insert(1, vec![image("page1_img1.png", 110.0)]);
        let assembly = run(&segments, &images, &UnderlineMap::new());
        assert_eq!(assembly.questions.len(), 1);
        assert!(assembly.questions[0].answers.is_empty());
        assert_eq!(assembly.questions[0].image, None);
    }

    #[test]
    fn test_pattern_mismatch_falls_back() {
        let segments = vec![
            question("Câu 3 Which one? 17", 88.0, 100.0),
            answer("1.", 108.0, 120.0),
        ];
        let assembly = run(&segments, &ImageMap::new(), &UnderlineMap::new());
        let q = &assembly.questions[0];
        assert_eq!(q.id, None);
        assert_eq!(q.question, "Câu 3 Which one?");
        assert_eq!(q.answers[0].id, None);
        assert_eq!(q.answers[0].text, "1.");
    }

    #[test]
    fn test_output_answers_have_no_leading_label() {
        let segments = vec![
            question("Câu 1. Q", 88.0, 100.0),
            answer("1. Red", 108.0, 120.0),
            answer("2.Blue 9", 128.0, 140.0),
        ];
        let assembly = run(&segments, &ImageMap::new(), &UnderlineMap::new());
        for a in &assembly.questions[0].answers {
            let (reparsed_id, _) = parse_answer(&a.text);
            assert_eq!(reparsed_id, None, "{:?} still carries a label", a.text);
        }
        assert_eq!(assembly.questions[0].answers[1].text, "Blue");
    }

    #[test]
    fn test_image_between_question_and_first_answer() {
        let segments = vec![
            question("Câu 4. Identify the shape", 280.0, 300.0),
            answer("1. Circle", 320.0, 332.0),
            answer("2. Square", 340.0, 352.0),
        ];
        let mut images = ImageMap::new();
        images.insert(
            1,
            vec![image("page1_img1.png", 310.0), image("page1_img2.png", 400.0)],
        );
        let assembly = run(&segments, &images, &UnderlineMap::new());
        assert_eq!(assembly.questions[0].image.as_deref(), Some("page1_img1.png"));
    }

    #[test]
    fn test_image_first_in_page_order_wins() {
        let q = Rect::new(72.0, 280.0, 400.0, 300.0);
        let a = Rect::new(72.0, 320.0, 114.0, 332.0);
        let images = vec![image("late.png", 315.0), image("early.png", 305.0)];
        assert_eq!(
            find_image_for_question(&q, Some(&a), &images).as_deref(),
            Some("late.png")
        );
    }

    #[test]
    fn test_image_on_other_page_not_attached() {
        let segments = vec![
            question("Câu 4. Identify", 280.0, 300.0),
            answer("1. Circle", 320.0, 332.0),
        ];
        let mut images = ImageMap::new();
        images.insert(2, vec![image("page2_img1.png", 310.0)]);
        let assembly = run(&segments, &images, &UnderlineMap::new());
        assert_eq!(assembly.questions[0].image, None);
    }

    #[test]
    fn test_find_image_edge_cases() {
        let q = Rect::new(72.0, 280.0, 400.0, 300.0);
        let a = Rect::new(72.0, 320.0, 114.0, 332.0);
        assert_eq!(find_image_for_question(&q, None, &[image("x.png", 310.0)]), None);
        assert_eq!(find_image_for_question(&q, Some(&a), &[]), None);
        assert_eq!(
            find_image_for_question(&q, Some(&a), &[image("x.png", 250.0)]),
            None
        );
    }

    #[test]
    fn test_question_json_shape() {
        let q = Question {
            id: None,
            question: "Q".to_string(),
            answers: vec![Answer {
                id: Some("1".to_string()),
                text: "A".to_string(),
                correct: true,
            }],
            image: None,
        };
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": null,
                "question": "Q",
                "answers": [{"id": "1", "text": "A", "correct": true}],
                "image": null
            })
        );
    }
}
