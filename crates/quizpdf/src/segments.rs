use std::path::PathBuf;

use colored::Colorize;
use quizpdf_core::{segment_spans, QuizPatterns, Segment, SegmentKind, Segmented};

use crate::collect::collect;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Clone)]
pub struct Options {
    /// Path to the quiz PDF
    input: PathBuf,

    /// First page to read (1-indexed)
    #[arg(long, env = "QUIZPDF_START_PAGE", default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    start_page: u32,

    /// Extraction thresholds (defaults to ./quizpdf.toml when present)
    #[arg(long, env = "QUIZPDF_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Filter and merge the document's spans without assembling questions.
pub fn segments(options: &Options) -> Result<Segmented> {
    let config = crate::config::load(options.config.as_deref())?;
    let patterns = QuizPatterns::new(&config.patterns).map_err(Error::from)?;

    let doc = pdf::Document::open(&options.input)
        .map_err(Error::from)
        .with_context(|| f!("failed to open {}", options.input.display()))?;
    let collected = collect(&doc, options.start_page, &config.underline, None)?;

    Ok(segment_spans(collected.spans, &config, &patterns))
}

fn bbox_cell(segment: &Segment) -> String {
    let b = &segment.bbox;
    f!("{:.1} {:.1} {:.1} {:.1}", b.x0, b.y0, b.x1, b.y1)
}

pub fn run(options: Options, global: crate::Global) -> Result<()> {
    let segmented = segments(&options)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&segmented.segments)?);
        return Ok(());
    }

    if segmented.segments.is_empty() {
        println!("No segments found.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(header_row(&["Page", "Kind", "Text", "BBox"]));
    for segment in &segmented.segments {
        let kind = match segment.kind {
            SegmentKind::Question => "question".bright_yellow(),
            SegmentKind::Answer => "answer".green(),
        };
        table.add_row(prettytable::row![
            segment.page.to_string().bright_white(),
            kind,
            segment.text.bright_white(),
            bbox_cell(segment).bright_black()
        ]);
    }
    table.printstd();

    if global.verbose {
        println!(
            "{} page numbers removed, {} unattributed spans dropped",
            segmented.page_numbers_removed, segmented.unattributed_spans
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use quizpdf_core::Rect;

    use super::*;

    #[test]
    fn test_bbox_cell_rounds() {
        let segment = Segment {
            kind: SegmentKind::Answer,
            text: "1. Red".to_string(),
            bbox: Rect::new(72.0, 112.44, 108.0, 124.4),
            page: 1,
        };
        assert_eq!(bbox_cell(&segment), "72.0 112.4 108.0 124.4");
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            input: dir.path().join("absent.pdf"),
            start_page: 1,
            config: None,
            json: true,
        };
        let err = segments(&options).unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }
}
