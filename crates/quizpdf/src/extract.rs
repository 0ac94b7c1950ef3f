use std::path::PathBuf;

use colored::Colorize;
use quizpdf_core::{extract_questions, Extraction, Question};

use crate::collect::collect;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Clone)]
pub struct Options {
    /// Path to the quiz PDF
    input: PathBuf,

    /// Where to write the questions as JSON
    #[arg(short, long, env = "QUIZPDF_OUTPUT", default_value = "questions.json")]
    output: PathBuf,

    /// Directory the page images are written to (created if missing)
    #[arg(long, env = "QUIZPDF_IMAGES_DIR", default_value = "images")]
    images_dir: PathBuf,

    /// First page to read (1-indexed)
    #[arg(long, env = "QUIZPDF_START_PAGE", default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    start_page: u32,

    /// Extraction thresholds (defaults to ./quizpdf.toml when present)
    #[arg(long, env = "QUIZPDF_CONFIG")]
    config: Option<PathBuf>,
}

/// Read the document, assemble the questions and write them out.
pub fn extract(options: &Options) -> Result<Extraction> {
    let config = crate::config::load(options.config.as_deref())?;

    let doc = pdf::Document::open(&options.input)
        .map_err(Error::from)
        .with_context(|| f!("failed to open {}", options.input.display()))?;
    log::info!(
        "opened {} ({} pages)",
        options.input.display(),
        doc.page_count()
    );

    let collected = collect(
        &doc,
        options.start_page,
        &config.underline,
        Some(&options.images_dir),
    )?;
    drop(doc);

    let extraction = extract_questions(
        collected.spans,
        &collected.images,
        &collected.underlines,
        &config,
    )
    .map_err(Error::from)?;

    log::debug!(
        "removed {} page numbers, dropped {} unattributed spans",
        extraction.page_numbers_removed,
        extraction.unattributed_spans
    );
    for question in extraction.questions.iter().filter(|q| q.id.is_none()) {
        log::debug!("no question number found in {:?}", question.question);
    }
    for orphan in &extraction.orphaned_answers {
        log::warn!(
            "answer on page {} appears before any question and was dropped: {:?}",
            orphan.page,
            orphan.text
        );
    }

    let json = serde_json::to_string_pretty(&extraction.questions)?;
    std::fs::write(&options.output, json)
        .with_context(|| f!("failed to write {}", options.output.display()))?;
    log::info!(
        "wrote {} questions to {}",
        extraction.questions.len(),
        options.output.display()
    );

    Ok(extraction)
}

fn print_questions(questions: &[Question]) {
    let mut table = new_table();
    table.add_row(header_row(&["ID", "Question", "Answers", "Correct", "Image"]));
    for q in questions {
        let correct: Vec<&str> = q
            .answers
            .iter()
            .filter(|a| a.correct)
            .map(|a| a.id.as_deref().unwrap_or("?"))
            .collect();
        let correct = if correct.is_empty() {
            "-".to_string()
        } else {
            correct.join(", ")
        };
        table.add_row(prettytable::row![
            q.id.as_deref().unwrap_or("-").green(),
            q.question.bright_white(),
            q.answers.len().to_string().bright_yellow(),
            correct.bright_yellow(),
            q.image.as_deref().unwrap_or("-").bright_black()
        ]);
    }
    table.printstd();
}

pub fn run(options: Options, global: crate::Global) -> Result<()> {
    let extraction = extract(&options)?;

    if global.verbose {
        print_questions(&extraction.questions);
    }

    let with_image = extraction
        .questions
        .iter()
        .filter(|q| q.image.is_some())
        .count();
    println!(
        "{} {} questions ({} with an image) to {}",
        "Extracted".green().bold(),
        extraction.questions.len(),
        with_image,
        options.output.display()
    );
    if !extraction.orphaned_answers.is_empty() {
        println!(
            "{} {} answers appeared before the first question and were dropped",
            "Warning:".yellow().bold(),
            extraction.orphaned_answers.len()
        );
    }

    Ok(())
}
