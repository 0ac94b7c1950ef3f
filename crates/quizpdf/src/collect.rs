//! Everything the shell pulls out of the document before assembly.
//!
//! Pages are interpreted once; spans, underlines and image blocks are then
//! derived from the same [`pdf::PageContent`] values.

use std::path::Path;

use pdf::{BBox, Document, ImageFormat, PageContent, Paint, PathDrawing};
use quizpdf_core::{
    detect_underlines, Drawing, ImageBlock, ImageMap, PaintKind, Rect, Span, UnderlineMap,
    UnderlineRules,
};

use crate::prelude::*;

/// Per-run inputs for the functional core.
#[derive(Debug, Default)]
pub struct Collected {
    pub spans: Vec<Span>,
    pub underlines: UnderlineMap,
    pub images: ImageMap,
    pub pages: usize,
}

fn rect(bbox: &BBox) -> Rect {
    Rect::new(bbox.x0, bbox.y0, bbox.x1, bbox.y1)
}

fn drawing(path: &PathDrawing) -> Drawing {
    let kind = match path.paint {
        Paint::Fill => PaintKind::Fill,
        Paint::Stroke => PaintKind::Stroke,
        Paint::FillStroke => PaintKind::FillStroke,
    };
    Drawing {
        kind,
        fill: path.fill,
        rect: rect(&path.bbox),
        is_rect: path.is_rect,
    }
}

pub fn image_file_name(page: u32, index: usize) -> String {
    f!("page{page}_img{index}.png")
}

/// Text runs of one page, in content-stream order.
pub fn page_spans(page: &PageContent) -> Vec<Span> {
    page.text
        .iter()
        .map(|run| Span::new(run.text.clone(), rect(&run.bbox), page.number))
        .collect()
}

pub fn page_drawings(page: &PageContent) -> Vec<Drawing> {
    page.drawings.iter().map(drawing).collect()
}

/// Write every image placed on `page` into `dir` and return the blocks.
fn write_page_images(doc: &Document, page: &PageContent, dir: &Path) -> Result<Vec<ImageBlock>> {
    let mut blocks = Vec::with_capacity(page.images.len());
    for (index, placement) in page.images.iter().enumerate() {
        let file = image_file_name(page.number, index + 1);
        let data = doc
            .image(placement)
            .map_err(Error::from)
            .with_context(|| f!("failed to read image {} on page {}", placement.name, page.number))?;
        if data.format == ImageFormat::Unknown {
            log::warn!(
                "image {} on page {} could not be decoded, writing its raw bytes to {file}",
                placement.name,
                page.number
            );
        }

        let path = dir.join(&file);
        std::fs::write(&path, &data.bytes)
            .with_context(|| f!("failed to write image {}", path.display()))?;
        log::debug!("page {}: wrote {} ({})", page.number, file, data.format);

        blocks.push(ImageBlock {
            file,
            bbox: rect(&placement.bbox),
        });
    }
    Ok(blocks)
}

/// Interpret every page from `start_page` on.
///
/// With `images_dir` set the directory is created and each placed image is
/// written to it; without it no image blocks are produced.
pub fn collect(
    doc: &Document,
    start_page: u32,
    rules: &UnderlineRules,
    images_dir: Option<&Path>,
) -> Result<Collected> {
    let pages = doc.pages_from(start_page).map_err(Error::from)?;
    if pages.is_empty() {
        log::warn!(
            "start page {start_page} is past the last page ({}), nothing to extract",
            doc.page_count()
        );
    }

    if let Some(dir) = images_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| f!("failed to create image directory {}", dir.display()))?;
    }

    let mut collected = Collected {
        pages: pages.len(),
        ..Default::default()
    };
    for page in &pages {
        let spans = page_spans(page);
        let underlines = detect_underlines(&page_drawings(page), rules);
        log::debug!(
            "page {}: {} spans, {} drawings, {} underlines, {} images",
            page.number,
            spans.len(),
            page.drawings.len(),
            underlines.len(),
            page.images.len()
        );

        collected.spans.extend(spans);
        if !underlines.is_empty() {
            collected.underlines.insert(page.number, underlines);
        }
        if let Some(dir) = images_dir {
            let blocks = write_page_images(doc, page, dir)?;
            if !blocks.is_empty() {
                collected.images.insert(page.number, blocks);
            }
        }
    }

    log::info!(
        "collected {} spans, {} underlines and {} images from {} pages",
        collected.spans.len(),
        collected.underlines.values().map(Vec::len).sum::<usize>(),
        collected.images.values().map(Vec::len).sum::<usize>(),
        collected.pages
    );
    Ok(collected)
}
