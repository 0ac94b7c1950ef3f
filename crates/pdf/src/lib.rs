//! Read positioned text, painted paths and placed images out of a PDF.
//!
//! The crate walks each page's content stream once and reports what was
//! painted where, in page space with a top-left origin. It does not resolve
//! glyph widths or lay text out; callers get one [`TextRun`] per
//! text-showing operator.
//!
//! ```no_run
//! let doc = pdf::Document::open("quiz.pdf")?;
//! for number in 1..=doc.page_count() {
//!     let page = doc.page(number)?;
//!     println!("page {}: {} runs", page.number, page.text.len());
//! }
//! # Ok::<(), pdf::PdfError>(())
//! ```

use std::path::Path;

use thiserror::Error;

use parser::backend::{LopdfBackend, PdfBackend};

pub mod images;
pub mod parser;
pub mod types;

pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Image not found: {0}")]
    ImageNotFound(String),
    #[error("Page {0} not found")]
    PageNotFound(u32),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// An opened PDF. Pages are interpreted on demand.
pub struct Document {
    backend: LopdfBackend,
}

impl Document {
    /// Read and parse the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse PDF bytes held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        Ok(Self {
            backend: LopdfBackend::load_bytes(bytes)?,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// Interpret the 1-based page `number`.
    pub fn page(&self, number: u32) -> Result<PageContent, PdfError> {
        let page_id = *self
            .backend
            .pages()
            .get(&number)
            .ok_or(PdfError::PageNotFound(number))?;
        parser::page::interpret_page(&self.backend, number, page_id)
    }

    /// Interpret every page from `start` (1-based, inclusive) to the end.
    pub fn pages_from(&self, start: u32) -> Result<Vec<PageContent>, PdfError> {
        self.backend
            .pages()
            .into_iter()
            .filter(|(number, _)| *number >= start)
            .map(|(number, id)| parser::page::interpret_page(&self.backend, number, id))
            .collect()
    }

    /// Bytes for a placed image, ready to be written to disk.
    pub fn image(&self, placement: &ImagePlacement) -> Result<ImageData, PdfError> {
        images::extract_image(&self.backend, placement.object)
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{dictionary, Object, Stream};

    use super::*;

    fn ints(values: &[i64]) -> Vec<Object> {
        values.iter().map(|&v| Object::Integer(v)).collect()
    }

    /// Two A4 pages. The first has a question, two answers, an underline
    /// exactly as wide as the second answer and a 2x2 RGB image between the question and
    /// the answers. The second page only has text.
    fn quiz_pdf() -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        ));

        let first = b"BT /F1 12 Tf 1 0 0 1 72 760 Tm (C\xe2u 1. What color is the sky?) Tj ET\n\
            q 100 0 0 20 200 735 cm /Im0 Do Q\n\
            BT /F1 12 Tf 1 0 0 1 72 720 Tm (1. Red) Tj ET\n\
            BT /F1 12 Tf 1 0 0 1 72 700 Tm (2. Blue) Tj ET\n\
            0 0 0 rg 72 697 37.4 0.8 re f\n"
            .to_vec();
        let second = b"BT /F1 12 Tf 72 760 Td (C\xe2u 2. Next) Tj ET".to_vec();

        let resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => dictionary! { "Im0" => image_id },
        };
        let mut kids = Vec::new();
        for content in [first, second] {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources.clone(),
                "MediaBox" => ints(&[0, 0, 595, 842]),
            });
            kids.push(Object::from(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_page_content_from_generated_pdf() {
        let doc = Document::from_bytes(&quiz_pdf()).unwrap();
        assert_eq!(doc.page_count(), 2);

        let page = doc.page(1).unwrap();
        let texts: Vec<&str> = page.text.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["Câu 1. What color is the sky?", "1. Red", "2. Blue"]);

        let question = page.text[0].bbox;
        assert!(approx(question.y1, 84.4));
        let blue = page.text[2].bbox;
        // Helvetica advances, not a per-character estimate.
        assert!(approx(blue.x0, 72.0) && approx(blue.x1, 109.356));
        assert!(approx(blue.y1, 144.4));

        assert_eq!(page.drawings.len(), 1);
        let underline = &page.drawings[0];
        assert_eq!(underline.paint, Paint::Fill);
        assert_eq!(underline.fill, Some([0.0, 0.0, 0.0]));
        assert!(underline.is_rect);
        assert!(approx(underline.bbox.y0, 144.2) && approx(underline.bbox.y1, 145.0));
        assert!(approx(underline.bbox.x0, blue.x0) && underline.bbox.x1 >= blue.x1);

        assert_eq!(page.images.len(), 1);
        let image = &page.images[0];
        assert_eq!(image.name, "Im0");
        assert!(approx(image.bbox.x0, 200.0) && approx(image.bbox.y0, 87.0));
        assert!(approx(image.bbox.x1, 300.0) && approx(image.bbox.y1, 107.0));
    }

    #[test]
    fn test_image_bytes_for_placement() {
        let doc = Document::from_bytes(&quiz_pdf()).unwrap();
        let page = doc.page(1).unwrap();
        let data = doc.image(&page.images[0]).unwrap();
        assert_eq!(data.format, ImageFormat::Png);
        assert_eq!(&data.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_pages_from_start_page() {
        let doc = Document::from_bytes(&quiz_pdf()).unwrap();
        let pages = doc.pages_from(2).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 2);
        assert_eq!(pages[0].text[0].text, "Câu 2. Next");
        assert!(pages[0].images.is_empty());

        assert_eq!(doc.pages_from(1).unwrap().len(), 2);
        assert!(doc.pages_from(3).unwrap().is_empty());
    }

    #[test]
    fn test_missing_page() {
        let doc = Document::from_bytes(&quiz_pdf()).unwrap();
        assert!(matches!(doc.page(0), Err(PdfError::PageNotFound(0))));
        assert!(matches!(doc.page(5), Err(PdfError::PageNotFound(5))));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let result = Document::open("/nonexistent/quiz.pdf");
        assert!(matches!(result, Err(PdfError::Io(_))));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(matches!(
            Document::from_bytes(b"%PDF-nope"),
            Err(PdfError::Parse(_))
        ));
    }
}
