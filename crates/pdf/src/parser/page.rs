//! Page interpretation: one pass over a page's content stream collecting
//! text runs, painted paths and image placements in page space.
//!
//! ```text
//! content ops  ->  text state / graphics state / current path
//!                        |             |               |
//!                    TextRun     ImagePlacement   PathDrawing
//! ```
//!
//! Device coordinates are converted to a top-left origin using the page's
//! MediaBox: `x' = x - llx`, `y' = ury - y`.

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue, ResourceScope, XObject};
use super::graphics::{GraphicsState, Matrix, PathBuilder};
use super::text::{ShownText, TextState, ASCENT_RATIO, DESCENT_RATIO};
use crate::types::{BBox, ImagePlacement, PageContent, Paint, PathDrawing, TextRun};
use crate::PdfError;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 8;

/// Converts PDF user space (bottom-left origin) into page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    llx: f32,
    ury: f32,
    pub width: f32,
    pub height: f32,
}

impl PageFrame {
    pub fn from_media_box([llx, lly, urx, ury]: [f32; 4]) -> Self {
        // Some producers write the corners in the other order.
        let (llx, urx) = (llx.min(urx), llx.max(urx));
        let (lly, ury) = (lly.min(ury), lly.max(ury));
        PageFrame {
            llx,
            ury,
            width: urx - llx,
            height: ury - lly,
        }
    }

    pub fn to_page(&self, (x, y): (f32, f32)) -> (f32, f32) {
        (x - self.llx, self.ury - y)
    }

    /// Bounding box of device-space points in page space.
    pub fn bbox(&self, points: &[(f32, f32)]) -> Option<BBox> {
        let converted: Vec<(f32, f32)> = points.iter().map(|&p| self.to_page(p)).collect();
        BBox::around(&converted)
    }
}

/// Interpret one page. `number` is the 1-based page number reported back in
/// the [`PageContent`].
pub fn interpret_page(
    backend: &dyn PdfBackend,
    number: u32,
    page: PageId,
) -> Result<PageContent, PdfError> {
    let frame = PageFrame::from_media_box(backend.media_box(page)?);
    let raw = backend.page_content(page)?;
    let ops = backend.decode_content(&raw)?;

    let mut interpreter = Interpreter::new(backend, page, frame);
    interpreter.run(&ops, ResourceScope::page(page), 0)?;

    Ok(PageContent {
        number,
        width: frame.width,
        height: frame.height,
        text: interpreter.text_runs,
        drawings: interpreter.drawings,
        images: interpreter.images,
    })
}

struct Interpreter<'a> {
    backend: &'a dyn PdfBackend,
    page: PageId,
    frame: PageFrame,
    gstate: GraphicsState,
    saved: Vec<GraphicsState>,
    text: TextState,
    path: PathBuilder,
    text_runs: Vec<TextRun>,
    drawings: Vec<PathDrawing>,
    images: Vec<ImagePlacement>,
}

impl<'a> Interpreter<'a> {
    fn new(backend: &'a dyn PdfBackend, page: PageId, frame: PageFrame) -> Self {
        Self {
            backend,
            page,
            frame,
            gstate: GraphicsState::default(),
            saved: Vec::new(),
            text: TextState::default(),
            path: PathBuilder::default(),
            text_runs: Vec::new(),
            drawings: Vec::new(),
            images: Vec::new(),
        }
    }

    fn run(&mut self, ops: &[ContentOp], scope: ResourceScope, depth: usize) -> Result<(), PdfError> {
        for op in ops {
            let operator = op.operator.as_str();
            let operands = op.operands.as_slice();
            match operator {
                "q" => self.saved.push(self.gstate),
                "Q" => {
                    if let Some(gstate) = self.saved.pop() {
                        self.gstate = gstate;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        self.gstate.ctm = m.multiply(&self.gstate.ctm);
                    }
                }
                "f" | "F" | "f*" => self.paint(Paint::Fill),
                "S" | "s" => self.paint(Paint::Stroke),
                "B" | "B*" | "b" | "b*" => self.paint(Paint::FillStroke),
                "n" => self.path.clear(),
                "Do" => self.place_xobject(operands, scope, depth)?,
                _ => {
                    if self.text.apply(operator, operands)
                        || self.gstate.set_fill(operator, operands)
                        || self.path.apply(operator, operands, &self.gstate.ctm)
                    {
                        continue;
                    }
                    if let Some(shown) = self.text.show(operator, operands, self.backend, self.page)
                    {
                        self.push_text(shown);
                    }
                }
            }
        }
        Ok(())
    }

    fn push_text(&mut self, shown: ShownText) {
        let render = shown.matrix.multiply(&self.gstate.ctm);
        let size = shown.font_size * render.vertical_scale();
        let start = self.frame.to_page(render.apply(0.0, 0.0));
        let end = self.frame.to_page(render.apply(shown.width, 0.0));
        let baseline = start.1;
        self.text_runs.push(TextRun {
            text: shown.text,
            bbox: BBox::new(
                start.0.min(end.0),
                baseline - ASCENT_RATIO * size,
                start.0.max(end.0),
                baseline + DESCENT_RATIO * size,
            ),
            font_size: size,
        });
    }

    fn paint(&mut self, paint: Paint) {
        if let Some(bbox) = self.frame.bbox(&self.path.points()) {
            self.drawings.push(PathDrawing {
                paint,
                fill: self.gstate.fill,
                bbox,
                is_rect: self.path.is_rect(),
            });
        }
        self.path.clear();
    }

    fn place_xobject(
        &mut self,
        operands: &[PdfValue],
        scope: ResourceScope,
        depth: usize,
    ) -> Result<(), PdfError> {
        let Some(PdfValue::Name(name)) = operands.first() else {
            return Ok(());
        };
        match self.backend.xobject(scope, name) {
            Some(XObject::Image { id }) => {
                let ctm = &self.gstate.ctm;
                let corners = [
                    ctm.apply(0.0, 0.0),
                    ctm.apply(1.0, 0.0),
                    ctm.apply(1.0, 1.0),
                    ctm.apply(0.0, 1.0),
                ];
                if let Some(bbox) = self.frame.bbox(&corners) {
                    self.images.push(ImagePlacement {
                        name: String::from_utf8_lossy(name).into_owned(),
                        object: id,
                        bbox,
                    });
                }
            }
            Some(XObject::Form {
                id,
                content,
                matrix,
            }) if depth < MAX_FORM_DEPTH => {
                let ops = self.backend.decode_content(&content)?;
                let outer = self.gstate;
                let saved_depth = self.saved.len();
                self.gstate.ctm = Matrix(matrix).multiply(&self.gstate.ctm);
                self.run(&ops, scope.form(id), depth + 1)?;
                // Unbalanced q/Q inside the form must not leak out.
                self.saved.truncate(saved_depth);
                self.gstate = outer;
            }
            _ => {}
        }
        Ok(())
    }
}
