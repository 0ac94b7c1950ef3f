use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::backend::ObjectRef;

/// Axis-aligned box in page space, top-left origin, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        BBox { x0, y0, x1, y1 }
    }

    /// Smallest box containing all `points`. `None` for an empty slice.
    pub fn around(points: &[(f32, f32)]) -> Option<Self> {
        let (&(x, y), rest) = points.split_first()?;
        Some(rest.iter().fold(BBox::new(x, y, x, y), |b, &(x, y)| BBox {
            x0: b.x0.min(x),
            y0: b.y0.min(y),
            x1: b.x1.max(x),
            y1: b.y1.max(y),
        }))
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// One text-showing operation (`Tj`, `TJ`, `'`, `"`) with its estimated box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Paint {
    Fill,
    Stroke,
    FillStroke,
}

/// A painted path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDrawing {
    pub paint: Paint,
    /// Non-stroking colour at paint time as RGB. `None` for patterns and
    /// colour spaces that cannot be mapped.
    pub fill: Option<[f32; 3]>,
    pub bbox: BBox,
    /// The path was exactly one axis-aligned rectangle.
    pub is_rect: bool,
}

/// An image XObject painted by `Do`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// Resource name used by the `Do` operator.
    pub name: String,
    pub object: ObjectRef,
    pub bbox: BBox,
}

/// Everything the interpreter found on one page, in content-stream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-based page number.
    pub number: u32,
    pub width: f32,
    pub height: f32,
    pub text: Vec<TextRun>,
    pub drawings: Vec<PathDrawing>,
    pub images: Vec<ImagePlacement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Jpeg2000,
    Gif,
    Tiff,
    Bmp,
    WebP,
    Unknown,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Jpeg => write!(f, "jpeg"),
            ImageFormat::Png => write!(f, "png"),
            ImageFormat::Jpeg2000 => write!(f, "jpeg2000"),
            ImageFormat::Gif => write!(f, "gif"),
            ImageFormat::Tiff => write!(f, "tiff"),
            ImageFormat::Bmp => write!(f, "bmp"),
            ImageFormat::WebP => write!(f, "webp"),
            ImageFormat::Unknown => write!(f, "unknown"),
        }
    }
}

/// Image bytes ready to be written to disk.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub object: ObjectRef,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}
