//! Graphics state: transformation matrices, fill colour and path building.

use super::backend::{get_number_from_value, PdfValue};

/// Tolerance used when comparing device-space coordinates.
const EPSILON: f32 = 1e-3;

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// A PDF transformation matrix `[a b c d e f]`, mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [f32; 6]);

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// Read six numeric operands (`cm`, `Tm`).
    pub fn from_operands(operands: &[PdfValue]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        let mut m = [0.0; 6];
        for (slot, val) in m.iter_mut().zip(operands) {
            *slot = get_number_from_value(val)?;
        }
        Some(Matrix(m))
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Length of the transformed y unit vector; the rendered size of a
    /// one-unit glyph.
    pub fn vertical_scale(&self) -> f32 {
        let [_, _, c, d, _, _] = self.0;
        (c * c + d * d).sqrt()
    }

    /// No rotation or skew beyond multiples of 90 degrees.
    pub fn is_axis_aligned(&self) -> bool {
        let [a, b, c, d, _, _] = self.0;
        (b.abs() < EPSILON && c.abs() < EPSILON) || (a.abs() < EPSILON && d.abs() < EPSILON)
    }
}

// ---------------------------------------------------------------------------
// Fill colour
// ---------------------------------------------------------------------------

/// The non-stroking colour space selected with `cs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColourSpace {
    #[default]
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    Pattern,
    /// ICC-based, indexed, separation and friends. Components are guessed
    /// from their count.
    Other,
}

impl ColourSpace {
    pub fn from_name(name: &[u8]) -> Self {
        match name {
            b"DeviceGray" | b"G" | b"CalGray" => ColourSpace::DeviceGray,
            b"DeviceRGB" | b"RGB" | b"CalRGB" => ColourSpace::DeviceRgb,
            b"DeviceCMYK" | b"CMYK" => ColourSpace::DeviceCmyk,
            b"Pattern" => ColourSpace::Pattern,
            _ => ColourSpace::Other,
        }
    }

    /// Colour a space starts with after `cs`.
    pub fn initial_colour(&self) -> Option<[f32; 3]> {
        match self {
            ColourSpace::Pattern => None,
            _ => Some([0.0, 0.0, 0.0]),
        }
    }
}

pub fn gray(g: f32) -> [f32; 3] {
    [g, g, g]
}

pub fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> [f32; 3] {
    [(1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k)]
}

fn numeric_operands(operands: &[PdfValue]) -> Option<Vec<f32>> {
    operands.iter().map(get_number_from_value).collect()
}

/// Resolve the operands of `g`, `rg` and `k` into RGB.
pub fn device_colour(operator: &str, operands: &[PdfValue]) -> Option<[f32; 3]> {
    let v = numeric_operands(operands)?;
    match (operator, v.as_slice()) {
        ("g", [g]) => Some(gray(*g)),
        ("rg", [r, g, b]) => Some([*r, *g, *b]),
        ("k", [c, m, y, k]) => Some(cmyk_to_rgb(*c, *m, *y, *k)),
        _ => None,
    }
}

/// Resolve the operands of `sc` / `scn` against the current colour space.
pub fn space_colour(space: ColourSpace, operands: &[PdfValue]) -> Option<[f32; 3]> {
    if space == ColourSpace::Pattern || matches!(operands.last(), Some(PdfValue::Name(_))) {
        return None;
    }
    let v = numeric_operands(operands)?;
    match (space, v.as_slice()) {
        (ColourSpace::DeviceGray, [g]) => Some(gray(*g)),
        (ColourSpace::DeviceRgb, [r, g, b]) => Some([*r, *g, *b]),
        (ColourSpace::DeviceCmyk, [c, m, y, k]) => Some(cmyk_to_rgb(*c, *m, *y, *k)),
        (ColourSpace::Other, [g]) => Some(gray(*g)),
        (ColourSpace::Other, [r, g, b]) => Some([*r, *g, *b]),
        (ColourSpace::Other, [c, m, y, k]) => Some(cmyk_to_rgb(*c, *m, *y, *k)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Graphics state
// ---------------------------------------------------------------------------

/// The parts of the PDF graphics state the interpreter cares about. Saved
/// and restored as a whole by `q` / `Q`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsState {
    pub ctm: Matrix,
    pub fill_space: ColourSpace,
    pub fill: Option<[f32; 3]>,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            fill_space: ColourSpace::DeviceGray,
            fill: Some([0.0, 0.0, 0.0]),
        }
    }
}

impl GraphicsState {
    /// Apply a colour-setting operator. Returns `false` for anything else.
    pub fn set_fill(&mut self, operator: &str, operands: &[PdfValue]) -> bool {
        match operator {
            "g" | "rg" | "k" => {
                self.fill_space = match operator {
                    "g" => ColourSpace::DeviceGray,
                    "rg" => ColourSpace::DeviceRgb,
                    _ => ColourSpace::DeviceCmyk,
                };
                self.fill = device_colour(operator, operands);
            }
            "cs" => {
                if let Some(PdfValue::Name(name)) = operands.first() {
                    self.fill_space = ColourSpace::from_name(name);
                    self.fill = self.fill_space.initial_colour();
                }
            }
            "sc" | "scn" => self.fill = space_colour(self.fill_space, operands),
            _ => return false,
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Subpath {
    /// Device-space points, control points included.
    points: Vec<(f32, f32)>,
    closed: bool,
    curved: bool,
    /// Built by a single `re` under an axis-aligned CTM.
    aligned_re: bool,
}

/// Accumulates the current path between construction and painting
/// operators. Points are stored in device space.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    subpaths: Vec<Subpath>,
    current: (f32, f32),
}

impl PathBuilder {
    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(|s| s.points.is_empty())
    }

    pub fn clear(&mut self) {
        self.subpaths.clear();
    }

    /// Apply a path-construction operator. Returns `false` for anything
    /// else.
    pub fn apply(&mut self, operator: &str, operands: &[PdfValue], ctm: &Matrix) -> bool {
        let Some(v) = numeric_operands(operands) else {
            return matches!(operator, "m" | "l" | "c" | "v" | "y" | "re" | "h");
        };
        match (operator, v.as_slice()) {
            ("m", [x, y]) => self.move_to(ctm.apply(*x, *y)),
            ("l", [x, y]) => self.line_to(&[ctm.apply(*x, *y)], false),
            ("c", [x1, y1, x2, y2, x3, y3]) => self.line_to(
                &[
                    ctm.apply(*x1, *y1),
                    ctm.apply(*x2, *y2),
                    ctm.apply(*x3, *y3),
                ],
                true,
            ),
            ("v" | "y", [x1, y1, x2, y2]) => {
                self.line_to(&[ctm.apply(*x1, *y1), ctm.apply(*x2, *y2)], true)
            }
            ("re", [x, y, w, h]) => self.rectangle(*x, *y, *w, *h, ctm),
            ("h", []) => self.close(),
            ("m" | "l" | "c" | "v" | "y" | "re" | "h", _) => {}
            _ => return false,
        }
        true
    }

    fn move_to(&mut self, p: (f32, f32)) {
        self.subpaths.push(Subpath {
            points: vec![p],
            ..Subpath::default()
        });
        self.current = p;
    }

    fn line_to(&mut self, points: &[(f32, f32)], curved: bool) {
        if self.subpaths.last().map_or(true, |s| s.closed) {
            let start = self.current;
            self.move_to(start);
        }
        if let Some(sub) = self.subpaths.last_mut() {
            sub.points.extend_from_slice(points);
            sub.curved |= curved;
        }
        if let Some(&last) = points.last() {
            self.current = last;
        }
    }

    fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, ctm: &Matrix) {
        let corners = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
        self.subpaths.push(Subpath {
            points: corners.iter().map(|&(px, py)| ctm.apply(px, py)).collect(),
            closed: true,
            curved: false,
            aligned_re: ctm.is_axis_aligned(),
        });
        self.current = ctm.apply(x, y);
    }

    fn close(&mut self) {
        if let Some(sub) = self.subpaths.last_mut() {
            sub.closed = true;
            if let Some(&first) = sub.points.first() {
                self.current = first;
            }
        }
    }

    /// Every point of every subpath.
    pub fn points(&self) -> Vec<(f32, f32)> {
        self.subpaths
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .collect()
    }

    /// The path is exactly one axis-aligned rectangle: either a single `re`
    /// or a closed straight-edged polygon whose four vertices are the
    /// corners of its bounding box.
    pub fn is_rect(&self) -> bool {
        let non_empty: Vec<&Subpath> = self
            .subpaths
            .iter()
            .filter(|s| !s.points.is_empty())
            .collect();
        let [sub] = non_empty.as_slice() else {
            return false;
        };
        if sub.aligned_re {
            return true;
        }
        if sub.curved {
            return false;
        }

        let mut vertices = sub.points.clone();
        if vertices.len() == 5 && same_point(vertices[0], vertices[4]) {
            vertices.pop();
        } else if !sub.closed {
            return false;
        }
        if vertices.len() != 4 {
            return false;
        }

        let (x0, x1) = min_max(vertices.iter().map(|p| p.0));
        let (y0, y1) = min_max(vertices.iter().map(|p| p.1));
        let on_corner =
            |(x, y): (f32, f32)| (near(x, x0) || near(x, x1)) && (near(y, y0) || near(y, y1));
        let edges_aligned = (0..4).all(|i| {
            let (a, b) = (vertices[i], vertices[(i + 1) % 4]);
            near(a.0, b.0) || near(a.1, b.1)
        });
        vertices.iter().all(|&p| on_corner(p)) && edges_aligned
    }
}

fn near(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn same_point(a: (f32, f32), b: (f32, f32)) -> bool {
    near(a.0, b.0) && near(a.1, b.1)
}

fn min_max(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
