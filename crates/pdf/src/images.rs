//! Image XObject bytes.
//!
//! Streams that already hold a standalone container (JPEG, JPEG 2000, PNG,
//! ...) are handed back untouched. Raw sample data and CCITT fax streams are
//! re-encoded as PNG so every image can be written to disk and opened by an
//! ordinary viewer.

use std::io::Cursor;

use crate::parser::backend::{LopdfBackend, ObjectRef};
use crate::types::{ImageData, ImageFormat};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Container detection
// ---------------------------------------------------------------------------

/// Detect a container format from its magic bytes.
///
/// Inputs shorter than 8 bytes are always `Unknown`.
pub fn detect_image_format(bytes: &[u8]) -> ImageFormat {
    if bytes.len() < 8 {
        return ImageFormat::Unknown;
    }
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => ImageFormat::Jpeg,
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => ImageFormat::Png,
        [0x00, 0x00, 0x00, 0x0C, b'j', b'P', 0x20, 0x20, ..] => ImageFormat::Jpeg2000,
        [0xFF, 0x4F, 0xFF, 0x51, ..] => ImageFormat::Jpeg2000,
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => ImageFormat::Gif,
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => ImageFormat::Tiff,
        [b'B', b'M', ..] => ImageFormat::Bmp,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => ImageFormat::WebP,
        _ => ImageFormat::Unknown,
    }
}

/// `DCTDecode` streams are JPEG files and `JPXDecode` streams are JPEG 2000
/// codestreams; other filters say nothing about the payload.
pub fn format_from_pdf_filter(filter_name: &str) -> ImageFormat {
    match filter_name {
        "DCTDecode" => ImageFormat::Jpeg,
        "JPXDecode" => ImageFormat::Jpeg2000,
        _ => ImageFormat::Unknown,
    }
}

/// Trust the filter first, then the magic bytes.
pub fn resolve_format(bytes: &[u8], filter: Option<&str>) -> ImageFormat {
    filter
        .map(format_from_pdf_filter)
        .filter(|f| *f != ImageFormat::Unknown)
        .unwrap_or_else(|| detect_image_format(bytes))
}

// ---------------------------------------------------------------------------
// Raw sample decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of `base` colours, `base.channels()` bytes per entry.
    Indexed { base: Box<ColorSpace>, palette: Vec<u8> },
}

impl ColorSpace {
    fn channels(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SampleLayout {
    width: u32,
    height: u32,
    bits_per_component: u8,
    color_space: ColorSpace,
}

impl SampleLayout {
    fn bytes_per_row(&self) -> usize {
        let bits = self.width as usize
            * self.color_space.channels()
            * self.bits_per_component as usize;
        bits.div_ceil(8)
    }

    /// Rows are byte-aligned; sub-byte samples are padded per row.
    fn expected_byte_count(&self) -> usize {
        self.bytes_per_row() * self.height as usize
    }
}

/// Read the sample layout of an image stream. Stencil masks are treated as
/// 1-bit gray.
fn sample_layout(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Option<SampleLayout> {
    let int = |key: &[u8]| dict.get(key).ok().and_then(|o| o.as_i64().ok());
    let width = u32::try_from(int(b"Width")?).ok()?;
    let height = u32::try_from(int(b"Height")?).ok()?;

    let is_mask = dict
        .get(b"ImageMask")
        .ok()
        .and_then(|o| o.as_bool().ok())
        .unwrap_or(false);
    if is_mask {
        return Some(SampleLayout {
            width,
            height,
            bits_per_component: 1,
            color_space: ColorSpace::Gray,
        });
    }

    let bits_per_component = int(b"BitsPerComponent")
        .and_then(|v| u8::try_from(v).ok())
        .unwrap_or(8);
    if !matches!(bits_per_component, 1 | 2 | 4 | 8 | 16) {
        return None;
    }

    let color_space = resolve_color_space(doc, dict.get(b"ColorSpace").ok()?)?;
    Some(SampleLayout {
        width,
        height,
        bits_per_component,
        color_space,
    })
}

fn resolve<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_color_space(doc: &lopdf::Document, obj: &lopdf::Object) -> Option<ColorSpace> {
    match resolve(doc, obj) {
        lopdf::Object::Name(name) => device_space(name),
        lopdf::Object::Array(arr) => {
            let family = resolve(doc, arr.first()?).as_name().ok()?;
            match family {
                b"ICCBased" => {
                    let profile = resolve(doc, arr.get(1)?).as_stream().ok()?;
                    match profile.dict.get(b"N").ok()?.as_i64().ok()? {
                        1 => Some(ColorSpace::Gray),
                        3 => Some(ColorSpace::Rgb),
                        4 => Some(ColorSpace::Cmyk),
                        _ => None,
                    }
                }
                b"Indexed" | b"I" => {
                    let base = resolve_color_space(doc, arr.get(1)?)?;
                    if matches!(base, ColorSpace::Indexed { .. }) {
                        return None;
                    }
                    let palette = match resolve(doc, arr.get(3)?) {
                        lopdf::Object::String(bytes, _) => bytes.clone(),
                        lopdf::Object::Stream(s) => {
                            s.decompressed_content().unwrap_or_else(|_| s.content.clone())
                        }
                        _ => return None,
                    };
                    Some(ColorSpace::Indexed {
                        base: Box::new(base),
                        palette,
                    })
                }
                other => device_space(other),
            }
        }
        _ => None,
    }
}

fn device_space(name: &[u8]) -> Option<ColorSpace> {
    match name {
        b"DeviceGray" | b"CalGray" | b"G" => Some(ColorSpace::Gray),
        b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorSpace::Rgb),
        b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::Cmyk),
        _ => None,
    }
}

/// Unpack samples of any supported bit depth into raw integer values, one
/// per component, dropping row padding.
fn unpack_samples(raw: &[u8], layout: &SampleLayout) -> Vec<u16> {
    let per_row = layout.width as usize * layout.color_space.channels();
    let bpc = layout.bits_per_component as usize;
    let mut samples = Vec::with_capacity(per_row * layout.height as usize);

    for row in raw.chunks_exact(layout.bytes_per_row()) {
        if bpc == 16 {
            samples.extend(
                row.chunks_exact(2)
                    .take(per_row)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
            );
            continue;
        }
        let mask = (1u16 << bpc) - 1;
        samples.extend((0..per_row).map(|i| {
            let bit = i * bpc;
            let shift = 8 - bpc - bit % 8;
            ((row[bit / 8] as u16) >> shift) & mask
        }));
    }
    samples
}

/// Scale a sample to 8 bits.
fn to_u8(sample: u16, bits_per_component: u8) -> u8 {
    let max = (1u32 << bits_per_component) - 1;
    (sample as u32 * 255 / max) as u8
}

/// Convert CMYK bytes to RGB, the naive way PDF viewers fall back to without
/// a colour profile.
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = px[3] as u16;
            let channel = |v: u8| 255u16.saturating_sub((v as u16 + k).min(255)) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

/// Turn raw samples into an RGB or gray image.
fn samples_to_image(raw: &[u8], layout: &SampleLayout) -> Option<image::DynamicImage> {
    if layout.width == 0 || layout.height == 0 || raw.len() < layout.expected_byte_count() {
        return None;
    }
    let raw = &raw[..layout.expected_byte_count()];
    let samples = unpack_samples(raw, layout);
    let bpc = layout.bits_per_component;

    let (space, bytes) = match &layout.color_space {
        ColorSpace::Indexed { base, palette } => {
            let n = base.channels();
            let entries = palette.len() / n;
            if entries == 0 {
                return None;
            }
            let bytes: Vec<u8> = samples
                .iter()
                .flat_map(|&idx| {
                    let start = (idx as usize).min(entries - 1) * n;
                    palette[start..start + n].iter().copied()
                })
                .collect();
            (base.as_ref().clone(), bytes)
        }
        other => (
            other.clone(),
            samples.iter().map(|&s| to_u8(s, bpc)).collect::<Vec<u8>>(),
        ),
    };

    let (w, h) = (layout.width, layout.height);
    match space {
        ColorSpace::Gray => image::GrayImage::from_raw(w, h, bytes).map(image::DynamicImage::ImageLuma8),
        ColorSpace::Rgb => image::RgbImage::from_raw(w, h, bytes).map(image::DynamicImage::ImageRgb8),
        ColorSpace::Cmyk => {
            image::RgbImage::from_raw(w, h, cmyk_to_rgb(&bytes)).map(image::DynamicImage::ImageRgb8)
        }
        ColorSpace::Indexed { .. } => None,
    }
}

fn encode_png(img: &image::DynamicImage) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .ok()?;
    Some(buf)
}

// ---------------------------------------------------------------------------
// CCITT fax
// ---------------------------------------------------------------------------

fn decode_parms(dict: &lopdf::Dictionary) -> Option<&lopdf::Dictionary> {
    match dict.get(b"DecodeParms").ok()? {
        lopdf::Object::Dictionary(d) => Some(d),
        lopdf::Object::Array(arr) => arr.iter().find_map(|o| o.as_dict().ok()),
        _ => None,
    }
}

/// Paint one decoded fax row. Transitions alternate white/black starting
/// with white.
fn fax_row(transitions: &[u16], width: u16) -> Vec<u8> {
    let mut row = vec![255u8; width as usize];
    let mut start = 0u16;
    let mut black = false;
    for end in transitions.iter().copied().chain(std::iter::once(width)) {
        if black {
            let (s, e) = (start.min(width) as usize, end.min(width) as usize);
            row[s..e.max(s)].fill(0);
        }
        start = end;
        black = !black;
    }
    row
}

/// Decode a Group 4 fax stream into a gray image. Group 3 is not supported.
fn decode_ccitt(dict: &lopdf::Dictionary, raw: &[u8]) -> Option<image::DynamicImage> {
    let parms = decode_parms(dict)?;
    let int = |key: &[u8]| parms.get(key).ok().and_then(|o| o.as_i64().ok());

    if int(b"K").unwrap_or(0) >= 0 {
        return None;
    }
    let width = u16::try_from(int(b"Columns").unwrap_or(1728)).ok()?;
    let height = int(b"Rows").and_then(|v| u16::try_from(v).ok());

    let mut pixels: Vec<u8> = Vec::new();
    let mut rows = 0u32;
    fax::decoder::decode_g4(raw.iter().copied(), width, height, |transitions| {
        pixels.extend(fax_row(transitions, width));
        rows += 1;
    })?;

    if rows == 0 {
        return None;
    }
    image::GrayImage::from_raw(width as u32, rows, pixels).map(image::DynamicImage::ImageLuma8)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

fn filter_name(dict: &lopdf::Dictionary) -> Option<String> {
    let name = match dict.get(b"Filter").ok()? {
        lopdf::Object::Name(name) => name.as_slice(),
        // The last filter in a chain decides what the payload is.
        lopdf::Object::Array(arr) => arr.last()?.as_name().ok()?,
        _ => return None,
    };
    Some(String::from_utf8_lossy(name).into_owned())
}

/// Bytes for the image XObject stored at `object`.
///
/// Recognised containers come back as-is, raw samples and CCITT streams as
/// PNG. Anything else is returned undecoded with [`ImageFormat::Unknown`].
pub fn extract_image(backend: &LopdfBackend, object: ObjectRef) -> Result<ImageData, PdfError> {
    let doc = backend.raw_doc();
    let stream = doc
        .get_object(object)
        .and_then(|o| o.as_stream())
        .map_err(|_| PdfError::ImageNotFound(format!("{} {} R", object.0, object.1)))?;

    let filter = filter_name(&stream.dict);
    let png = |img: image::DynamicImage| {
        encode_png(&img).map(|bytes| ImageData {
            object,
            format: ImageFormat::Png,
            bytes,
        })
    };

    if filter.as_deref() == Some("CCITTFaxDecode") {
        if let Some(data) = decode_ccitt(&stream.dict, &stream.content).and_then(png) {
            return Ok(data);
        }
    }

    let bytes = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let format = resolve_format(&bytes, filter.as_deref());
    if format != ImageFormat::Unknown {
        return Ok(ImageData {
            object,
            format,
            bytes,
        });
    }

    let reencoded = sample_layout(doc, &stream.dict)
        .and_then(|layout| samples_to_image(&bytes, &layout))
        .and_then(png);
    Ok(reencoded.unwrap_or(ImageData {
        object,
        format: ImageFormat::Unknown,
        bytes,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
