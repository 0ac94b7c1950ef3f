use std::collections::BTreeMap;

use lopdf::{self, content::Content};

use super::fonts::{FontMetrics, DEFAULT_CID_WIDTH};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// An indirect object identifier mirroring `lopdf::ObjectId`: (object number,
/// generation number).
pub type ObjectRef = (u32, u16);

/// Pages are addressed by the object id of their page dictionary.
pub type PageId = ObjectRef;

/// Elements `[a, b, c, d, e, f]` of a PDF transformation matrix.
pub type MatrixValues = [f32; 6];

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A simplified, lopdf-independent representation of a PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(ObjectRef),
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Where a `Do` operator looks up its XObject name.
///
/// Names used inside a form XObject resolve against the form's own
/// resources first and fall back to the page's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceScope {
    pub page: PageId,
    pub form: Option<ObjectRef>,
}

impl ResourceScope {
    pub fn page(page: PageId) -> Self {
        Self { page, form: None }
    }

    pub fn form(self, form: ObjectRef) -> Self {
        Self {
            page: self.page,
            form: Some(form),
        }
    }
}

/// An XObject resolved from a resource dictionary.
#[derive(Debug, Clone, PartialEq)]
pub enum XObject {
    /// A raster image stream.
    Image { id: ObjectRef },
    /// A form XObject with its decoded content and `/Matrix`.
    Form {
        id: ObjectRef,
        content: Vec<u8>,
        matrix: MatrixValues,
    },
    /// PostScript XObjects and anything unrecognised.
    Other,
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Extract an `f32` from a [`PdfValue`], accepting both `Integer` and `Real`.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a `lopdf::Object` into a [`PdfValue`].
///
/// Stream dictionaries are converted but the stream bytes are dropped.
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        lopdf::Object::Dictionary(dict) => PdfValue::Dict(convert_dict(dict)),
        lopdf::Object::Stream(stream) => PdfValue::Dict(convert_dict(&stream.dict)),
        lopdf::Object::Reference(id) => PdfValue::Reference(*id),
    }
}

fn convert_dict(dict: &lopdf::Dictionary) -> Vec<(Vec<u8>, PdfValue)> {
    dict.iter()
        .map(|(k, v)| (k.clone(), convert_object(v)))
        .collect()
}

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// UTF-16BE with a BOM first, then UTF-8, then Latin-1 byte-for-byte.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        return decode_utf16be(&bytes[2..]);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

fn decode_utf16be(payload: &[u8]) -> String {
    let code_units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&code_units)
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// Abstraction over a PDF parsing backend (currently backed by `lopdf`).
///
/// The page interpreter only talks to this trait, so it can be driven by a
/// mock that hands out pre-decoded operations.
pub trait PdfBackend {
    /// Return a mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// The page's MediaBox `[llx, lly, urx, ury]`, inherited if needed.
    fn media_box(&self, page: PageId) -> Result<[f32; 4], PdfError>;

    /// Return the decompressed content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    /// Decode raw content-stream bytes into a sequence of [`ContentOp`]s.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode the bytes of a text-showing operator using whatever encoding
    /// hints the font on this page provides.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Resolve an XObject name used by a `Do` operator.
    fn xobject(&self, scope: ResourceScope, name: &[u8]) -> Option<XObject>;

    /// Advance widths for a font on this page. `None` makes the text state
    /// estimate widths from the character count.
    fn font_metrics(&self, _page: PageId, _font_name: &[u8]) -> Option<FontMetrics> {
        None
    }
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &lopdf::Document {
        &self.doc
    }

    // -- private helpers ----------------------------------------------------

    fn page_dict(&self, page: PageId) -> Result<&lopdf::Dictionary, PdfError> {
        self.doc
            .get_object(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page object: {}", e)))?
            .as_dict()
            .map_err(|e| PdfError::Parse(format!("page object is not a dictionary: {}", e)))
    }

    /// Look up `key` on a page dictionary, walking up `/Parent` for
    /// inheritable attributes (`MediaBox`, `Resources`).
    fn inherited<'a>(&'a self, dict: &'a lopdf::Dictionary, key: &[u8]) -> Option<&'a lopdf::Object> {
        if let Ok(obj) = dict.get(key) {
            return Some(self.resolve(obj));
        }
        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = self.doc.get_object(parent_id).ok()?.as_dict().ok()?;
        self.inherited(parent, key)
    }

    /// Follow a single level of reference indirection.
    fn resolve<'a>(&'a self, obj: &'a lopdf::Object) -> &'a lopdf::Object {
        match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn xobject_dict_of<'a>(&'a self, resources: &'a lopdf::Object) -> Option<&'a lopdf::Dictionary> {
        let resources = self.resolve(resources).as_dict().ok()?;
        let xobjects = resources.get(b"XObject").ok()?;
        self.resolve(xobjects).as_dict().ok()
    }

    fn page_xobjects(&self, page: PageId) -> Option<&lopdf::Dictionary> {
        let page_dict = self.page_dict(page).ok()?;
        let resources = self.inherited(page_dict, b"Resources")?;
        self.xobject_dict_of(resources)
    }

    fn form_xobjects(&self, form: ObjectRef) -> Option<&lopdf::Dictionary> {
        let stream = self.doc.get_object(form).ok()?.as_stream().ok()?;
        let resources = stream.dict.get(b"Resources").ok()?;
        self.xobject_dict_of(resources)
    }

    fn classify_xobject(&self, obj: &lopdf::Object) -> XObject {
        let Ok(id) = obj.as_reference() else {
            return XObject::Other;
        };
        let Ok(stream) = self.doc.get_object(id).and_then(|o| o.as_stream()) else {
            return XObject::Other;
        };
        let subtype = stream.dict.get(b"Subtype").and_then(|o| o.as_name()).ok();
        match subtype {
            Some(b"Image") => XObject::Image { id },
            Some(b"Form") => {
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                let matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| self.numbers(m).ok())
                    .and_then(|v| <MatrixValues>::try_from(v.as_slice()).ok())
                    .unwrap_or([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
                XObject::Form {
                    id,
                    content,
                    matrix,
                }
            }
            _ => XObject::Other,
        }
    }

    /// Convert an array object (or a reference to one) into `f32` values.
    fn numbers(&self, obj: &lopdf::Object) -> Result<Vec<f32>, PdfError> {
        let arr = self
            .resolve(obj)
            .as_array()
            .map_err(|e| PdfError::Parse(format!("expected array: {}", e)))?;
        arr.iter()
            .map(|item| match self.resolve(item) {
                lopdf::Object::Integer(i) => Ok(*i as f32),
                lopdf::Object::Real(f) => Ok(*f),
                other => Err(PdfError::Parse(format!(
                    "expected number in array, got {:?}",
                    other
                ))),
            })
            .collect()
    }

    fn number(&self, obj: &lopdf::Object) -> Option<f32> {
        match self.resolve(obj) {
            lopdf::Object::Integer(i) => Some(*i as f32),
            lopdf::Object::Real(f) => Some(*f),
            _ => None,
        }
    }

    fn dict_entry<'a>(
        &'a self,
        dict: &'a lopdf::Dictionary,
        key: &[u8],
    ) -> Option<&'a lopdf::Object> {
        dict.get(key).ok().map(|obj| self.resolve(obj))
    }

    /// `/DW` and `/W` of a Type0 font's first descendant.
    fn composite_metrics(&self, font: &lopdf::Dictionary) -> Option<FontMetrics> {
        let descendant = self
            .dict_entry(font, b"DescendantFonts")?
            .as_array()
            .ok()?
            .first()
            .map(|obj| self.resolve(obj))?
            .as_dict()
            .ok()?;
        let default_width = self
            .dict_entry(descendant, b"DW")
            .and_then(|obj| self.number(obj))
            .unwrap_or(DEFAULT_CID_WIDTH);
        let w: Vec<PdfValue> = self
            .dict_entry(descendant, b"W")
            .and_then(|obj| obj.as_array().ok())
            .map(|items| items.iter().map(|obj| convert_object(self.resolve(obj))).collect())
            .unwrap_or_default();
        Some(FontMetrics::composite(default_width, &w))
    }

    /// `/FirstChar` and `/Widths`, with `/MissingWidth` from the descriptor.
    fn simple_metrics(&self, font: &lopdf::Dictionary) -> Option<FontMetrics> {
        let first_char = self.number(self.dict_entry(font, b"FirstChar")?)?;
        let widths = self.numbers(self.dict_entry(font, b"Widths")?).ok()?;
        let missing_width = self
            .dict_entry(font, b"FontDescriptor")
            .and_then(|obj| obj.as_dict().ok())
            .and_then(|descriptor| self.dict_entry(descriptor, b"MissingWidth"))
            .and_then(|obj| self.number(obj))
            .unwrap_or(0.0);
        Some(FontMetrics::simple(
            first_char.max(0.0) as u32,
            &widths,
            missing_width,
        ))
    }

    /// Look up the encoding name for a font on a page.
    fn font_encoding_name(&self, page: PageId, font_name: &[u8]) -> Option<String> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let font_dict = fonts.get(font_name)?;
        let enc_obj = font_dict.get(b"Encoding").ok()?;
        match enc_obj {
            lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PdfBackend implementation for LopdfBackend
// ---------------------------------------------------------------------------

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn media_box(&self, page: PageId) -> Result<[f32; 4], PdfError> {
        let page_dict = self.page_dict(page)?;
        let media_box = self
            .inherited(page_dict, b"MediaBox")
            .ok_or_else(|| PdfError::Parse("MediaBox not found for page".into()))?;
        let nums = self.numbers(media_box)?;
        <[f32; 4]>::try_from(nums.as_slice()).map_err(|_| {
            PdfError::Parse(format!(
                "MediaBox has {} elements, expected 4",
                nums.len()
            ))
        })
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        // Identity-H / Identity-V fonts usually carry 2-byte codes that map
        // straight to Unicode.
        if let Some(enc_name) = self.font_encoding_name(page, font_name) {
            if enc_name.contains("Identity") && bytes.len() >= 2 && bytes.len() % 2 == 0 {
                let decoded = decode_utf16be(bytes);
                if !decoded.is_empty() && !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                    return decoded;
                }
            }
        }

        decode_text_simple(bytes)
    }

    fn xobject(&self, scope: ResourceScope, name: &[u8]) -> Option<XObject> {
        let form_dict = scope.form.and_then(|id| self.form_xobjects(id));
        let page_dict = self.page_xobjects(scope.page);
        form_dict
            .into_iter()
            .chain(page_dict)
            .find_map(|dict| dict.get(name).ok())
            .map(|obj| self.classify_xobject(obj))
    }

    fn font_metrics(&self, page: PageId, font_name: &[u8]) -> Option<FontMetrics> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let font = fonts.get(font_name)?;
        let subtype = font.get(b"Subtype").and_then(|o| o.as_name()).ok();
        if subtype == Some(b"Type0".as_slice()) {
            return self.composite_metrics(font);
        }
        if let Some(metrics) = self.simple_metrics(font) {
            return Some(metrics);
        }
        let base_font = font.get(b"BaseFont").and_then(|o| o.as_name()).ok()?;
        FontMetrics::standard(&String::from_utf8_lossy(base_font))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use lopdf::{dictionary, Document, Object, Stream};

    use super::*;

    #[test]
    fn decode_text_simple_vietnamese_utf8() {
        assert_eq!(decode_text_simple("Câu 1.".as_bytes()), "Câu 1.");
    }

    #[test]
    fn decode_text_simple_latin1_fallback() {
        // 0xE2 is U+00E2 in Latin-1 but not valid standalone UTF-8.
        assert_eq!(decode_text_simple(&[0x43, 0xE2, 0x75]), "Câu");
    }

    #[test]
    fn decode_text_simple_utf16be_with_bom() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x43, 0x00, 0xE2, 0x00, 0x75];
        assert_eq!(decode_text_simple(input), "Câu");
    }

    #[test]
    fn decode_text_simple_utf16be_odd_trailing_byte() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x41, 0x00];
        assert_eq!(decode_text_simple(input), "A");
    }

    #[test]
    fn number_from_value() {
        assert_eq!(get_number_from_value(&PdfValue::Integer(-3)), Some(-3.0));
        assert_eq!(get_number_from_value(&PdfValue::Real(0.8)), Some(0.8));
        assert_eq!(get_number_from_value(&PdfValue::Name(b"F1".to_vec())), None);
    }

    #[test]
    fn convert_stream_keeps_dict_only() {
        let stream = Stream::new(dictionary! { "Subtype" => "Image" }, vec![1, 2, 3]);
        match convert_object(&Object::Stream(stream)) {
            PdfValue::Dict(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].1, PdfValue::Name(b"Image".to_vec()));
            }
            other => panic!("expected Dict, got {:?}", other),
        }
    }

    fn ints(values: &[i64]) -> Vec<Object> {
        values.iter().map(|&v| Object::Integer(v)).collect()
    }

    /// One page inheriting MediaBox and Resources from the page tree, with an
    /// image and a form XObject that has its own image resource.
    fn inherited_resources_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0u8],
        ));
        let inner_image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![255u8],
        ));
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => ints(&[0, 0, 10, 10]),
                "Matrix" => ints(&[2, 0, 0, 2, 5, 5]),
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => inner_image_id },
                },
            },
            b"q 10 0 0 10 0 0 cm /Im0 Do Q".to_vec(),
        ));

        let content_id = doc.add_object(Stream::new(dictionary! {}, b"/Im0 Do /Fm0 Do".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1,
                "MediaBox" => ints(&[0, 0, 595, 842]),
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id, "Fm0" => form_id },
                },
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

    #[test]
    fn media_box_inherited_from_parent() {
        let backend = LopdfBackend::load_bytes(&inherited_resources_pdf()).unwrap();
        let page = backend.pages()[&1];
        assert_eq!(backend.media_box(page).unwrap(), [0.0, 0.0, 595.0, 842.0]);
    }

    #[test]
    fn xobject_resolution_scopes() {
        let backend = LopdfBackend::load_bytes(&inherited_resources_pdf()).unwrap();
        let page = backend.pages()[&1];
        let scope = ResourceScope::page(page);

        let Some(XObject::Image { id: page_image }) = backend.xobject(scope, b"Im0") else {
            panic!("page image not resolved");
        };

        let Some(XObject::Form { id, content, matrix }) = backend.xobject(scope, b"Fm0") else {
            panic!("form not resolved");
        };
        assert_eq!(matrix, [2.0, 0.0, 0.0, 2.0, 5.0, 5.0]);
        assert!(!content.is_empty());

        // Inside the form, Im0 is the form's own image, not the page's.
        let Some(XObject::Image { id: form_image }) = backend.xobject(scope.form(id), b"Im0")
        else {
            panic!("form image not resolved");
        };
        assert_ne!(page_image, form_image);

        assert_eq!(backend.xobject(scope, b"Missing"), None);
    }

    /// One page with a standard font, a font carrying `/Widths` and a Type0
    /// font carrying `/W`.
    fn fonts_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let helvetica = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let descriptor = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => "Custom",
            "MissingWidth" => 300,
        });
        let custom = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "Custom",
            "FirstChar" => 65,
            "LastChar" => 66,
            "Widths" => ints(&[700, 650]),
            "FontDescriptor" => descriptor,
        });
        let cid_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "Custom-CID",
            "DW" => 900,
            "W" => vec![Object::Integer(36), Object::Array(ints(&[520, 480]))],
        });
        let type0 = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Custom-CID",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::from(cid_font)],
        });

        let content_id = doc.add_object(Stream::new(dictionary! {}, b"".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => ints(&[0, 0, 595, 842]),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => helvetica, "F2" => custom, "F3" => type0 },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1,
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

    #[test]
    fn font_metrics_from_each_source() {
        let backend = LopdfBackend::load_bytes(&fonts_pdf()).unwrap();
        let page = backend.pages()[&1];

        let standard = backend.font_metrics(page, b"F1").unwrap();
        assert_eq!(standard.width(b'B' as u32), 667.0);

        let simple = backend.font_metrics(page, b"F2").unwrap();
        assert_eq!(simple.code_len(), 1);
        assert_eq!(simple.width(65), 700.0);
        assert_eq!(simple.width(66), 650.0);
        assert_eq!(simple.width(67), 300.0);

        let composite = backend.font_metrics(page, b"F3").unwrap();
        assert_eq!(composite.code_len(), 2);
        assert_eq!(composite.width(37), 480.0);
        assert_eq!(composite.width(5), 900.0);

        assert!(backend.font_metrics(page, b"F9").is_none());
    }

    #[test]
    fn load_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
