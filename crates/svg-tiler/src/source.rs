//! Source loading - turn SVG text into a [`SourceDocument`].
//!
//! Uses quick-xml to stream through the document once, picking up the root
//! element's `width`/`height`/`viewBox` attributes and the byte span of the
//! root element. usvg is not involved here: it would resolve the document
//! into a render tree, and tiles need the author's markup untouched.
//!
//! ## Intrinsic size
//!
//! The size every downstream spacing computation depends on is resolved in
//! a fixed order:
//!
//! 1. explicit `width` / `height` on the root element
//! 2. the `viewBox` width / height
//! 3. 100 × 100
//!
//! Each axis falls through independently. A value that is missing, does not
//! parse, or is zero counts as absent.
//!
//! ## Tile markup
//!
//! A copy nested into the surface must fill the box it is given, so
//! [`SourceDocument::tile_markup`] rewrites the root's `width`/`height` to
//! `100%`. Left alone, `width="40mm"` would draw the copy 40mm wide inside a
//! 40-unit box. Root attributes holding entity references that only the
//! source's DOCTYPE can resolve (Illustrator's `xmlns="&ns_svg;"`) are dropped
//! from the copy; such references deeper in the document are kept as-is.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, TilerError};

/// MIME type every accepted upload must declare.
pub const SVG_MIME: &str = "image/svg+xml";

/// Size used when neither attributes nor viewBox give one.
pub const FALLBACK_SIZE: f64 = 100.0;

/// Where the default asset lives, relative to the working directory.
pub const DEFAULT_ASSET_PATH: &str = "assets/unicorn.svg";

/// Parsed `viewBox` values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

/// A loaded vector image.
///
/// Immutable once built; a new load replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    raw: String,
    root_start: usize,
    root_end: usize,
    tile_markup: String,
    intrinsic_width: f64,
    intrinsic_height: f64,
    view_box: Option<ViewBox>,
}

/// A user-supplied file together with the MIME type it was declared as.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime: String,
    pub contents: Vec<u8>,
}

/// Where a document comes from.
#[derive(Debug, Clone)]
pub enum Source {
    /// The bundled default asset at the given path.
    DefaultAsset(PathBuf),
    /// A file handed in by the user.
    Upload(UploadedFile),
}

/// Root attributes we care about, still as text.
#[derive(Debug, Default)]
struct RootAttributes {
    width: Option<String>,
    height: Option<String>,
    view_box: Option<String>,
    /// Start tag rebuilt for nesting, size attributes set to `100%`
    tile_tag: String,
}

/// Where the root element sits in the text.
#[derive(Debug)]
struct RootSpan {
    start: usize,
    tag_end: usize,
    end: usize,
    attrs: RootAttributes,
}

impl SourceDocument {
    /// Parse SVG text.
    ///
    /// Fails when the text is not well-formed XML or its root element is not
    /// `<svg>`.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let raw = text.into();
        let RootSpan { start: root_start, tag_end, end: root_end, attrs } = scan_root(&raw)?;
        let tile_markup = format!("{}{}", attrs.tile_tag, &raw[tag_end..root_end]);

        let view_box = attrs.view_box.as_deref().and_then(parse_view_box);

        let intrinsic_width = resolve_dimension(
            attrs.width.as_deref(),
            view_box.map(|vb| vb.width),
        );
        let intrinsic_height = resolve_dimension(
            attrs.height.as_deref(),
            view_box.map(|vb| vb.height),
        );

        debug!(
            intrinsic_width,
            intrinsic_height,
            has_view_box = view_box.is_some(),
            "parsed source document"
        );

        Ok(Self {
            raw,
            root_start,
            root_end,
            tile_markup,
            intrinsic_width,
            intrinsic_height,
            view_box,
        })
    }

    /// The full text the document was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The root `<svg>` element's markup, verbatim.
    ///
    /// Excludes the XML declaration, doctype and any comments outside the
    /// root, so it can be nested inside another document.
    pub fn root_markup(&self) -> &str {
        &self.raw[self.root_start..self.root_end]
    }

    /// Root markup ready to nest into a tile box: same content, with the
    /// root's `width`/`height` set to `100%`.
    pub fn tile_markup(&self) -> &str {
        &self.tile_markup
    }

    pub fn intrinsic_width(&self) -> f64 {
        self.intrinsic_width
    }

    pub fn intrinsic_height(&self) -> f64 {
        self.intrinsic_height
    }

    pub fn view_box(&self) -> Option<ViewBox> {
        self.view_box
    }
}

impl UploadedFile {
    /// Build an upload from in-memory contents.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            contents,
        }
    }

    /// Read a file from disk, declaring its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read(path).map_err(|e| TilerError::LoadFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, mime_for_path(path), contents))
    }
}

/// Load a document from either source.
///
/// Uploads not declared as [`SVG_MIME`] are rejected before their contents
/// are looked at.
pub fn load(source: &Source) -> Result<SourceDocument> {
    match source {
        Source::DefaultAsset(path) => {
            let text = fs::read_to_string(path).map_err(|e| TilerError::LoadFailure {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let doc = SourceDocument::parse(text)?;
            info!(path = %path.display(), "loaded default asset");
            Ok(doc)
        }
        Source::Upload(file) => {
            if file.mime != SVG_MIME {
                return Err(TilerError::InvalidFormat { mime: file.mime.clone() });
            }
            // Lossy like a browser text reader: bad bytes become U+FFFD.
            let text = String::from_utf8_lossy(&file.contents).into_owned();
            let doc = SourceDocument::parse(text)?;
            info!(name = %file.name, bytes = file.contents.len(), "loaded upload");
            Ok(doc)
        }
    }
}

/// Locate the default asset.
///
/// Tries the configured path first, then the same path one directory up
/// (running from inside `crates/`), then a bare file name.
pub fn find_default_asset(configured: &Path) -> Option<PathBuf> {
    let mut candidates = vec![configured.to_path_buf(), Path::new("..").join(configured)];
    if let Some(file_name) = configured.file_name() {
        candidates.push(PathBuf::from(file_name));
    }

    candidates.into_iter().find(|candidate| candidate.exists())
}

/// Declared MIME type for a path, judged by its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "svg" => SVG_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Walk the XML once and return the root element's byte span and attributes.
fn scan_root(text: &str) -> Result<RootSpan> {
    let mut reader = Reader::from_str(text);

    let mut depth = 0usize;
    let mut root: Option<(usize, usize, RootAttributes)> = None;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_none() {
                    let start = markup_start(text, before);
                    let attrs = root_attributes(&e, false)?;
                    root = Some((start, reader.buffer_position() as usize, attrs));
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if root.is_none() {
                    let start = markup_start(text, before);
                    let attrs = root_attributes(&e, true)?;
                    let end = reader.buffer_position() as usize;
                    return Ok(RootSpan { start, tag_end: end, end, attrs });
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some((start, tag_end, attrs)) = root.take() {
                        let end = reader.buffer_position() as usize;
                        return Ok(RootSpan { start, tag_end, end, attrs });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TilerError::Parse(format!(
                    "XML parse error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    match root {
        Some(_) => Err(TilerError::Parse("root element is not closed".to_string())),
        None => Err(TilerError::Parse("document has no root element".to_string())),
    }
}

/// Position of the `<` that opens the element read from `from`.
fn markup_start(text: &str, from: usize) -> usize {
    text[from..].find('<').map_or(from, |offset| from + offset)
}

/// Read the size attributes and rebuild the start tag for nesting.
///
/// Only `width`, `height` and `viewBox` are unescaped; other attributes are
/// copied raw.
fn root_attributes(e: &BytesStart, self_closing: bool) -> Result<RootAttributes> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    if e.local_name().as_ref() != b"svg" {
        return Err(TilerError::Parse(format!("root element is <{}>, expected <svg>", name)));
    }

    let mut attrs = RootAttributes::default();
    let mut tag = format!("<{}", name);

    for attr in e.attributes() {
        let attr = attr.map_err(|e| TilerError::Parse(e.to_string()))?;
        let key = attr.key.as_ref();

        let slot = match key {
            b"width" => &mut attrs.width,
            b"height" => &mut attrs.height,
            b"viewBox" => &mut attrs.view_box,
            _ => {
                if attr.unescape_value().is_err() {
                    debug!(
                        attribute = %String::from_utf8_lossy(key),
                        "dropping root attribute with unresolved entity"
                    );
                    continue;
                }
                push_attribute(&mut tag, key, &attr.value);
                continue;
            }
        };

        let value = attr
            .unescape_value()
            .map_err(|e| TilerError::Parse(e.to_string()))?
            .into_owned();
        if key == b"viewBox" {
            push_attribute(&mut tag, key, &attr.value);
        }
        *slot = Some(value);
    }

    tag.push_str(r#" width="100%" height="100%""#);
    tag.push_str(if self_closing { "/>" } else { ">" });
    attrs.tile_tag = tag;
    Ok(attrs)
}

/// Append ` key="raw"`, switching to single quotes when the raw value holds a
/// double quote.
fn push_attribute(tag: &mut String, key: &[u8], raw: &[u8]) {
    let key = String::from_utf8_lossy(key);
    let value = String::from_utf8_lossy(raw);
    let quote = if value.contains('"') { '\'' } else { '"' };
    tag.push_str(&format!(" {}={}{}{}", key, quote, value, quote));
}

fn parse_view_box(value: &str) -> Option<ViewBox> {
    let vb = svgtypes::ViewBox::from_str(value.trim()).ok()?;
    Some(ViewBox {
        min_x: vb.x,
        min_y: vb.y,
        width: vb.w,
        height: vb.h,
    })
}

/// Leading number of a length attribute (`"120"`, `"120px"`, `"50mm"`).
///
/// Zero and non-finite values count as absent.
fn usable_length(value: &str) -> Option<f64> {
    let length = svgtypes::Length::from_str(value.trim()).ok()?;
    let number = length.number;
    (number.is_finite() && number != 0.0).then_some(number)
}

fn resolve_dimension(attribute: Option<&str>, view_box: Option<f64>) -> f64 {
    attribute
        .and_then(usable_length)
        .or_else(|| view_box.filter(|v| v.is_finite() && *v != 0.0))
        .unwrap_or(FALLBACK_SIZE)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_size_wins_over_view_box() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="120" viewBox="0 0 24 12"/>"#,
        )
        .unwrap();
        assert_eq!(doc.intrinsic_width(), 240.0);
        assert_eq!(doc.intrinsic_height(), 120.0);
    }

    #[test]
    fn view_box_used_when_size_missing() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="5 10 64 32"><rect width="1" height="1"/></svg>"#,
        )
        .unwrap();
        assert_eq!(doc.intrinsic_width(), 64.0);
        assert_eq!(doc.intrinsic_height(), 32.0);
        assert_eq!(
            doc.view_box(),
            Some(ViewBox { min_x: 5.0, min_y: 10.0, width: 64.0, height: 32.0 })
        );
    }

    #[test]
    fn falls_back_to_hundred_square() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><circle r="4"/></svg>"#,
        )
        .unwrap();
        assert_eq!(doc.intrinsic_width(), 100.0);
        assert_eq!(doc.intrinsic_height(), 100.0);
        assert_eq!(doc.view_box(), None);
    }

    #[test]
    fn axes_fall_through_independently() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="300" viewBox="0 0 40 80"/>"#,
        )
        .unwrap();
        assert_eq!(doc.intrinsic_width(), 300.0);
        assert_eq!(doc.intrinsic_height(), 80.0);
    }

    #[test]
    fn zero_and_unparsable_sizes_count_as_absent() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="auto" viewBox="0 0 12 18"/>"#,
        )
        .unwrap();
        assert_eq!(doc.intrinsic_width(), 12.0);
        assert_eq!(doc.intrinsic_height(), 18.0);
    }

    #[test]
    fn units_contribute_leading_number() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="120px" height="50mm"/>"#,
        )
        .unwrap();
        assert_eq!(doc.intrinsic_width(), 120.0);
        assert_eq!(doc.intrinsic_height(), 50.0);
    }

    #[test]
    fn root_markup_skips_prolog() {
        let text = "<?xml version=\"1.0\"?>\n<!-- made by hand -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"root\"><g/></svg>\n";
        let doc = SourceDocument::parse(text).unwrap();
        assert_eq!(
            doc.root_markup(),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"root\"><g/></svg>"
        );
        assert_eq!(doc.raw(), text);
    }

    #[test]
    fn self_closing_root_markup() {
        let doc = SourceDocument::parse(r#"  <svg xmlns="http://www.w3.org/2000/svg"/>"#).unwrap();
        assert_eq!(doc.root_markup(), r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#);
    }

    #[test]
    fn tile_markup_fills_its_box() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="40mm" height='40mm' viewBox="0 0 40 40" id="a"><rect width="20" height="20"/></svg>"#,
        )
        .unwrap();
        assert_eq!(doc.intrinsic_width(), 40.0);
        assert_eq!(
            doc.tile_markup(),
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 40 40" id="a" width="100%" height="100%"><rect width="20" height="20"/></svg>"#
        );
    }

    #[test]
    fn tile_markup_of_self_closing_root() {
        let doc = SourceDocument::parse(r#"<svg xmlns="http://www.w3.org/2000/svg" width="5"/>"#).unwrap();
        assert_eq!(
            doc.tile_markup(),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" height="100%"/>"#
        );
    }

    #[test]
    fn tile_markup_keeps_quotes_valid() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" data-note='say "hi"'/>"#,
        )
        .unwrap();
        assert!(doc.tile_markup().contains(r#"data-note='say "hi"'"#), "{}", doc.tile_markup());
    }

    #[test]
    fn doctype_entity_in_unrelated_attribute_is_accepted() {
        let text = r#"<?xml version="1.0"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd" [
  <!ENTITY ns_svg "http://www.w3.org/2000/svg">
]>
<svg xmlns="&ns_svg;" width="30" height="10"><rect width="30" height="10"/></svg>"#;
        let doc = SourceDocument::parse(text).unwrap();
        assert_eq!(doc.intrinsic_width(), 30.0);
        assert_eq!(doc.intrinsic_height(), 10.0);
        assert!(!doc.tile_markup().contains("&ns_svg;"));
        assert!(doc.tile_markup().starts_with(r#"<svg width="100%" height="100%">"#));
    }

    #[test]
    fn non_svg_root_is_rejected() {
        let result = SourceDocument::parse("<html><body/></html>");
        assert!(matches!(result, Err(TilerError::Parse(_))));
    }

    #[test]
    fn malformed_xml_is_rejected() {
        let result = SourceDocument::parse("<svg><g></svg>");
        assert!(matches!(result, Err(TilerError::Parse(_))));
    }

    #[test]
    fn upload_with_wrong_mime_is_rejected() {
        let file = UploadedFile::new("logo.png", "image/png", b"<svg/>".to_vec());
        let result = load(&Source::Upload(file));
        assert!(matches!(result, Err(TilerError::InvalidFormat { ref mime }) if mime == "image/png"));
    }

    #[test]
    fn upload_with_svg_mime_loads() {
        let file = UploadedFile::new(
            "tile.svg",
            SVG_MIME,
            br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20"/>"#.to_vec(),
        );
        let doc = load(&Source::Upload(file)).unwrap();
        assert_eq!(doc.intrinsic_width(), 10.0);
        assert_eq!(doc.intrinsic_height(), 20.0);
    }

    #[test]
    fn missing_default_asset_is_load_failure() {
        let source = Source::DefaultAsset(PathBuf::from("does/not/exist.svg"));
        assert!(matches!(load(&source), Err(TilerError::LoadFailure { .. })));
    }

    // Cargo runs unit tests from the package directory, so `Cargo.toml` is
    // in the working directory and `../svg-tiler/Cargo.toml` reaches it too.

    #[test]
    fn default_asset_found_at_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.svg");
        fs::write(&path, "<svg/>").unwrap();
        assert_eq!(find_default_asset(&path), Some(path));
    }

    #[test]
    fn default_asset_found_one_directory_up() {
        let configured = Path::new("svg-tiler/Cargo.toml");
        assert!(!configured.exists());
        assert_eq!(
            find_default_asset(configured),
            Some(Path::new("..").join("svg-tiler/Cargo.toml"))
        );
    }

    #[test]
    fn default_asset_found_by_bare_name() {
        let dir = tempfile::tempdir().unwrap();
        let configured = dir.path().join("gone/Cargo.toml");
        assert_eq!(find_default_asset(&configured), Some(PathBuf::from("Cargo.toml")));
    }

    #[test]
    fn default_asset_missing_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_default_asset(&dir.path().join("nope-7f3a.svg")), None);
    }

    #[test]
    fn default_asset_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.svg");
        fs::write(&path, r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 8 6"/>"#).unwrap();

        let doc = load(&Source::DefaultAsset(path)).unwrap();
        assert_eq!((doc.intrinsic_width(), doc.intrinsic_height()), (8.0, 6.0));
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("a/b/tile.SVG")), SVG_MIME);
        assert_eq!(mime_for_path(Path::new("photo.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("README")), "application/octet-stream");
    }
}
