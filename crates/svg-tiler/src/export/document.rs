//! Document export - one landscape A4 PDF page holding a raster snapshot.
//!
//! The surface is rasterized exactly like the PNG export and the bitmap is
//! stretched into a fixed 280 × 180 mm box at (10, 10) mm from the top-left
//! corner. No reflow, no further pages.
//!
//! ## Page coordinates
//!
//! PDF measures in points (1/72") from the *bottom*-left corner, so the box
//! is converted from millimeters and flipped vertically:
//!
//! ```text
//!   x_pt = 10 mm                      * 72 / 25.4
//!   y_pt = (210 - 10 - 180) mm        * 72 / 25.4
//! ```
//!
//! The alpha channel travels as a soft mask so transparency survives.

use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};
use tiny_skia::Pixmap;
use tracing::debug;

use crate::error::Result;
use crate::surface::{RenderSurface, SurfaceSnapshot};

use super::raster::rasterize;
use super::{ExportArtifact, ExportKind};

/// Points per millimeter.
pub const MM_TO_PT: f64 = 72.0 / 25.4;

/// A4 landscape.
pub const PAGE_WIDTH_MM: f64 = 297.0;
pub const PAGE_HEIGHT_MM: f64 = 210.0;

/// Image box, measured from the top-left corner.
pub const IMAGE_X_MM: f64 = 10.0;
pub const IMAGE_Y_MM: f64 = 10.0;
pub const IMAGE_WIDTH_MM: f64 = 280.0;
pub const IMAGE_HEIGHT_MM: f64 = 180.0;

const DEFLATE_LEVEL: u8 = 6;
const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// Page size and image box in PDF points (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub image_x: f32,
    pub image_y: f32,
    pub image_width: f32,
    pub image_height: f32,
}

impl PageLayout {
    /// The fixed landscape A4 layout.
    pub fn a4_landscape() -> Self {
        let pt = |mm: f64| (mm * MM_TO_PT) as f32;
        Self {
            page_width: pt(PAGE_WIDTH_MM),
            page_height: pt(PAGE_HEIGHT_MM),
            image_x: pt(IMAGE_X_MM),
            image_y: pt(PAGE_HEIGHT_MM - IMAGE_Y_MM - IMAGE_HEIGHT_MM),
            image_width: pt(IMAGE_WIDTH_MM),
            image_height: pt(IMAGE_HEIGHT_MM),
        }
    }

    /// Matrix mapping the unit square onto the image box.
    fn image_transform(&self) -> [f32; 6] {
        [self.image_width, 0.0, 0.0, self.image_height, self.image_x, self.image_y]
    }
}

/// Rasterize the live surface and embed it in a one-page PDF.
///
/// `Ok(None)` before the first apply.
pub fn export_document(surface: &RenderSurface) -> Result<Option<ExportArtifact>> {
    match surface.snapshot() {
        Some(snapshot) => document_artifact(&snapshot).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn document_artifact(snapshot: &SurfaceSnapshot) -> Result<ExportArtifact> {
    let pixmap = rasterize(&snapshot.svg, snapshot.viewport)?;
    let bytes = write_pdf(&pixmap, PageLayout::a4_landscape());
    Ok(ExportArtifact::new(ExportKind::Pdf, bytes))
}

/// Split premultiplied RGBA into straight RGB and an alpha plane.
fn split_channels(pixmap: &Pixmap) -> (Vec<u8>, Vec<u8>) {
    let count = pixmap.pixels().len();
    let mut rgb = Vec::with_capacity(count * 3);
    let mut alpha = Vec::with_capacity(count);

    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
        alpha.push(c.alpha());
    }

    (rgb, alpha)
}

/// Build the PDF bytes for a single page with the pixmap in its image box.
pub fn write_pdf(pixmap: &Pixmap, layout: PageLayout) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let image_id = Ref::new(4);
    let mask_id = Ref::new(5);
    let content_id = Ref::new(6);
    let info_id = Ref::new(7);

    let (rgb, alpha) = split_channels(pixmap);
    let rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb, DEFLATE_LEVEL);
    let alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha, DEFLATE_LEVEL);
    let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, layout.page_width, layout.page_height));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().x_objects().pair(IMAGE_NAME, image_id);
    page.finish();

    let mut image = pdf.image_xobject(image_id, &rgb);
    image.filter(Filter::FlateDecode);
    image.width(width);
    image.height(height);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    image.s_mask(mask_id);
    image.finish();

    let mut mask = pdf.image_xobject(mask_id, &alpha);
    mask.filter(Filter::FlateDecode);
    mask.width(width);
    mask.height(height);
    mask.color_space().device_gray();
    mask.bits_per_component(8);
    mask.finish();

    let mut content = Content::new();
    content.save_state();
    content.transform(layout.image_transform());
    content.x_object(IMAGE_NAME);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    pdf.document_info(info_id)
        .title(TextStr("Tiled SVG export"))
        .producer(TextStr("svg-tiler"));

    let bytes = pdf.finish();
    debug!(width, height, bytes = bytes.len(), "wrote pdf page");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_placements;
    use crate::params::LayoutParameters;
    use crate::source::SourceDocument;
    use crate::surface::Viewport;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn layout_is_landscape_a4_in_points() {
        let layout = PageLayout::a4_landscape();
        assert!((layout.page_width - 841.89).abs() < 0.01);
        assert!((layout.page_height - 595.28).abs() < 0.01);
        assert!(layout.page_width > layout.page_height);
    }

    #[test]
    fn image_box_is_measured_from_top_left() {
        let layout = PageLayout::a4_landscape();
        let mm = |v: f32| v as f64 / MM_TO_PT;

        assert!((mm(layout.image_x) - 10.0).abs() < 1e-3);
        assert!((mm(layout.image_width) - 280.0).abs() < 1e-3);
        assert!((mm(layout.image_height) - 180.0).abs() < 1e-3);
        // Top edge sits 10 mm below the top of the page.
        let top = mm(layout.image_y + layout.image_height);
        assert!((top - 200.0).abs() < 1e-3);
    }

    #[test]
    fn before_load_produces_nothing() {
        let surface = RenderSurface::new(Viewport::default());
        assert!(export_document(&surface).unwrap().is_none());
    }

    #[test]
    fn produces_single_page_pdf_with_image() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 50 50"><circle cx="25" cy="25" r="20"/></svg>"#,
        )
        .unwrap();
        let mut surface = RenderSurface::new(Viewport { width: 120, height: 80 });
        surface.apply(&doc, &compute_placements(&doc, &LayoutParameters::default()));

        let artifact = export_document(&surface).unwrap().unwrap();
        assert_eq!(artifact.kind, ExportKind::Pdf);
        assert_eq!(artifact.file_name(), "export.pdf");
        assert!(artifact.bytes.starts_with(b"%PDF-"));
        assert!(contains(&artifact.bytes, b"/Image"));
        assert!(contains(&artifact.bytes, b"/SMask"));
        assert!(contains(&artifact.bytes, b"/Count 1"));
    }

    #[test]
    fn split_channels_demultiplies() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 128));

        let (rgb, alpha) = split_channels(&pixmap);
        assert_eq!(alpha, vec![128, 128]);
        assert_eq!(rgb.len(), 6);
        assert!(rgb[0] >= 254, "red should be restored, got {}", rgb[0]);
        assert_eq!(rgb[1], 0);
    }
}
