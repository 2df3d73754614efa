//! Raster export - rasterize the surface with resvg and encode PNG.
//!
//! Exports paint no background: areas without tiles stay fully transparent.
//! Front-ends that need an opaque picture pass one to [`rasterize_on`].

use tiny_skia::{Color, Pixmap, Transform};

use crate::error::{Result, TilerError};
use crate::surface::{RenderSurface, SurfaceSnapshot, Viewport};

use super::{ExportArtifact, ExportKind};

/// Rasterize SVG text at the viewport's pixel size.
pub fn rasterize(svg: &str, viewport: Viewport) -> Result<Pixmap> {
    rasterize_on(svg, viewport, None)
}

/// [`rasterize`] over an optional solid background.
pub fn rasterize_on(svg: &str, viewport: Viewport, background: Option<Color>) -> Result<Pixmap> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| TilerError::Render(e.to_string()))?;

    let mut pixmap = Pixmap::new(viewport.width, viewport.height).ok_or_else(|| {
        TilerError::Render(format!(
            "could not create {}x{} pixmap",
            viewport.width, viewport.height
        ))
    })?;
    if let Some(color) = background {
        pixmap.fill(color);
    }

    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Rasterize the live surface into a PNG artifact.
///
/// `Ok(None)` before the first apply.
pub fn export_raster(surface: &RenderSurface) -> Result<Option<ExportArtifact>> {
    match surface.snapshot() {
        Some(snapshot) => raster_artifact(&snapshot).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn raster_artifact(snapshot: &SurfaceSnapshot) -> Result<ExportArtifact> {
    let pixmap = rasterize(&snapshot.svg, snapshot.viewport)?;
    let png = pixmap
        .encode_png()
        .map_err(|e| TilerError::Encode(e.to_string()))?;
    Ok(ExportArtifact::new(ExportKind::Png, png))
}
