//! Vector export - the composed document as-is.

use crate::surface::{RenderSurface, SurfaceSnapshot};

use super::{ExportArtifact, ExportKind};

/// Serialize the surface to SVG text; `None` before the first apply.
pub fn export_vector(surface: &RenderSurface) -> Option<ExportArtifact> {
    surface.snapshot().map(|snapshot| vector_artifact(&snapshot))
}

pub(crate) fn vector_artifact(snapshot: &SurfaceSnapshot) -> ExportArtifact {
    ExportArtifact::new(ExportKind::Svg, snapshot.svg.clone().into_bytes())
}
