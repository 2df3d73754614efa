//! Exporters - turn the render surface into downloadable artifacts.
//!
//! Three independent conversions:
//!
//! | Kind | File | Produced by |
//! |------|------|-------------|
//! | [`ExportKind::Svg`] | `export.svg` | [`vector::export_vector`] |
//! | [`ExportKind::Png`] | `export.png` | [`raster::export_raster`] |
//! | [`ExportKind::Pdf`] | `export.pdf` | [`document::export_document`] |
//!
//! All of them return `Ok(None)` when the surface has nothing on it yet.
//! The raster and document exporters can also run in the background via
//! [`task::ExportTask`].

pub mod document;
pub mod raster;
pub mod task;
pub mod vector;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::surface::{RenderSurface, SurfaceSnapshot};

/// Which artifact to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Svg,
    Png,
    Pdf,
}

impl ExportKind {
    pub fn all() -> &'static [ExportKind] {
        &[ExportKind::Svg, ExportKind::Png, ExportKind::Pdf]
    }

    /// Download file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportKind::Svg => "export.svg",
            ExportKind::Png => "export.png",
            ExportKind::Pdf => "export.pdf",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportKind::Svg => "image/svg+xml",
            ExportKind::Png => "image/png",
            ExportKind::Pdf => "application/pdf",
        }
    }

    /// Parse `svg` / `png` / `pdf` (case-insensitive).
    pub fn from_name(name: &str) -> Option<ExportKind> {
        match name.to_ascii_lowercase().as_str() {
            "svg" => Some(ExportKind::Svg),
            "png" => Some(ExportKind::Png),
            "pdf" => Some(ExportKind::Pdf),
            _ => None,
        }
    }

    /// Infer the kind from an output path's extension.
    pub fn from_path(path: &Path) -> Option<ExportKind> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(ExportKind::from_name)
    }

    /// Whether producing this kind involves rasterizing.
    pub fn is_raster(&self) -> bool {
        !matches!(self, ExportKind::Svg)
    }
}

/// A produced export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub kind: ExportKind,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(kind: ExportKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }

    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }

    pub fn mime(&self) -> &'static str {
        self.kind.mime()
    }

    /// Write into `dir` under the artifact's file name.
    ///
    /// An existing file of the same name is overwritten.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        self.save_as(&path)?;
        Ok(path)
    }

    /// Write to an explicit path.
    pub fn save_as(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), mime = self.mime(), "wrote export");
        Ok(())
    }
}

/// Produce an artifact from a frozen surface.
pub fn export_snapshot(kind: ExportKind, snapshot: &SurfaceSnapshot) -> Result<ExportArtifact> {
    match kind {
        ExportKind::Svg => Ok(vector::vector_artifact(snapshot)),
        ExportKind::Png => raster::raster_artifact(snapshot),
        ExportKind::Pdf => document::document_artifact(snapshot),
    }
}

/// Produce an artifact from the live surface, synchronously.
///
/// `Ok(None)` when the surface is not initialized.
pub fn export(kind: ExportKind, surface: &RenderSurface) -> Result<Option<ExportArtifact>> {
    match surface.snapshot() {
        Some(snapshot) => export_snapshot(kind, &snapshot).map(Some),
        None => Ok(None),
    }
}
