//! The coordinator - owns the document, the parameters and the surface.
//!
//! Front-ends talk to a [`TileController`] only. Every mutation that can
//! change the picture ends in [`TileController::recompute`], which runs the
//! layout engine from scratch and rebuilds the surface.
//!
//! ## Rust Lesson: Owning State in One Place
//!
//! In a reactive UI the document, parameters and canvas live in separate
//! hooks and a framework decides when to re-run things. Here one struct owns
//! all three and `&mut self` methods make every change explicit - the
//! borrow checker guarantees nothing else touches them meanwhile.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::config::TilerConfig;
use crate::error::{Result, TilerError};
use crate::export::task::ExportTask;
use crate::export::{self, ExportArtifact, ExportKind};
use crate::layout::{compute_placements, TilePlacement};
use crate::params::{LayoutParameters, Param};
use crate::source::{self, find_default_asset, Source, SourceDocument, UploadedFile};
use crate::surface::{RenderSurface, Viewport};

/// Top-level coordinator.
#[derive(Debug)]
pub struct TileController {
    config: TilerConfig,
    document: Option<SourceDocument>,
    params: LayoutParameters,
    surface: RenderSurface,
    export_sequence: u64,
}

impl TileController {
    /// A controller with no document loaded yet.
    pub fn new(config: TilerConfig) -> Self {
        let surface = RenderSurface::new(config.viewport);
        let params = config.params;
        Self {
            config,
            document: None,
            params,
            surface,
            export_sequence: 0,
        }
    }

    /// Load the configured default asset.
    ///
    /// On failure the error is logged and returned, and whatever was loaded
    /// before stays.
    pub fn load_default(&mut self) -> Result<()> {
        let configured = self.config.default_asset.clone();
        let path = find_default_asset(&configured).unwrap_or(configured);

        match source::load(&Source::DefaultAsset(path.clone())) {
            Ok(doc) => {
                self.set_document(doc);
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "error loading default SVG");
                Err(e)
            }
        }
    }

    /// Accept a user file. Anything not declared as SVG is rejected and the
    /// current document is kept.
    pub fn upload(&mut self, file: UploadedFile) -> Result<()> {
        match source::load(&Source::Upload(file)) {
            Ok(doc) => {
                self.set_document(doc);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "upload rejected");
                Err(e)
            }
        }
    }

    /// [`upload`](Self::upload) a file from disk.
    pub fn upload_path(&mut self, path: &Path) -> Result<()> {
        let file = UploadedFile::from_path(path).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "upload unreadable");
        })?;
        self.upload(file)
    }

    /// Replace the document wholesale and redraw.
    pub fn set_document(&mut self, doc: SourceDocument) {
        info!(
            width = doc.intrinsic_width(),
            height = doc.intrinsic_height(),
            "document replaced"
        );
        self.document = Some(doc);
        self.recompute();
    }

    pub fn document(&self) -> Option<&SourceDocument> {
        self.document.as_ref()
    }

    pub fn params(&self) -> &LayoutParameters {
        &self.params
    }

    /// Replace all parameters (clamped) and redraw.
    pub fn set_params(&mut self, params: LayoutParameters) {
        self.params = params.clamped();
        self.recompute();
    }

    /// Change one control and redraw.
    pub fn set(&mut self, param: Param, value: f64) {
        self.params.set(param, value);
        self.recompute();
    }

    /// Move one control by `steps` and redraw.
    pub fn step(&mut self, param: Param, steps: i32) {
        self.params.step(param, steps);
        self.recompute();
    }

    /// Back to the configured starting parameters.
    pub fn reset_params(&mut self) {
        self.set_params(self.config.params);
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Resize the drawing area and redraw.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.surface.set_viewport(viewport);
        self.recompute();
    }

    /// Placements for the current document and parameters.
    pub fn placements(&self) -> Vec<TilePlacement> {
        match &self.document {
            Some(doc) => compute_placements(doc, &self.params),
            None => Vec::new(),
        }
    }

    /// Rebuild the surface from scratch. Without a document the surface is
    /// left empty.
    pub fn recompute(&mut self) {
        let Some(doc) = &self.document else {
            self.surface.reset();
            debug!("recompute skipped, no document");
            return;
        };

        let placements = compute_placements(doc, &self.params);
        self.surface.apply(doc, &placements);
        debug!(tiles = placements.len(), params = %self.params, "recomputed");
    }

    /// Export synchronously. `Ok(None)` when nothing is loaded yet.
    pub fn export(&self, kind: ExportKind) -> Result<Option<ExportArtifact>> {
        let artifact = export::export(kind, &self.surface)?;
        if artifact.is_none() {
            debug!(?kind, "export ignored, surface not initialized");
        }
        Ok(artifact)
    }

    /// Export and write into the configured output directory.
    pub fn export_to_output_dir(&self, kind: ExportKind) -> Result<Option<std::path::PathBuf>> {
        match self.export(kind)? {
            Some(artifact) => artifact.save_in(&self.config.output_dir).map(Some),
            None => Ok(None),
        }
    }

    /// Start an export on a worker thread. `Ok(None)` when nothing is
    /// loaded yet.
    pub fn spawn_export(&mut self, kind: ExportKind) -> Result<Option<ExportTask>> {
        let Some(snapshot) = self.surface.snapshot() else {
            debug!(?kind, "export ignored, surface not initialized");
            return Ok(None);
        };

        self.export_sequence += 1;
        ExportTask::spawn(kind, snapshot, self.export_sequence).map(Some)
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }
}

impl Default for TileController {
    fn default() -> Self {
        Self::new(TilerConfig::default())
    }
}

/// Convenience for front-ends: message to show for a failed action.
pub fn user_notice(err: &TilerError) -> String {
    match err {
        TilerError::InvalidFormat { .. } => "Please upload a valid SVG file.".to_string(),
        other => other.to_string(),
    }
}
