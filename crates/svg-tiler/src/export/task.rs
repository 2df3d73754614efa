//! Background exports.
//!
//! Rasterizing a large surface takes long enough to stall an interactive
//! front-end, so exports can run on a worker thread over a snapshot of the
//! surface. The caller polls [`ExportTask::try_take`] from its event loop or
//! blocks on [`ExportTask::wait`].
//!
//! Tasks are never cancelled. If the surface is rebuilt while one is in
//! flight it still finishes and delivers an artifact of the *old* surface;
//! [`ExportTask::is_stale`] tells the caller that happened.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{debug, warn};

use crate::error::{Result, TilerError};
use crate::surface::{RenderSurface, SurfaceSnapshot};

use super::{export_snapshot, ExportArtifact, ExportKind};

/// An export running on a worker thread.
#[derive(Debug)]
pub struct ExportTask {
    kind: ExportKind,
    sequence: u64,
    surface_generation: u64,
    rx: Receiver<Result<ExportArtifact>>,
}

impl ExportTask {
    /// Start exporting `snapshot` in the background.
    ///
    /// `sequence` is a caller-chosen number identifying the request.
    pub fn spawn(kind: ExportKind, snapshot: SurfaceSnapshot, sequence: u64) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let surface_generation = snapshot.generation;

        thread::Builder::new()
            .name(format!("export-{}-{}", kind.file_name(), sequence))
            .spawn(move || {
                let result = export_snapshot(kind, &snapshot);
                // Receiver gone means nobody wants the result any more.
                let _ = tx.send(result);
            })?;

        debug!(?kind, sequence, surface_generation, "export task started");
        Ok(Self {
            kind,
            sequence,
            surface_generation,
            rx,
        })
    }

    pub fn kind(&self) -> ExportKind {
        self.kind
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Generation of the surface the snapshot was taken from.
    pub fn surface_generation(&self) -> u64 {
        self.surface_generation
    }

    /// Whether the surface has been rebuilt since the snapshot was taken.
    pub fn is_stale(&self, surface: &RenderSurface) -> bool {
        surface.generation() != self.surface_generation
    }

    /// Non-blocking poll. `None` while the worker is still busy.
    pub fn try_take(&self) -> Option<Result<ExportArtifact>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!(kind = ?self.kind, sequence = self.sequence, "export worker vanished");
                Some(Err(TilerError::TaskFailed(format!(
                    "{} worker stopped without a result",
                    self.kind.file_name()
                ))))
            }
        }
    }

    /// Block until the worker reports.
    pub fn wait(self) -> Result<ExportArtifact> {
        self.rx.recv().map_err(|_| {
            TilerError::TaskFailed(format!(
                "{} worker stopped without a result",
                self.kind.file_name()
            ))
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_placements;
    use crate::params::LayoutParameters;
    use crate::source::SourceDocument;
    use crate::surface::Viewport;

    fn surface() -> RenderSurface {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20"><rect width="20" height="20"/></svg>"#,
        )
        .unwrap();
        let mut surface = RenderSurface::new(Viewport { width: 80, height: 60 });
        surface.apply(&doc, &compute_placements(&doc, &LayoutParameters::default()));
        surface
    }

    #[test]
    fn wait_delivers_artifact() {
        let surface = surface();
        let task = ExportTask::spawn(ExportKind::Png, surface.snapshot().unwrap(), 1).unwrap();
        let artifact = task.wait().unwrap();
        assert_eq!(artifact.kind, ExportKind::Png);
    }

    #[test]
    fn polling_eventually_yields() {
        let surface = surface();
        let task = ExportTask::spawn(ExportKind::Pdf, surface.snapshot().unwrap(), 7).unwrap();
        assert_eq!(task.sequence(), 7);

        let result = loop {
            if let Some(result) = task.try_take() {
                break result;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        };
        assert_eq!(result.unwrap().kind, ExportKind::Pdf);
    }

    #[test]
    fn rebuild_marks_task_stale_but_still_delivers() {
        let mut surface = surface();
        let task = ExportTask::spawn(ExportKind::Png, surface.snapshot().unwrap(), 1).unwrap();
        assert!(!task.is_stale(&surface));

        surface.reset();
        assert!(task.is_stale(&surface));
        assert!(task.wait().is_ok());
    }
}
