//! # svg-tiler
//!
//! Tile copies of an SVG across a canvas and export the result.
//!
//! The pipeline has four stages:
//!
//! 1. [`source`] - load and validate an SVG, resolve its intrinsic size
//! 2. [`layout`] - compute one [`TilePlacement`] per tile (pure function)
//! 3. [`surface`] - compose the tiles into a single SVG document
//! 4. [`export`] - write that document as SVG, PNG or a one-page PDF
//!
//! [`TileController`] ties them together for front-ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod layout;
pub mod params;
pub mod source;
pub mod surface;

// Re-export common types at crate root for convenience.
pub use config::TilerConfig;
pub use controller::{user_notice, TileController};
pub use error::{Result, TilerError};
pub use export::task::ExportTask;
pub use export::{ExportArtifact, ExportKind};
pub use layout::{compute_placements, pitch, Pitch, TilePlacement};
pub use params::{LayoutParameters, Param, ParamRange};
pub use source::{SourceDocument, UploadedFile, ViewBox};
pub use surface::{RenderSurface, SurfaceSnapshot, Tile, Viewport};
