//! Render surface - the composed document holding one copy per placement.
//!
//! Every tile is written as
//!
//! ```text
//! <g transform="rotate(angle cx cy)">
//!   <svg x=".." y=".." width=".." height=".." viewBox="0 0 W H" preserveAspectRatio="none">
//!     ...source root element, width/height set to 100%...
//!   </svg>
//! </g>
//! ```
//!
//! The nested `<svg>` sizes and centers the copy; the group rotates it about
//! its own center. The `viewBox` spans the source's intrinsic size, so the
//! copy scales into the box whatever the source declares.
//!
//! Nothing is diffed: [`RenderSurface::apply`] starts from an empty surface
//! every time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::TilePlacement;
use crate::source::SourceDocument;

/// Pixel size of the drawing area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 800 }
    }
}

/// One rendered tile: its placement plus the box the copy is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub placement: TilePlacement,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Tile {
    fn new(placement: TilePlacement, intrinsic_width: f64, intrinsic_height: f64) -> Self {
        let width = intrinsic_width * placement.scale;
        let height = intrinsic_height * placement.scale;
        Self {
            placement,
            x: placement.center_x - width / 2.0,
            y: placement.center_y - height / 2.0,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone)]
struct SurfaceContent {
    tile_markup: String,
    intrinsic_width: f64,
    intrinsic_height: f64,
    tiles: Vec<Tile>,
}

/// Frozen copy of the surface, handed to background exports.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    pub svg: String,
    pub viewport: Viewport,
    pub generation: u64,
}

/// The live drawing target.
#[derive(Debug, Clone, Default)]
pub struct RenderSurface {
    viewport: Viewport,
    content: Option<SurfaceContent>,
    generation: u64,
}

impl RenderSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            content: None,
            generation: 0,
        }
    }

    /// Drop all content. Calling it twice is the same as calling it once.
    pub fn reset(&mut self) {
        self.content = None;
        self.generation += 1;
    }

    /// Rebuild the surface: one tile per placement, in placement order.
    pub fn apply(&mut self, doc: &SourceDocument, placements: &[TilePlacement]) {
        self.reset();

        let tiles = placements
            .iter()
            .map(|p| Tile::new(*p, doc.intrinsic_width(), doc.intrinsic_height()))
            .collect::<Vec<_>>();

        debug!(tiles = tiles.len(), generation = self.generation, "surface rebuilt");

        self.content = Some(SurfaceContent {
            tile_markup: doc.tile_markup().to_string(),
            intrinsic_width: doc.intrinsic_width(),
            intrinsic_height: doc.intrinsic_height(),
            tiles,
        });
    }

    /// Whether a document has been applied since the last reset.
    pub fn is_initialized(&self) -> bool {
        self.content.is_some()
    }

    pub fn tiles(&self) -> &[Tile] {
        self.content.as_ref().map_or(&[], |c| c.tiles.as_slice())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Resize the drawing area. Tiles keep their positions.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.generation += 1;
    }

    /// Bumped by every reset, rebuild and resize.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Serialize the composed document, or `None` before the first apply.
    pub fn to_svg(&self) -> Option<String> {
        let content = self.content.as_ref()?;
        let Viewport { width, height } = self.viewport;

        let mut svg = String::with_capacity(
            256 + content.tiles.len() * (content.tile_markup.len() + 160),
        );
        svg.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}" viewBox="0 0 {} {}">
"#,
            width, height, width, height
        ));

        for tile in &content.tiles {
            let p = &tile.placement;
            svg.push_str(&format!(
                "<g transform=\"rotate({} {} {})\">",
                p.rotation_degrees, p.center_x, p.center_y
            ));
            svg.push_str(&format!(
                "<svg x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" preserveAspectRatio=\"none\">",
                tile.x, tile.y, tile.width, tile.height,
                content.intrinsic_width, content.intrinsic_height
            ));
            svg.push_str(&content.tile_markup);
            svg.push_str("</svg></g>\n");
        }

        svg.push_str("</svg>\n");
        Some(svg)
    }

    /// Freeze the current state for an export running elsewhere.
    pub fn snapshot(&self) -> Option<SurfaceSnapshot> {
        Some(SurfaceSnapshot {
            svg: self.to_svg()?,
            viewport: self.viewport,
            generation: self.generation,
        })
    }
}
