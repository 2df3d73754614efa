//! Layout engine - maps parameters to per-tile placements.
//!
//! Pure and deterministic: same document size and parameters, same
//! placements. Safe to call on every parameter change.
//!
//! ## Geometry
//!
//! ```text
//!   pitch_x = width  * scale * 1.2 * horizontal_spacing_factor
//!   pitch_y = height * scale * 1.2 * vertical_spacing_factor
//!
//!   center_x = col * pitch_x + row * row_offset_px + width  * scale / 2
//!   center_y = row * pitch_y                       + height * scale / 2
//! ```
//!
//! The row offset cascades: row 3 with an offset of 6 sits 18 units right
//! of row 0, which staircases the rows rather than shifting them all alike.

use serde::Serialize;

use crate::params::LayoutParameters;
use crate::source::SourceDocument;

/// Fixed 20% padding baked into the base pitch.
pub const PITCH_PADDING: f64 = 1.2;

/// Where one tile goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TilePlacement {
    pub row_index: u32,
    pub column_index: u32,
    pub center_x: f64,
    pub center_y: f64,
    /// Rotation about (`center_x`, `center_y`), degrees
    pub rotation_degrees: f64,
    pub scale: f64,
}

/// Center-to-center spacing before the row offset cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pitch {
    pub x: f64,
    pub y: f64,
}

/// Base pitch for a source size and parameter set.
pub fn pitch(intrinsic_width: f64, intrinsic_height: f64, params: &LayoutParameters) -> Pitch {
    Pitch {
        x: intrinsic_width * params.scale * PITCH_PADDING * params.horizontal_spacing_factor,
        y: intrinsic_height * params.scale * PITCH_PADDING * params.vertical_spacing_factor,
    }
}

/// Compute every tile placement for a document.
///
/// Returns exactly `rows * copies` placements in row-major order. Later
/// placements draw on top of earlier ones. Nothing is clipped to a viewport.
pub fn compute_placements(doc: &SourceDocument, params: &LayoutParameters) -> Vec<TilePlacement> {
    compute_placements_for_size(doc.intrinsic_width(), doc.intrinsic_height(), params)
}

/// [`compute_placements`] for a bare intrinsic size.
pub fn compute_placements_for_size(
    intrinsic_width: f64,
    intrinsic_height: f64,
    params: &LayoutParameters,
) -> Vec<TilePlacement> {
    let pitch = pitch(intrinsic_width, intrinsic_height, params);
    let half_w = intrinsic_width * params.scale / 2.0;
    let half_h = intrinsic_height * params.scale / 2.0;

    let mut placements = Vec::with_capacity(params.rows as usize * params.copies as usize);

    for row in 0..params.rows {
        let row_offset = row as f64 * params.row_offset_px as f64;
        let center_y = row as f64 * pitch.y + half_h;

        for col in 0..params.copies {
            placements.push(TilePlacement {
                row_index: row,
                column_index: col,
                center_x: col as f64 * pitch.x + row_offset + half_w,
                center_y,
                rotation_degrees: params.rotation_degrees,
                scale: params.scale,
            });
        }
    }

    placements
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn pitch_matches_reference_values() {
        let params = LayoutParameters {
            scale: 0.17,
            horizontal_spacing_factor: 0.89,
            vertical_spacing_factor: 0.97,
            ..Default::default()
        };
        let p = pitch(100.0, 100.0, &params);
        assert!((p.x - 18.156).abs() < EPS, "pitch_x was {}", p.x);
        assert!((p.y - 19.788).abs() < EPS, "pitch_y was {}", p.y);
    }

    #[test]
    fn count_is_rows_times_copies() {
        for (rows, copies) in [(1, 1), (4, 4), (3, 7), (100, 20)] {
            let params = LayoutParameters { rows, copies, ..Default::default() };
            let placements = compute_placements_for_size(100.0, 100.0, &params);
            assert_eq!(placements.len(), (rows * copies) as usize);
        }
    }

    #[test]
    fn row_major_order() {
        let params = LayoutParameters { rows: 3, copies: 4, ..Default::default() };
        let placements = compute_placements_for_size(100.0, 100.0, &params);

        for (idx, p) in placements.iter().enumerate() {
            assert_eq!(p.row_index as usize, idx / 4);
            assert_eq!(p.column_index as usize, idx % 4);
        }
    }

    #[test]
    fn row_offset_cascades() {
        let params = LayoutParameters {
            rows: 4,
            copies: 1,
            row_offset_px: 6,
            ..Default::default()
        };
        let placements = compute_placements_for_size(100.0, 100.0, &params);
        let half_w = 100.0 * params.scale / 2.0;

        assert!((placements[0].center_x - half_w).abs() < EPS);
        // Row 3: offset 18, not 6.
        assert!((placements[3].center_x - (18.0 + half_w)).abs() < EPS);
    }

    #[test]
    fn negative_offset_shifts_left() {
        let params = LayoutParameters {
            rows: 3,
            copies: 1,
            row_offset_px: -10,
            ..Default::default()
        };
        let placements = compute_placements_for_size(100.0, 100.0, &params);
        let half_w = 100.0 * params.scale / 2.0;
        assert!((placements[2].center_x - (half_w - 20.0)).abs() < EPS);
    }

    #[test]
    fn centers_follow_formula() {
        let params = LayoutParameters {
            rows: 2,
            copies: 3,
            scale: 0.5,
            rotation_degrees: 45.0,
            row_offset_px: 4,
            horizontal_spacing_factor: 1.0,
            vertical_spacing_factor: 0.5,
        };
        let placements = compute_placements_for_size(40.0, 20.0, &params);

        // pitch_x = 40*0.5*1.2 = 24, pitch_y = 20*0.5*1.2*0.5 = 6
        let last = placements.last().unwrap();
        assert_eq!((last.row_index, last.column_index), (1, 2));
        assert!((last.center_x - (2.0 * 24.0 + 4.0 + 10.0)).abs() < EPS);
        assert!((last.center_y - (6.0 + 5.0)).abs() < EPS);
    }

    #[test]
    fn rotation_and_scale_are_uniform() {
        let params = LayoutParameters { rotation_degrees: 123.0, scale: 0.33, ..Default::default() };
        let placements = compute_placements_for_size(50.0, 80.0, &params);
        assert!(placements.iter().all(|p| p.rotation_degrees == 123.0 && p.scale == 0.33));
    }

    #[test]
    fn zero_spacing_stacks_columns() {
        let params = LayoutParameters {
            copies: 5,
            rows: 1,
            horizontal_spacing_factor: 0.0,
            ..Default::default()
        };
        let placements = compute_placements_for_size(100.0, 100.0, &params);
        assert!(placements.iter().all(|p| p.center_x == placements[0].center_x));
    }

    #[test]
    fn deterministic() {
        let params = LayoutParameters::default();
        assert_eq!(
            compute_placements_for_size(64.0, 48.0, &params),
            compute_placements_for_size(64.0, 48.0, &params)
        );
    }

    #[test]
    fn uses_document_intrinsic_size() {
        let doc = SourceDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 50"/>"#,
        )
        .unwrap();
        let params = LayoutParameters { rows: 1, copies: 1, scale: 0.1, ..Default::default() };
        let placements = compute_placements(&doc, &params);
        assert!((placements[0].center_x - 10.0).abs() < EPS);
        assert!((placements[0].center_y - 2.5).abs() < EPS);
    }
}
