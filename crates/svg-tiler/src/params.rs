//! Layout parameters - the seven user-tunable controls.
//!
//! The layout engine accepts any combination of values; ranges only matter
//! to the controls that produce them, which clamp through [`Param::clamp`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// The user-tunable configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParameters {
    /// Tiles per row
    pub copies: u32,
    /// Number of rows
    pub rows: u32,
    /// Rotation applied to every tile, degrees
    pub rotation_degrees: f64,
    /// Uniform tile scale relative to the source's intrinsic size
    pub scale: f64,
    /// Horizontal shift added per row (cumulative)
    pub row_offset_px: i32,
    /// Multiplier on the base horizontal pitch
    pub horizontal_spacing_factor: f64,
    /// Multiplier on the base vertical pitch
    pub vertical_spacing_factor: f64,
}

impl Default for LayoutParameters {
    fn default() -> Self {
        Self {
            copies: 4,
            rows: 4,
            rotation_degrees: 306.0,
            scale: 0.17,
            row_offset_px: 6,
            horizontal_spacing_factor: 0.89,
            vertical_spacing_factor: 0.97,
        }
    }
}

/// Identifies one control.
///
/// ## Rust Lesson: Enums as Closed Sets
///
/// Listing the controls as an enum lets `match` prove every control is
/// handled - add an eighth and the compiler points at each place to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    Copies,
    Rows,
    Rotation,
    Scale,
    RowOffset,
    HorizontalSpacing,
    VerticalSpacing,
}

/// Slider range of a control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Param {
    /// All controls, in panel order.
    pub fn all() -> &'static [Param] {
        &[
            Param::Copies,
            Param::Rotation,
            Param::Scale,
            Param::Rows,
            Param::RowOffset,
            Param::HorizontalSpacing,
            Param::VerticalSpacing,
        ]
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Param::Copies => "Copies",
            Param::Rows => "Rows",
            Param::Rotation => "Rotation",
            Param::Scale => "Scale",
            Param::RowOffset => "Row Offset",
            Param::HorizontalSpacing => "Horizontal Spacing",
            Param::VerticalSpacing => "Vertical Spacing",
        }
    }

    /// Command-line / config name.
    pub fn name(&self) -> &'static str {
        match self {
            Param::Copies => "copies",
            Param::Rows => "rows",
            Param::Rotation => "rotation",
            Param::Scale => "scale",
            Param::RowOffset => "row-offset",
            Param::HorizontalSpacing => "hspace",
            Param::VerticalSpacing => "vspace",
        }
    }

    /// Look up a control by its [`name`](Param::name).
    pub fn from_name(name: &str) -> Option<Param> {
        Param::all().iter().copied().find(|p| p.name() == name)
    }

    pub fn range(&self) -> ParamRange {
        let (min, max, step) = match self {
            Param::Copies => (1.0, 20.0, 1.0),
            Param::Rows => (1.0, 100.0, 1.0),
            Param::Rotation => (0.0, 360.0, 1.0),
            Param::Scale => (0.01, 0.50, 0.01),
            Param::RowOffset => (-50.0, 50.0, 1.0),
            Param::HorizontalSpacing => (0.0, 1.0, 0.01),
            Param::VerticalSpacing => (0.0, 1.0, 0.01),
        };
        ParamRange { min, max, step }
    }

    /// Clamp into range and snap to the control's step grid.
    pub fn clamp(&self, value: f64) -> f64 {
        let range = self.range();
        if !value.is_finite() {
            return range.min;
        }
        let steps = ((value - range.min) / range.step).round();
        // Rounding to 1e-9 keeps 0.17 from becoming 0.17000000000000004.
        let snapped = ((range.min + steps * range.step) * 1e9).round() / 1e9;
        snapped.clamp(range.min, range.max)
    }
}

impl LayoutParameters {
    /// Current value of one control.
    pub fn get(&self, param: Param) -> f64 {
        match param {
            Param::Copies => self.copies as f64,
            Param::Rows => self.rows as f64,
            Param::Rotation => self.rotation_degrees,
            Param::Scale => self.scale,
            Param::RowOffset => self.row_offset_px as f64,
            Param::HorizontalSpacing => self.horizontal_spacing_factor,
            Param::VerticalSpacing => self.vertical_spacing_factor,
        }
    }

    /// Set one control, clamped to its range.
    pub fn set(&mut self, param: Param, value: f64) {
        let value = param.clamp(value);
        match param {
            Param::Copies => self.copies = value as u32,
            Param::Rows => self.rows = value as u32,
            Param::Rotation => self.rotation_degrees = value,
            Param::Scale => self.scale = value,
            Param::RowOffset => self.row_offset_px = value as i32,
            Param::HorizontalSpacing => self.horizontal_spacing_factor = value,
            Param::VerticalSpacing => self.vertical_spacing_factor = value,
        }
    }

    /// Move one control by a number of steps (negative moves down).
    pub fn step(&mut self, param: Param, steps: i32) {
        let value = self.get(param) + steps as f64 * param.range().step;
        self.set(param, value);
    }

    /// Copy with every control clamped to its range.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for &param in Param::all() {
            out.set(param, self.get(param));
        }
        out
    }

    /// One-line summary shown under the controls.
    pub fn summary(&self) -> String {
        format!(
            "copies={}; rows={}; rot={}°; scale={:.2}; offset={}px; hspace={}%; vspace={}%",
            self.copies,
            self.rows,
            self.rotation_degrees,
            self.scale,
            self.row_offset_px,
            (self.horizontal_spacing_factor * 100.0).round(),
            (self.vertical_spacing_factor * 100.0).round(),
        )
    }
}

impl fmt::Display for LayoutParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_matches_panel_format() {
        let params = LayoutParameters::default();
        assert_eq!(
            params.summary(),
            "copies=4; rows=4; rot=306°; scale=0.17; offset=6px; hspace=89%; vspace=97%"
        );
    }

    #[test]
    fn set_clamps_to_range() {
        let mut params = LayoutParameters::default();
        params.set(Param::Copies, 500.0);
        assert_eq!(params.copies, 20);
        params.set(Param::RowOffset, -80.0);
        assert_eq!(params.row_offset_px, -50);
        params.set(Param::Scale, 0.0);
        assert_eq!(params.scale, 0.01);
    }

    #[test]
    fn step_moves_by_control_step() {
        let mut params = LayoutParameters::default();
        params.step(Param::Scale, 1);
        assert!((params.scale - 0.18).abs() < 1e-12);
        params.step(Param::Rotation, -10);
        assert_eq!(params.rotation_degrees, 296.0);
        params.step(Param::HorizontalSpacing, 20);
        assert_eq!(params.horizontal_spacing_factor, 1.0);
    }

    #[test]
    fn names_round_trip() {
        for &param in Param::all() {
            assert_eq!(Param::from_name(param.name()), Some(param));
        }
        assert_eq!(Param::from_name("zoom"), None);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let params: LayoutParameters = serde_yaml::from_str("copies: 9\nrow_offset_px: -3\n").unwrap();
        assert_eq!(params.copies, 9);
        assert_eq!(params.row_offset_px, -3);
        assert_eq!(params.scale, 0.17);
    }

    #[test]
    fn clamped_leaves_valid_values_alone() {
        let params = LayoutParameters::default();
        assert_eq!(params.clamped(), params);
    }
}
