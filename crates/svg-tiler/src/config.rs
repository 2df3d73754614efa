//! Configuration files.
//!
//! A config is a YAML or JSON file (picked by extension, YAML otherwise).
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```yaml
//! viewport:
//!   width: 1920
//!   height: 1080
//! output_dir: out
//! params:
//!   copies: 8
//!   rotation_degrees: 45
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TilerError};
use crate::params::LayoutParameters;
use crate::source::DEFAULT_ASSET_PATH;
use crate::surface::Viewport;

/// Everything the controller needs at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilerConfig {
    /// Drawing area in pixels
    pub viewport: Viewport,
    /// Default asset loaded at startup
    pub default_asset: PathBuf,
    /// Directory exports are written into
    pub output_dir: PathBuf,
    /// Initial parameter values
    pub params: LayoutParameters,
}

impl Default for TilerConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            default_asset: PathBuf::from(DEFAULT_ASSET_PATH),
            output_dir: PathBuf::from("."),
            params: LayoutParameters::default(),
        }
    }
}

impl TilerConfig {
    /// Load a config file. Parameter values are clamped to their ranges.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| TilerError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut config = Self::parse(&content, is_json(path))
            .map_err(|e| TilerError::Config(format!("{}: {}", path.display(), e)))?;
        config.params = config.params.clamped();

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn parse(content: &str, json: bool) -> std::result::Result<Self, String> {
        if json {
            serde_json::from_str(content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(content).map_err(|e| e.to_string())
        }
    }

    /// Render as YAML, e.g. to seed a new config file.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| TilerError::Config(e.to_string()))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiler.yaml");
        fs::write(&path, "viewport:\n  width: 320\n  height: 200\nparams:\n  copies: 12\n").unwrap();

        let config = TilerConfig::load(&path).unwrap();
        assert_eq!(config.viewport, Viewport { width: 320, height: 200 });
        assert_eq!(config.params.copies, 12);
        assert_eq!(config.params.rows, 4);
        assert_eq!(config.default_asset, PathBuf::from(DEFAULT_ASSET_PATH));
    }

    #[test]
    fn json_config_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiler.json");
        fs::write(&path, r#"{"output_dir": "exports", "params": {"scale": 0.3}}"#).unwrap();

        let config = TilerConfig::load(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("exports"));
        assert_eq!(config.params.scale, 0.3);
    }

    #[test]
    fn out_of_range_params_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiler.yml");
        fs::write(&path, "params:\n  copies: 99\n  scale: 2.0\n").unwrap();

        let config = TilerConfig::load(&path).unwrap();
        assert_eq!(config.params.copies, 20);
        assert_eq!(config.params.scale, 0.5);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "params: [not, a, map").unwrap();
        assert!(matches!(TilerConfig::load(&path), Err(TilerError::Config(_))));
    }

    #[test]
    fn yaml_round_trip() {
        let config = TilerConfig::default();
        let text = config.to_yaml().unwrap();
        let back: TilerConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
