use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::loader::{Layout, LoadOptions};
use crate::render::AxisRemap;
use crate::stats::StatsOptions;

/// Viewer settings read from JSON. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Parent of the operator-selected base folders.
    pub data_dir: PathBuf,
    pub layout: Layout,
    pub extension: String,
    pub remap: String,
    pub ranges: bool,
    pub point_size: f32,
    pub background: [f32; 3],
    /// Raw units (millimetres) to render units.
    pub scale: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("temp"),
            layout: Layout::default(),
            extension: "csv".to_string(),
            remap: "xz-y".to_string(),
            ranges: true,
            point_size: 4.0,
            background: [0.08, 0.08, 0.12],
            scale: 0.001,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str_json(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_str_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Like [`from_json`](Self::from_json), but a missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_json(path)
    }

    pub fn remap(&self) -> Result<AxisRemap, ConfigError> {
        AxisRemap::parse(&self.remap)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            layout: self.layout,
            extension: self.extension.clone(),
            ..LoadOptions::default()
        }
    }

    pub fn stats_options(&self) -> StatsOptions {
        StatsOptions { ranges: self.ranges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{ "layout": "per_label", "ranges": false }"#;
        let cfg = ViewerConfig::from_str_json(json).unwrap();
        assert_eq!(cfg.layout, Layout::PerLabel);
        assert!(!cfg.ranges);
        assert_eq!(cfg.data_dir, PathBuf::from("temp"));
        assert_eq!(cfg.remap().unwrap(), AxisRemap::default());
        assert_eq!(cfg.load_options().joint_count, crate::catalog::JOINT_COUNT);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(ViewerConfig::from_str_json("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ViewerConfig::load_or_default(&dir.path().join("viewer.json")).unwrap();
        assert_eq!(cfg, ViewerConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        fs::write(&path, "{ \"scale\": ").unwrap();
        assert!(matches!(
            ViewerConfig::load_or_default(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn bad_remap_is_reported() {
        let cfg = ViewerConfig {
            remap: "xyx".to_string(),
            ..ViewerConfig::default()
        };
        assert!(matches!(cfg.remap(), Err(ConfigError::Remap(..))));
    }
}
