//! Stitcher settings with persistence
//!
//! Settings are read from `~/.config/stitcher/settings.toml` unless a path is
//! given, then environment variables override individual values.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stitcher_core::IsolationConfig;
use stitcher_raster::RasterConfig;
use tracing::{info, warn};

/// All stitcher settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitcherSettings {
    pub isolation: IsolationConfig,
    pub raster: RasterConfig,
}

impl StitcherSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stitcher"))
    }

    /// Get the default settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from `path` (or the default location) and apply
    /// environment overrides. Falls back to defaults if the file is missing
    /// or invalid.
    pub fn load(path: Option<&Path>) -> Self {
        let mut settings = match path.map(Path::to_path_buf).or_else(Self::settings_path) {
            Some(path) => Self::load_file(&path),
            None => {
                warn!("Could not determine config directory");
                Self::default()
            }
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings
    }

    fn load_file(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Override values from variables looked up through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn set<T: FromStr>(lookup: &dyn Fn(&str) -> Option<String>, key: &str, target: &mut T) {
            let Some(raw) = lookup(key) else {
                return;
            };
            match raw.trim().parse() {
                Ok(value) => {
                    info!("{} overridden from environment", key);
                    *target = value;
                }
                Err(_) => warn!("Ignoring {}: cannot parse {:?}", key, raw),
            }
        }

        set(
            &lookup,
            "EDGE_EVENT_DETECTION_DISTANCE_FROM_EDGE",
            &mut self.isolation.edge_distance,
        );
        set(&lookup, "MINIMUM_EVENT_LENGTH", &mut self.isolation.minimum_event_length);
        set(&lookup, "OBJECT_ID_MAX_GAP_MS", &mut self.isolation.object_id_max_gap_ms);
        set(
            &lookup,
            "RELATED_EVENT_DETECTION_DURATION_SECONDS",
            &mut self.isolation.related_event_duration_secs,
        );
        set(&lookup, "CAPTURE_RADIUS_METERS", &mut self.raster.capture_radius_meters);
        set(&lookup, "PIXELS_PER_METER", &mut self.raster.pixels_per_meter);
    }

    /// Save settings to `path` (or the default location)
    pub fn save(&self, path: Option<&Path>) -> anyhow::Result<()> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::settings_path) else {
            anyhow::bail!("Could not determine config directory");
        };

        // Create config directory if it doesn't exist
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}
