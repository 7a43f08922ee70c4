use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    CONFIDENCE_FLOOR, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_GESTURE_PORT,
    DEFAULT_HOST, DEFAULT_POSITION_PORT,
};
use crate::shared::observation::FrameSize;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Every tunable of a tracking session.
///
/// Stored as JSON; missing fields take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub gesture_port: u16,
    pub position_port: u16,
    pub model_dir: Option<PathBuf>,
    pub frame_width: u32,
    pub frame_height: u32,
    pub confidence_floor: f64,
    pub stabilizer_window_secs: f64,
    pub stabilizer_threshold: f64,
    pub liveness_threshold_secs: f64,
    pub liveness_interval_secs: f64,
    pub position_interval_secs: f64,
    pub position_epsilon: f64,
    pub emit_combined: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            gesture_port: DEFAULT_GESTURE_PORT,
            position_port: DEFAULT_POSITION_PORT,
            model_dir: None,
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            confidence_floor: CONFIDENCE_FLOOR,
            stabilizer_window_secs: 1.0,
            stabilizer_threshold: 0.9,
            liveness_threshold_secs: 0.5,
            liveness_interval_secs: 0.5,
            position_interval_secs: 0.03,
            position_epsilon: 0.01,
            emit_combined: false,
        }
    }
}

impl Settings {
    /// `<config_dir>/GestureLink/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("GestureLink").join("settings.json"))
    }

    /// Loads settings from `path`. Unlike [`Settings::load_or_default`],
    /// a missing file is an error here.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads the default settings file if it exists, otherwise returns defaults.
    pub fn load_or_default() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(SettingsError::Invalid(format!(
                "Confidence floor must be between 0.0 and 1.0, got {}",
                self.confidence_floor
            )));
        }
        // A single label can only dominate when the share exceeds one half.
        if !(self.stabilizer_threshold > 0.5 && self.stabilizer_threshold <= 1.0) {
            return Err(SettingsError::Invalid(format!(
                "Stabilizer threshold must be in (0.5, 1.0], got {}",
                self.stabilizer_threshold
            )));
        }
        let durations = [
            ("Stabilizer window", self.stabilizer_window_secs),
            ("Liveness threshold", self.liveness_threshold_secs),
            ("Liveness interval", self.liveness_interval_secs),
            ("Position interval", self.position_interval_secs),
        ];
        for (name, secs) in durations {
            // Must also fit in a `Duration`, which the accessors below rely on.
            if !(secs > 0.0 && Duration::try_from_secs_f64(secs).is_ok()) {
                return Err(SettingsError::Invalid(format!(
                    "{name} must be a positive number of seconds, got {secs}"
                )));
            }
        }
        if self.position_epsilon < 0.0 {
            return Err(SettingsError::Invalid(format!(
                "Position epsilon must not be negative, got {}",
                self.position_epsilon
            )));
        }
        if self.gesture_port == 0 || self.position_port == 0 {
            return Err(SettingsError::Invalid("Ports must be non-zero".into()));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(SettingsError::Invalid(format!(
                "Frame size must be non-zero, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        Ok(())
    }

    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.frame_width, self.frame_height)
    }

    /// Duration accessors expect settings that passed [`Settings::validate`].
    pub fn stabilizer_window(&self) -> Duration {
        Duration::from_secs_f64(self.stabilizer_window_secs)
    }

    pub fn liveness_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.liveness_threshold_secs)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs_f64(self.liveness_interval_secs)
    }

    pub fn position_interval(&self) -> Duration {
        Duration::from_secs_f64(self.position_interval_secs)
    }
}
