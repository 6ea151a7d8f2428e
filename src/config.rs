//! Application settings
//!
//! Every field has a default, so a settings file only needs the values it
//! changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::capture::{AudioConstraints, ScreenVideoConstraints, VideoConstraints};
use crate::output::{OutputFormat, QualityPreset, FALLBACK_MIME_TYPE};
use crate::recorder::mime::default_mime_priority;

/// Environment variable naming a settings file
pub const CONFIG_ENV_VAR: &str = "SCREENRECORDER_CONFIG";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderSettings {
    /// Interval between data chunks
    pub timeslice_ms: u64,
    /// How long `stop` waits for the final chunk
    pub flush_timeout_ms: u64,
    /// MIME types to try, best first
    pub mime_types: Vec<String>,
    /// Artifact type when neither the recorder nor the chunks report one
    pub fallback_mime_type: String,
    /// Capacity of the recorder event channel
    pub event_capacity: usize,
}

impl RecorderSettings {
    pub fn timeslice(&self) -> Duration {
        Duration::from_millis(self.timeslice_ms)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            timeslice_ms: 1000,
            flush_timeout_ms: 500,
            mime_types: default_mime_priority(),
            fallback_mime_type: FALLBACK_MIME_TYPE.to_string(),
            event_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureSettings {
    pub screen: ScreenVideoConstraints,
    pub webcam: VideoConstraints,
    pub microphone: AudioConstraints,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputSettings {
    pub format: OutputFormat,
    pub quality: QualityPreset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub recorder: RecorderSettings,
    pub capture: CaptureSettings,
    pub output: OutputSettings,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recorder: RecorderSettings::default(),
            capture: CaptureSettings::default(),
            output: OutputSettings::default(),
            log_filter: "open_screenrecorder_lib=debug,screenrecorder_sim=info".to_string(),
        }
    }
}

impl Settings {
    /// Load and validate settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Settings from the file named by `SCREENRECORDER_CONFIG`, or defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recorder.timeslice_ms == 0 {
            return Err(ConfigError::Invalid("timesliceMs must be positive".into()));
        }
        if self.recorder.event_capacity == 0 {
            return Err(ConfigError::Invalid("eventCapacity must be positive".into()));
        }
        Ok(())
    }
}
