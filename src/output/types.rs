//! Output format and quality configuration
//!
//! This module defines the container formats and quality presets the user
//! picks before recording.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::capture::Resolution;

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webm,
    Mp4,
}

impl OutputFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Webm => "webm",
            OutputFormat::Mp4 => "mp4",
        }
    }

    /// MIME type requested from the recorder for this format
    pub fn preferred_mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Webm => "video/webm;codecs=vp9,opus",
            OutputFormat::Mp4 => "video/mp4",
        }
    }

    /// Container of a (possibly parameterized) MIME type
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        match essence {
            "video/webm" | "audio/webm" => Some(OutputFormat::Webm),
            "video/mp4" | "audio/mp4" => Some(OutputFormat::Mp4),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webm" => Ok(OutputFormat::Webm),
            "mp4" => Ok(OutputFormat::Mp4),
            other => Err(format!("Unknown output format: {other}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Recording quality levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
    /// Uses the caller's [`QualitySettings`]
    Custom,
}

impl QualityPreset {
    /// Settings for a fixed preset; `None` for [`QualityPreset::Custom`]
    pub fn settings(&self) -> Option<QualitySettings> {
        let (width, height, frame_rate, bitrate) = match self {
            QualityPreset::Low => (640, 480, 15, 500_000),
            QualityPreset::Medium => (1280, 720, 30, 2_500_000),
            QualityPreset::High => (1920, 1080, 60, 6_000_000),
            QualityPreset::Custom => return None,
        };
        Some(QualitySettings {
            resolution: Resolution { width, height },
            frame_rate,
            bitrate,
        })
    }
}

impl FromStr for QualityPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            "custom" => Ok(QualityPreset::Custom),
            other => Err(format!("Unknown quality preset: {other}")),
        }
    }
}

/// Concrete quality parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySettings {
    pub resolution: Resolution,
    pub frame_rate: u32,
    /// Video bitrate in bits per second
    pub bitrate: u32,
}

impl Default for QualitySettings {
    fn default() -> Self {
        QualityPreset::Medium.settings().unwrap_or(QualitySettings {
            resolution: Resolution {
                width: 1280,
                height: 720,
            },
            frame_rate: 30,
            bitrate: 2_500_000,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_values() {
        let low = QualityPreset::Low.settings().unwrap();
        assert_eq!(low.resolution, Resolution { width: 640, height: 480 });
        assert_eq!(low.frame_rate, 15);
        assert_eq!(low.bitrate, 500_000);

        let high = QualityPreset::High.settings().unwrap();
        assert_eq!(high.bitrate, 6_000_000);
        assert!(QualityPreset::Custom.settings().is_none());
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(
            OutputFormat::from_mime_type("video/webm;codecs=vp8,opus"),
            Some(OutputFormat::Webm)
        );
        assert_eq!(OutputFormat::from_mime_type("video/mp4"), Some(OutputFormat::Mp4));
        assert_eq!(OutputFormat::from_mime_type("image/gif"), None);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("MP4".parse::<OutputFormat>(), Ok(OutputFormat::Mp4));
        assert!("gif".parse::<OutputFormat>().is_err());
        assert_eq!("high".parse::<QualityPreset>(), Ok(QualityPreset::High));
    }
}
