//! Capture trait definitions
//!
//! Platform-agnostic interface to the host's capture primitives: display
//! capture, camera/microphone capture and device enumeration. Platform
//! errors stay raw here and are mapped into [`super::CaptureError`] by the
//! capture services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use super::stream::MediaTrack;

/// Raw error reported by the host platform
///
/// `name` follows the platform's exception naming (`NotAllowedError`,
/// `NotFoundError`, ...). Nothing outside the capture and recorder
/// boundaries should match on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct PlatformError {
    pub name: String,
    pub message: String,
}

impl PlatformError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new("NotAllowedError", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NotFoundError", message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new("NotSupportedError", message)
    }

    pub fn overconstrained(message: impl Into<String>) -> Self {
        Self::new("OverconstrainedError", message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new("InvalidStateError", message)
    }
}

/// Kind of media device reported by enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// Information about a camera, microphone or speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceInfo {
    /// Unique device ID
    pub device_id: String,

    /// Device kind
    pub kind: DeviceKind,

    /// Human readable name (may be empty before permission is granted)
    pub label: String,

    /// Devices sharing a physical unit share a group ID
    pub group_id: String,
}

impl MediaDeviceInfo {
    /// Label for display, falling back to a shortened device ID
    pub fn display_name(&self) -> String {
        if !self.label.is_empty() {
            return self.label.clone();
        }
        let prefix: String = self.device_id.chars().take(5).collect();
        match self.kind {
            DeviceKind::VideoInput => format!("Webcam {prefix}..."),
            DeviceKind::AudioInput => format!("Microphone {prefix}..."),
            DeviceKind::AudioOutput => format!("Speaker {prefix}..."),
        }
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Frame rate hint (ideal value with an upper bound)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRateRange {
    pub ideal: u32,
    pub max: u32,
}

impl Default for FrameRateRange {
    fn default() -> Self {
        Self { ideal: 30, max: 60 }
    }
}

/// What kind of surface the user should be offered for display capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplaySurface {
    Browser,
    Window,
    Monitor,
}

/// Cursor rendering in display capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorCapture {
    #[default]
    Always,
    Motion,
    Never,
}

/// Video constraints for display capture
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenVideoConstraints {
    pub cursor: CursorCapture,
    pub frame_rate: FrameRateRange,
    pub display_surface: Option<DisplaySurface>,
}

/// Constraints passed to the display capture primitive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMediaConstraints {
    pub video: ScreenVideoConstraints,
    /// Request system audio alongside the display
    pub audio: bool,
}

/// Camera constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoConstraints {
    /// Ideal capture size
    pub ideal: Resolution,
    pub frame_rate: FrameRateRange,
    /// Exact device to open; `None` lets the platform pick
    pub device_id: Option<String>,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal: Resolution {
                width: 1280,
                height: 720,
            },
            frame_rate: FrameRateRange::default(),
            device_id: None,
        }
    }
}

/// Microphone constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
    /// Exact device to open; `None` lets the platform pick
    pub device_id: Option<String>,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
            device_id: None,
        }
    }
}

/// Constraints passed to the camera/microphone capture primitive
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMediaConstraints {
    pub video: Option<VideoConstraints>,
    pub audio: Option<AudioConstraints>,
}

/// Host capture primitives
///
/// Implemented by the embedding platform. Every acquisition may suspend on
/// a permission prompt or device negotiation.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Ask the user for a display, window or tab and return its tracks
    async fn get_display_media(
        &self,
        constraints: &DisplayMediaConstraints,
    ) -> Result<Vec<MediaTrack>, PlatformError>;

    /// Open a camera and/or microphone
    async fn get_user_media(
        &self,
        constraints: &UserMediaConstraints,
    ) -> Result<Vec<MediaTrack>, PlatformError>;

    /// List the devices currently attached
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, PlatformError>;

    /// Re-negotiate constraints on a live video track
    async fn apply_constraints(
        &self,
        track: &MediaTrack,
        constraints: &VideoConstraints,
    ) -> Result<(), PlatformError>;

    /// Fires whenever a device is attached or removed
    fn device_changes(&self) -> broadcast::Receiver<()>;

    /// Whether display capture is available at all
    fn supports_display_capture(&self) -> bool {
        true
    }

    /// Whether display capture can include system audio
    fn supports_system_audio(&self) -> bool {
        false
    }
}
