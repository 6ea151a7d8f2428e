//! Media acquisition
//!
//! One capture service per role (screen, webcam, microphone), each owning at
//! most one live stream, plus device enumeration. Platform errors are mapped
//! onto [`CaptureError`] here and never travel further.

pub mod audio;
pub mod devices;
pub mod registry;
pub mod screen;
pub mod stream;
pub mod traits;
pub mod webcam;

use thiserror::Error;

use crate::utils::error::MediaErrorKind;

pub use audio::AudioCaptureService;
pub use devices::{DeviceList, DeviceWatcher};
pub use registry::{StreamPresence, StreamRegistry};
pub use screen::{ScreenCaptureOptions, ScreenCaptureService};
pub use stream::{ListenerId, MediaStream, MediaTrack, StreamRole, TrackKind, TrackState};
pub use traits::{
    AudioConstraints, DeviceKind, DisplayMediaConstraints, DisplaySurface, MediaDeviceInfo,
    MediaDevices, PlatformError, Resolution, ScreenVideoConstraints, UserMediaConstraints,
    VideoConstraints,
};
pub use webcam::WebcamService;

/// Errors that can occur while acquiring a stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Constraints not satisfiable: {0}")]
    ConstraintsNotSatisfiable(String),

    #[error("Capture failed: {0}")]
    Unknown(String),
}

impl CaptureError {
    pub fn kind(&self) -> MediaErrorKind {
        match self {
            CaptureError::PermissionDenied(_) => MediaErrorKind::PermissionDenied,
            CaptureError::DeviceNotFound(_) => MediaErrorKind::DeviceNotFound,
            CaptureError::NotSupported(_) => MediaErrorKind::NotSupported,
            CaptureError::ConstraintsNotSatisfiable(_) => MediaErrorKind::ConstraintsNotSatisfiable,
            CaptureError::Unknown(_) => MediaErrorKind::Unknown,
        }
    }
}

impl From<PlatformError> for CaptureError {
    fn from(error: PlatformError) -> Self {
        let kind = MediaErrorKind::from_platform_name(&error.name);
        match kind {
            MediaErrorKind::PermissionDenied => {
                CaptureError::PermissionDenied(kind.user_message().to_string())
            }
            MediaErrorKind::DeviceNotFound => {
                CaptureError::DeviceNotFound(kind.user_message().to_string())
            }
            MediaErrorKind::NotSupported => CaptureError::NotSupported(kind.user_message().to_string()),
            MediaErrorKind::ConstraintsNotSatisfiable => {
                CaptureError::ConstraintsNotSatisfiable(kind.user_message().to_string())
            }
            _ if error.message.is_empty() => CaptureError::Unknown(kind.user_message().to_string()),
            _ => CaptureError::Unknown(error.message),
        }
    }
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;
