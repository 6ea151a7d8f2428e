//! Error types and handling
//!
//! The closed media error taxonomy shared by capture and recording, plus the
//! crate-wide error type that commands return.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CaptureError;
use crate::config::ConfigError;
use crate::output::OutputError;
use crate::recorder::RecorderError;

/// Closed set of failure categories surfaced to the UI
///
/// Every platform error is mapped onto one of these at the capture or
/// recorder boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaErrorKind {
    PermissionDenied,
    DeviceNotFound,
    NotSupported,
    ConstraintsNotSatisfiable,
    RecorderInitFailed,
    EmptyArtifact,
    Unknown,
}

impl MediaErrorKind {
    /// Map a platform error name onto the taxonomy
    pub fn from_platform_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" => MediaErrorKind::PermissionDenied,
            "NotFoundError" => MediaErrorKind::DeviceNotFound,
            "NotSupportedError" => MediaErrorKind::NotSupported,
            "OverconstrainedError" => MediaErrorKind::ConstraintsNotSatisfiable,
            _ => MediaErrorKind::Unknown,
        }
    }

    /// User-facing message for this kind
    pub fn user_message(&self) -> &'static str {
        match self {
            MediaErrorKind::PermissionDenied => "Permission to access media device was denied",
            MediaErrorKind::DeviceNotFound => "The requested media device was not found",
            MediaErrorKind::NotSupported => "This feature is not supported on this platform",
            MediaErrorKind::ConstraintsNotSatisfiable => {
                "The requested media constraints cannot be satisfied"
            }
            MediaErrorKind::RecorderInitFailed => "Failed to initialize the recorder",
            MediaErrorKind::EmptyArtifact => "The recording produced no data",
            MediaErrorKind::Unknown => "An unknown error occurred",
        }
    }

    /// Stable code used in [`ErrorResponse`]
    pub fn code(&self) -> &'static str {
        match self {
            MediaErrorKind::PermissionDenied => "PERMISSION_DENIED",
            MediaErrorKind::DeviceNotFound => "DEVICE_NOT_FOUND",
            MediaErrorKind::NotSupported => "NOT_SUPPORTED",
            MediaErrorKind::ConstraintsNotSatisfiable => "CONSTRAINTS_NOT_SATISFIABLE",
            MediaErrorKind::RecorderInitFailed => "RECORDER_INIT_FAILED",
            MediaErrorKind::EmptyArtifact => "EMPTY_ARTIFACT",
            MediaErrorKind::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for MediaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Recording error: {0}")]
    Recording(#[from] RecorderError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No screen stream available. Capture the screen first.")]
    NoScreenStream,
}

impl AppError {
    /// Taxonomy kind of this error, when it has one
    pub fn kind(&self) -> MediaErrorKind {
        match self {
            AppError::Capture(e) => e.kind(),
            AppError::Recording(e) => e.kind(),
            AppError::Output(e) => e.kind(),
            AppError::NoScreenStream => MediaErrorKind::DeviceNotFound,
            AppError::Io(_) | AppError::Serialization(_) | AppError::Config(_) => {
                MediaErrorKind::Unknown
            }
        }
    }
}

/// Error response for frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            other => other.kind().code(),
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorResponse {}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
