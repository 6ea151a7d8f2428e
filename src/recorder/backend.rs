//! Recording primitive interface
//!
//! Defines the chunked media recorder the engine drives, and the engine's
//! error type.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use super::state::RecorderStatus;
use crate::capture::{MediaStream, PlatformError};
use crate::utils::error::MediaErrorKind;

/// Errors that can occur during recording
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecorderError {
    #[error("Cannot {operation} while the recorder is {status}")]
    InvalidState {
        operation: &'static str,
        status: RecorderStatus,
    },

    #[error("Recorder is not initialized")]
    NotInitialized,

    #[error("Failed to initialize recorder: {0}")]
    InitFailed(String),

    #[error("Capture error: {message}")]
    Capture {
        kind: MediaErrorKind,
        message: String,
    },

    #[error("Recorder did not finish within {0:?} of being stopped")]
    FlushTimeout(Duration),

    #[error("The recording produced no data")]
    EmptyArtifact,
}

impl RecorderError {
    pub fn kind(&self) -> MediaErrorKind {
        match self {
            RecorderError::NotInitialized | RecorderError::InitFailed(_) => {
                MediaErrorKind::RecorderInitFailed
            }
            RecorderError::Capture { kind, .. } => *kind,
            RecorderError::EmptyArtifact => MediaErrorKind::EmptyArtifact,
            RecorderError::InvalidState { .. } | RecorderError::FlushTimeout(_) => {
                MediaErrorKind::Unknown
            }
        }
    }
}

impl From<PlatformError> for RecorderError {
    fn from(error: PlatformError) -> Self {
        RecorderError::Capture {
            kind: MediaErrorKind::from_platform_name(&error.name),
            message: error.to_string(),
        }
    }
}

/// Result type for recording operations
pub type RecorderResult<T> = Result<T, RecorderError>;

/// State reported by the recording primitive itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendState {
    Inactive,
    Recording,
    Paused,
}

/// Options handed to the recording primitive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderOptions {
    /// Container/codec hint; `None` lets the platform choose
    pub mime_type: Option<String>,

    pub video_bits_per_second: Option<u32>,

    pub audio_bits_per_second: Option<u32>,
}

/// Signals delivered by the recording primitive, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderSignal {
    /// A slice of encoded media
    DataAvailable { data: Vec<u8>, mime_type: String },

    /// The recorder has flushed its last chunk and stopped
    Stopped,

    /// A fatal recorder or capture failure
    Error(PlatformError),
}

/// Handle to one platform recorder instance
pub trait MediaRecorderBackend: Send {
    /// Begin recording, emitting a chunk every `timeslice`
    fn start(&mut self, timeslice: Duration) -> Result<(), PlatformError>;

    fn pause(&mut self) -> Result<(), PlatformError>;

    fn resume(&mut self) -> Result<(), PlatformError>;

    /// Request a stop; the final chunk and [`RecorderSignal::Stopped`]
    /// arrive asynchronously
    fn stop(&mut self) -> Result<(), PlatformError>;

    fn state(&self) -> BackendState;

    fn supports_pause(&self) -> bool {
        true
    }

    /// MIME type the recorder actually produces (may be empty)
    fn mime_type(&self) -> String;
}

/// A recorder together with the receiving end of its signals
pub struct RecorderConnection {
    pub recorder: Box<dyn MediaRecorderBackend>,
    pub signals: mpsc::UnboundedReceiver<RecorderSignal>,
}

impl RecorderConnection {
    /// Stop the platform recorder if it is still running
    pub(crate) fn force_stop(&mut self) {
        if self.recorder.state() != BackendState::Inactive {
            if let Err(e) = self.recorder.stop() {
                tracing::warn!("Failed to stop previous recorder: {}", e);
            }
        }
    }
}

/// Factory and capability queries for the recording primitive
pub trait MediaRecorderPlatform: Send + Sync {
    /// Whether a recorder can be created at all
    fn is_available(&self) -> bool {
        true
    }

    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Create a recorder reading from `stream`
    fn create_recorder(
        &self,
        stream: &MediaStream,
        options: &RecorderOptions,
    ) -> Result<RecorderConnection, PlatformError>;
}
