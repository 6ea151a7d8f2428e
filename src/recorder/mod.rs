//! Recording system module
//!
//! This module implements the recording lifecycle:
//! - MediaRecorderPlatform/MediaRecorderBackend traits for the host's chunked recorder
//! - RecorderEngine, the idle/recording/paused/processing/completed/error state machine
//! - MIME type negotiation and the session's pause-aware clock

pub mod backend;
pub mod clock;
pub mod engine;
pub mod mime;
pub mod state;

pub use backend::{
    BackendState, MediaRecorderBackend, MediaRecorderPlatform, RecorderConnection, RecorderError,
    RecorderOptions, RecorderResult, RecorderSignal,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{RecorderEngine, RecorderEvent};
pub use mime::{resolve_mime_type, RECORDER_MIME_TYPES};
pub use state::{DataChunk, RecorderSnapshot, RecorderStatus, RecordingSession};
