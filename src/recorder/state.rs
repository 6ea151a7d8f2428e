//! Recording state management
//!
//! Defines the recorder status machine, the data chunks a session collects
//! and the session's pause-aware time bookkeeping.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Current status of the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderStatus {
    /// No recording in progress (possibly initialized and ready to start)
    #[default]
    Idle,
    /// Currently recording
    Recording,
    /// Recording is paused
    Paused,
    /// Stopped, waiting for the last chunk before assembling output
    Processing,
    /// Output artifact assembled
    Completed,
    /// Recording failed
    Error,
}

impl RecorderStatus {
    /// Whether a session is underway and must not be replaced
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RecorderStatus::Recording | RecorderStatus::Paused | RecorderStatus::Processing
        )
    }
}

impl std::fmt::Display for RecorderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecorderStatus::Idle => "idle",
            RecorderStatus::Recording => "recording",
            RecorderStatus::Paused => "paused",
            RecorderStatus::Processing => "processing",
            RecorderStatus::Completed => "completed",
            RecorderStatus::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// An immutable slice of encoded media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    sequence: u64,
    mime_type: String,
    timestamp_ms: u64,
    data: Arc<[u8]>,
}

impl DataChunk {
    pub fn new(sequence: u64, mime_type: impl Into<String>, timestamp_ms: u64, data: Vec<u8>) -> Self {
        Self {
            sequence,
            mime_type: mime_type.into(),
            timestamp_ms,
            data: data.into(),
        }
    }

    /// Position in emission order, starting at 0
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One recording attempt
///
/// Times are milliseconds from the engine's clock.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    id: Uuid,
    stream_id: String,
    mime_type: Option<String>,
    started_at_ms: Option<u64>,
    paused_duration_ms: u64,
    pause_started_at_ms: Option<u64>,
    stopped_at_ms: Option<u64>,
    chunks: Vec<DataChunk>,
    total_bytes: u64,
}

impl RecordingSession {
    pub fn new(stream_id: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stream_id: stream_id.into(),
            mime_type,
            started_at_ms: None,
            paused_duration_ms: 0,
            pause_started_at_ms: None,
            stopped_at_ms: None,
            chunks: Vec::new(),
            total_bytes: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Negotiated MIME type; `None` means the platform default
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    pub fn paused_duration_ms(&self) -> u64 {
        self.paused_duration_ms
    }

    pub fn is_started(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn begin(&mut self, now_ms: u64) {
        self.started_at_ms = Some(now_ms);
        self.paused_duration_ms = 0;
        self.pause_started_at_ms = None;
        self.stopped_at_ms = None;
    }

    pub fn pause(&mut self, now_ms: u64) {
        if self.pause_started_at_ms.is_none() {
            self.pause_started_at_ms = Some(now_ms);
        }
    }

    pub fn resume(&mut self, now_ms: u64) {
        if let Some(paused_at) = self.pause_started_at_ms.take() {
            self.paused_duration_ms += now_ms.saturating_sub(paused_at);
        }
    }

    /// Freeze the clock. A session stopped while paused stays frozen at the
    /// pause time.
    pub fn mark_stopped(&mut self, now_ms: u64) {
        if self.stopped_at_ms.is_none() {
            self.stopped_at_ms = Some(now_ms);
        }
    }

    /// Recorded time excluding pauses
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let Some(started) = self.started_at_ms else {
            return 0;
        };
        let end = self
            .pause_started_at_ms
            .or(self.stopped_at_ms)
            .unwrap_or(now_ms);
        end.saturating_sub(started)
            .saturating_sub(self.paused_duration_ms)
    }

    /// Append a chunk; empty payloads are dropped and yield `None`
    pub fn push_chunk(&mut self, data: Vec<u8>, mime_type: String, now_ms: u64) -> Option<DataChunk> {
        if data.is_empty() {
            return None;
        }
        // Untyped chunks carry the negotiated type
        let mime_type = match (mime_type.is_empty(), &self.mime_type) {
            (true, Some(negotiated)) => negotiated.clone(),
            _ => mime_type,
        };
        let chunk = DataChunk::new(self.chunks.len() as u64, mime_type, now_ms, data);
        self.total_bytes += chunk.size() as u64;
        self.chunks.push(chunk.clone());
        Some(chunk)
    }

    pub fn chunks(&self) -> &[DataChunk] {
        &self.chunks
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

/// Point-in-time view of the recorder for status reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderSnapshot {
    pub status: RecorderStatus,
    pub duration_ms: u64,
    pub chunk_count: usize,
    pub total_bytes: u64,
    pub mime_type: Option<String>,
    pub error: Option<String>,
}
