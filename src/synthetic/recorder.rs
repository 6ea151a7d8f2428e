//! In-process recording primitive
//!
//! Recorders created here only emit chunks when told to through a
//! [`SyntheticRecorderHandle`], unless `auto_chunk_bytes` is set, in which
//! case a tokio task emits one chunk per timeslice while recording.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::capture::{MediaStream, PlatformError};
use crate::recorder::backend::{
    BackendState, MediaRecorderBackend, MediaRecorderPlatform, RecorderConnection,
    RecorderOptions, RecorderSignal,
};
use crate::recorder::mime::default_mime_priority;

/// Behaviour of recorders created by [`SyntheticRecorderPlatform`]
#[derive(Debug, Clone)]
pub struct SyntheticRecorderConfig {
    /// Types `is_type_supported` accepts
    pub supported_types: Vec<String>,
    /// Type reported when created without a hint
    pub default_mime_type: String,
    pub supports_pause: bool,
    /// Emit a chunk of this size every timeslice while recording
    pub auto_chunk_bytes: Option<usize>,
    /// Size of the chunk flushed on stop; 0 for none
    pub trailing_chunk_bytes: usize,
    /// Confirm stops with [`RecorderSignal::Stopped`]
    pub signal_stop: bool,
    /// Fail recorder creation with this error
    pub fail_create: Option<PlatformError>,
}

impl Default for SyntheticRecorderConfig {
    fn default() -> Self {
        Self {
            supported_types: default_mime_priority(),
            default_mime_type: "video/webm".to_string(),
            supports_pause: true,
            auto_chunk_bytes: None,
            trailing_chunk_bytes: 0,
            signal_stop: true,
            fail_create: None,
        }
    }
}

struct RecorderShared {
    tx: mpsc::UnboundedSender<RecorderSignal>,
    state: Mutex<BackendState>,
    mime_type: String,
    options: RecorderOptions,
}

impl RecorderShared {
    fn send(&self, signal: RecorderSignal) {
        // The engine may already have dropped the receiver
        let _ = self.tx.send(signal);
    }

    fn chunk(&self, data: Vec<u8>) {
        self.send(RecorderSignal::DataAvailable {
            data,
            mime_type: self.mime_type.clone(),
        });
    }
}

/// Test-side control of one synthetic recorder
#[derive(Clone)]
pub struct SyntheticRecorderHandle {
    shared: Arc<RecorderShared>,
}

impl SyntheticRecorderHandle {
    pub fn emit_chunk(&self, data: Vec<u8>) {
        self.shared.chunk(data);
    }

    pub fn emit_error(&self, error: PlatformError) {
        self.shared.send(RecorderSignal::Error(error));
    }

    /// Stop as if every recorded track had ended
    pub fn emit_stopped(&self) {
        *self.shared.state.lock() = BackendState::Inactive;
        self.shared.send(RecorderSignal::Stopped);
    }

    pub fn state(&self) -> BackendState {
        *self.shared.state.lock()
    }

    /// Options the recorder was created with
    pub fn options(&self) -> RecorderOptions {
        self.shared.options.clone()
    }

    pub fn mime_type(&self) -> &str {
        &self.shared.mime_type
    }
}

struct SyntheticRecorder {
    shared: Arc<RecorderShared>,
    config: SyntheticRecorderConfig,
    ticker: Option<JoinHandle<()>>,
}

impl SyntheticRecorder {
    fn spawn_ticker(&mut self, timeslice: Duration, chunk_bytes: usize) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No tokio runtime, automatic chunks disabled");
            return;
        };
        let shared = self.shared.clone();
        self.ticker = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(timeslice);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let state = *shared.state.lock();
                match state {
                    BackendState::Recording => shared.chunk(vec![0u8; chunk_bytes]),
                    BackendState::Paused => {}
                    BackendState::Inactive => break,
                }
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for SyntheticRecorder {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

impl MediaRecorderBackend for SyntheticRecorder {
    fn start(&mut self, timeslice: Duration) -> Result<(), PlatformError> {
        {
            let mut state = self.shared.state.lock();
            if *state != BackendState::Inactive {
                return Err(PlatformError::invalid_state("Recorder already started"));
            }
            *state = BackendState::Recording;
        }
        if let Some(bytes) = self.config.auto_chunk_bytes {
            self.spawn_ticker(timeslice, bytes);
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlatformError> {
        if !self.config.supports_pause {
            return Err(PlatformError::not_supported("Pause is not supported"));
        }
        let mut state = self.shared.state.lock();
        if *state != BackendState::Recording {
            return Err(PlatformError::invalid_state("Recorder is not recording"));
        }
        *state = BackendState::Paused;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlatformError> {
        let mut state = self.shared.state.lock();
        if *state != BackendState::Paused {
            return Err(PlatformError::invalid_state("Recorder is not paused"));
        }
        *state = BackendState::Recording;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlatformError> {
        {
            let mut state = self.shared.state.lock();
            if *state == BackendState::Inactive {
                return Err(PlatformError::invalid_state("Recorder is not running"));
            }
            *state = BackendState::Inactive;
        }
        self.stop_ticker();
        if self.config.trailing_chunk_bytes > 0 {
            self.shared.chunk(vec![0u8; self.config.trailing_chunk_bytes]);
        }
        if self.config.signal_stop {
            self.shared.send(RecorderSignal::Stopped);
        }
        Ok(())
    }

    fn state(&self) -> BackendState {
        *self.shared.state.lock()
    }

    fn supports_pause(&self) -> bool {
        self.config.supports_pause
    }

    fn mime_type(&self) -> String {
        self.shared.mime_type.clone()
    }
}

/// Factory for synthetic recorders
pub struct SyntheticRecorderPlatform {
    config: Mutex<SyntheticRecorderConfig>,
    created: Mutex<Vec<SyntheticRecorderHandle>>,
}

impl SyntheticRecorderPlatform {
    pub fn new() -> Self {
        Self::with_config(SyntheticRecorderConfig::default())
    }

    pub fn with_config(config: SyntheticRecorderConfig) -> Self {
        Self {
            config: Mutex::new(config),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Change the behaviour of recorders created from now on
    pub fn configure(&self, update: impl FnOnce(&mut SyntheticRecorderConfig)) {
        update(&mut self.config.lock());
    }

    pub fn last_recorder(&self) -> Option<SyntheticRecorderHandle> {
        self.created.lock().last().cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}

impl Default for SyntheticRecorderPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaRecorderPlatform for SyntheticRecorderPlatform {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.config
            .lock()
            .supported_types
            .iter()
            .any(|t| t == mime_type)
    }

    fn create_recorder(
        &self,
        stream: &MediaStream,
        options: &RecorderOptions,
    ) -> Result<RecorderConnection, PlatformError> {
        let config = self.config.lock().clone();
        if let Some(error) = config.fail_create.clone() {
            return Err(error);
        }
        if !stream.active() {
            return Err(PlatformError::invalid_state("Stream is inactive"));
        }

        let mime_type = match &options.mime_type {
            Some(requested) if !config.supported_types.contains(requested) => {
                return Err(PlatformError::not_supported(format!(
                    "Unsupported MIME type: {requested}"
                )));
            }
            Some(requested) => requested.clone(),
            None => config.default_mime_type.clone(),
        };

        let (tx, signals) = mpsc::unbounded_channel();
        let shared = Arc::new(RecorderShared {
            tx,
            state: Mutex::new(BackendState::Inactive),
            mime_type,
            options: options.clone(),
        });
        self.created.lock().push(SyntheticRecorderHandle {
            shared: shared.clone(),
        });
        tracing::debug!("Created synthetic recorder for stream {}", stream.id());

        Ok(RecorderConnection {
            recorder: Box::new(SyntheticRecorder {
                shared,
                config,
                ticker: None,
            }),
            signals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MediaTrack, StreamRole, TrackKind};

    fn stream() -> MediaStream {
        MediaStream::new(StreamRole::Combined, vec![MediaTrack::new(TrackKind::Video, "Screen 1")])
    }

    #[test]
    fn test_unsupported_hint_is_rejected() {
        let platform = SyntheticRecorderPlatform::new();
        let options = RecorderOptions {
            mime_type: Some("video/x-matroska".to_string()),
            ..RecorderOptions::default()
        };
        let err = platform.create_recorder(&stream(), &options).err().unwrap();
        assert_eq!(err.name, "NotSupportedError");
        assert_eq!(platform.created_count(), 0);
    }

    #[test]
    fn test_stop_flushes_trailing_chunk_then_stopped() {
        let platform = SyntheticRecorderPlatform::with_config(SyntheticRecorderConfig {
            trailing_chunk_bytes: 3,
            ..SyntheticRecorderConfig::default()
        });
        let mut connection = platform
            .create_recorder(&stream(), &RecorderOptions::default())
            .unwrap();

        connection.recorder.start(Duration::from_millis(1000)).unwrap();
        connection.recorder.stop().unwrap();

        assert_eq!(
            connection.signals.try_recv().unwrap(),
            RecorderSignal::DataAvailable {
                data: vec![0; 3],
                mime_type: "video/webm".to_string(),
            }
        );
        assert_eq!(connection.signals.try_recv().unwrap(), RecorderSignal::Stopped);
        assert!(connection.recorder.stop().is_err());
    }

    #[tokio::test]
    async fn test_auto_chunks_follow_timeslice() {
        let platform = SyntheticRecorderPlatform::with_config(SyntheticRecorderConfig {
            auto_chunk_bytes: Some(16),
            ..SyntheticRecorderConfig::default()
        });
        let mut connection = platform
            .create_recorder(&stream(), &RecorderOptions::default())
            .unwrap();

        connection.recorder.start(Duration::from_millis(5)).unwrap();
        let signal = tokio::time::timeout(Duration::from_secs(1), connection.signals.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(signal, RecorderSignal::DataAvailable { ref data, .. } if data.len() == 16));

        connection.recorder.stop().unwrap();
    }
}
