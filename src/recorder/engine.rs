//! Recorder engine
//!
//! Drives one platform recorder through the recording lifecycle, collects
//! its chunks in order and assembles the final artifact.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::backend::{
    MediaRecorderPlatform, RecorderConnection, RecorderError, RecorderOptions, RecorderResult,
    RecorderSignal,
};
use super::clock::Clock;
use super::mime::resolve_mime_type;
use super::state::{DataChunk, RecorderSnapshot, RecorderStatus, RecordingSession};
use crate::capture::MediaStream;
use crate::config::RecorderSettings;
use crate::output::{assemble_with_fallback, OutputArtifact};

/// Events emitted by the engine
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Status transition
    StatusChanged(RecorderStatus),
    /// A non-empty chunk was stored
    DataAvailable(DataChunk),
    /// Non-fatal problem (pause unsupported, flush timeout, ...)
    Warning(String),
    /// Artifact assembled
    Completed(OutputArtifact),
    /// The session failed
    Error(RecorderError),
}

/// Recording state machine
///
/// The engine reads from the stream it is given but never stops it; the
/// capture services own stream lifetimes.
pub struct RecorderEngine {
    platform: Arc<dyn MediaRecorderPlatform>,
    clock: Arc<dyn Clock>,
    settings: RecorderSettings,

    status: RecorderStatus,
    session: Option<RecordingSession>,
    connection: Option<RecorderConnection>,
    artifact: Option<OutputArtifact>,
    error: Option<RecorderError>,

    /// Set once we asked the recorder to stop (or it stopped on its own)
    stop_requested: bool,
    /// Set once the recorder confirmed the stop
    stop_received: bool,

    event_tx: broadcast::Sender<RecorderEvent>,
}

impl RecorderEngine {
    pub fn new(
        platform: Arc<dyn MediaRecorderPlatform>,
        clock: Arc<dyn Clock>,
        settings: RecorderSettings,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(settings.event_capacity.max(1));
        Self {
            platform,
            clock,
            settings,
            status: RecorderStatus::Idle,
            session: None,
            connection: None,
            artifact: None,
            error: None,
            stop_requested: false,
            stop_received: false,
            event_tx,
        }
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.event_tx.subscribe()
    }

    pub fn status(&self) -> RecorderStatus {
        self.status
    }

    /// Bind a new session to `stream`
    ///
    /// Rejected while a session is recording, paused or processing. Any
    /// previous recorder is force-stopped and its chunks discarded.
    pub fn initialize(&mut self, stream: &MediaStream, options: RecorderOptions) -> RecorderResult<()> {
        if self.status.is_active() {
            return Err(RecorderError::InvalidState {
                operation: "initialize",
                status: self.status,
            });
        }

        self.discard_connection();
        self.session = None;
        self.artifact = None;
        self.error = None;
        self.stop_requested = false;
        self.stop_received = false;

        if !self.platform.is_available() {
            return Err(self.fail(RecorderError::InitFailed(
                "Media recording is not available on this platform".into(),
            )));
        }
        if !stream.active() {
            return Err(self.fail(RecorderError::InitFailed(
                "The stream has no live tracks".into(),
            )));
        }

        let platform = &self.platform;
        let mime_type = resolve_mime_type(
            options.mime_type.as_deref(),
            &self.settings.mime_types,
            |t| platform.is_type_supported(t),
        );
        let options = RecorderOptions {
            mime_type: mime_type.clone(),
            ..options
        };

        let connection = match self.platform.create_recorder(stream, &options) {
            Ok(connection) => connection,
            Err(e) => {
                return Err(self.fail(RecorderError::InitFailed(e.to_string())));
            }
        };

        let reported = connection.recorder.mime_type();
        let mime_type = mime_type.or_else(|| (!reported.is_empty()).then_some(reported));

        tracing::info!(
            "Recorder initialized for stream {} ({})",
            stream.id(),
            mime_type.as_deref().unwrap_or("platform default")
        );

        self.session = Some(RecordingSession::new(stream.id(), mime_type));
        self.connection = Some(connection);
        self.set_status(RecorderStatus::Idle);
        Ok(())
    }

    /// Start recording with the configured timeslice
    pub fn start(&mut self) -> RecorderResult<()> {
        if self.status != RecorderStatus::Idle {
            return Err(RecorderError::InvalidState {
                operation: "start",
                status: self.status,
            });
        }
        if self.session.as_ref().map_or(true, |s| s.is_started()) {
            return Err(RecorderError::NotInitialized);
        }
        let Some(connection) = self.connection.as_mut() else {
            return Err(RecorderError::NotInitialized);
        };

        if let Err(e) = connection.recorder.start(self.settings.timeslice()) {
            return Err(self.fail(RecorderError::from(e)));
        }

        let now = self.clock.now_ms();
        if let Some(session) = self.session.as_mut() {
            session.begin(now);
        }
        tracing::info!("Recording started");
        self.set_status(RecorderStatus::Recording);
        Ok(())
    }

    /// Suspend chunk emission. Returns false if not recording or unsupported.
    pub fn pause(&mut self) -> bool {
        if self.status != RecorderStatus::Recording {
            tracing::debug!("Ignoring pause while {}", self.status);
            return false;
        }
        let Some(connection) = self.connection.as_mut() else {
            return false;
        };
        if !connection.recorder.supports_pause() {
            self.warn("Pausing is not supported by this recorder".into());
            return false;
        }
        if let Err(e) = connection.recorder.pause() {
            self.warn(format!("Failed to pause recording: {e}"));
            return false;
        }

        let now = self.clock.now_ms();
        if let Some(session) = self.session.as_mut() {
            session.pause(now);
        }
        tracing::info!("Recording paused");
        self.set_status(RecorderStatus::Paused);
        true
    }

    /// Resume a paused recording. Returns false if not paused.
    pub fn resume(&mut self) -> bool {
        if self.status != RecorderStatus::Paused {
            tracing::debug!("Ignoring resume while {}", self.status);
            return false;
        }
        let Some(connection) = self.connection.as_mut() else {
            return false;
        };
        if let Err(e) = connection.recorder.resume() {
            self.warn(format!("Failed to resume recording: {e}"));
            return false;
        }

        let now = self.clock.now_ms();
        if let Some(session) = self.session.as_mut() {
            session.resume(now);
        }
        tracing::info!("Recording resumed");
        self.set_status(RecorderStatus::Recording);
        true
    }

    /// Handle every signal already delivered by the recorder
    ///
    /// Returns the number of signals processed.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let signal = match self.connection.as_mut() {
                Some(connection) => match connection.signals.try_recv() {
                    Ok(signal) => signal,
                    Err(_) => break,
                },
                None => break,
            };
            self.handle_signal(signal);
            handled += 1;
        }
        handled
    }

    fn handle_signal(&mut self, signal: RecorderSignal) {
        match signal {
            RecorderSignal::DataAvailable { data, mime_type } => {
                if !self.status.is_active() {
                    tracing::debug!("Discarding chunk received while {}", self.status);
                    return;
                }
                let now = self.clock.now_ms();
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                match session.push_chunk(data, mime_type, now) {
                    Some(chunk) => {
                        tracing::debug!(
                            "Chunk {} received ({} bytes)",
                            chunk.sequence(),
                            chunk.size()
                        );
                        let _ = self.event_tx.send(RecorderEvent::DataAvailable(chunk));
                    }
                    None => tracing::debug!("Dropped empty chunk"),
                }
            }
            RecorderSignal::Stopped => {
                self.stop_received = true;
                if !self.stop_requested
                    && matches!(self.status, RecorderStatus::Recording | RecorderStatus::Paused)
                {
                    tracing::info!("Recorder stopped on its own, finalizing");
                    self.stop_requested = true;
                    let now = self.clock.now_ms();
                    if let Some(session) = self.session.as_mut() {
                        session.mark_stopped(now);
                    }
                    self.set_status(RecorderStatus::Processing);
                    // Failure is already recorded and broadcast
                    let _ = self.finalize();
                }
            }
            RecorderSignal::Error(e) => {
                if self.status.is_active() {
                    self.fail(RecorderError::from(e));
                } else {
                    tracing::warn!("Recorder error while {}: {}", self.status, e);
                }
            }
        }
    }

    /// First stop step: freeze the clock and ask the recorder to stop
    pub fn request_stop(&mut self) -> RecorderResult<()> {
        self.pump();
        if !matches!(self.status, RecorderStatus::Recording | RecorderStatus::Paused) {
            return Err(RecorderError::InvalidState {
                operation: "stop",
                status: self.status,
            });
        }

        let now = self.clock.now_ms();
        if let Some(session) = self.session.as_mut() {
            session.mark_stopped(now);
        }
        self.stop_requested = true;

        let result = match self.connection.as_mut() {
            Some(connection) => connection.recorder.stop(),
            None => Ok(()),
        };
        tracing::info!("Stopping recording");
        self.set_status(RecorderStatus::Processing);

        if let Err(e) = result {
            // Nothing more will arrive from this recorder
            self.stop_received = true;
            self.warn(format!("Recorder failed to stop cleanly: {e}"));
        }
        Ok(())
    }

    /// Second stop step: wait for the recorder's final chunk and stop signal
    pub async fn await_stopped(&mut self, timeout: Duration) -> RecorderResult<()> {
        if self.status != RecorderStatus::Processing {
            return Err(RecorderError::InvalidState {
                operation: "await stop",
                status: self.status,
            });
        }

        let deadline = tokio::time::Instant::now() + timeout;
        while !self.stop_received {
            let Some(connection) = self.connection.as_mut() else {
                self.stop_received = true;
                break;
            };
            match tokio::time::timeout_at(deadline, connection.signals.recv()).await {
                Ok(Some(signal)) => self.handle_signal(signal),
                Ok(None) => {
                    tracing::debug!("Recorder signal channel closed");
                    self.stop_received = true;
                }
                Err(_) => return Err(RecorderError::FlushTimeout(timeout)),
            }
            if let Some(error) = &self.error {
                return Err(error.clone());
            }
        }
        Ok(())
    }

    /// Final stop step: assemble the buffered chunks
    pub fn finalize(&mut self) -> RecorderResult<OutputArtifact> {
        if self.status != RecorderStatus::Processing {
            return Err(RecorderError::InvalidState {
                operation: "finalize",
                status: self.status,
            });
        }

        let result = match self.session.as_ref() {
            Some(session) => assemble_with_fallback(
                session.chunks(),
                None,
                &self.settings.fallback_mime_type,
            ),
            None => assemble_with_fallback(&[], None, &self.settings.fallback_mime_type),
        };

        match result {
            Ok(artifact) => {
                tracing::info!(
                    "Recording completed: {} bytes in {} chunk(s), {} ms",
                    artifact.size(),
                    artifact.chunk_count(),
                    self.duration_ms()
                );
                self.connection = None;
                self.artifact = Some(artifact.clone());
                self.set_status(RecorderStatus::Completed);
                let _ = self.event_tx.send(RecorderEvent::Completed(artifact.clone()));
                Ok(artifact)
            }
            Err(_) => Err(self.fail(RecorderError::EmptyArtifact)),
        }
    }

    /// Stop and assemble
    ///
    /// A recorder that does not confirm the stop within the flush timeout is
    /// finalized with the chunks received so far.
    pub async fn stop(&mut self) -> RecorderResult<OutputArtifact> {
        self.request_stop()?;

        let timeout = self.settings.flush_timeout();
        match self.await_stopped(timeout).await {
            Ok(()) => {}
            Err(RecorderError::FlushTimeout(_)) => {
                let chunks = self.session.as_ref().map_or(0, |s| s.chunks().len());
                self.warn(format!(
                    "Recorder did not flush within {} ms, finalizing with {} chunk(s)",
                    timeout.as_millis(),
                    chunks
                ));
            }
            Err(e) => return Err(e),
        }

        self.pump();
        self.finalize()
    }

    /// Drop the session and return to idle
    pub fn reset(&mut self) {
        self.discard_connection();
        self.session = None;
        self.artifact = None;
        self.error = None;
        self.stop_requested = false;
        self.stop_received = false;
        tracing::debug!("Recorder reset");
        self.set_status(RecorderStatus::Idle);
    }

    /// Recorded time excluding pauses
    pub fn duration_ms(&self) -> u64 {
        self.session
            .as_ref()
            .map_or(0, |s| s.elapsed_ms(self.clock.now_ms()))
    }

    pub fn start_time_ms(&self) -> Option<u64> {
        self.session.as_ref().and_then(|s| s.started_at_ms())
    }

    pub fn chunks(&self) -> &[DataChunk] {
        self.session
            .as_ref()
            .map(|s| s.chunks())
            .unwrap_or_default()
    }

    pub fn total_bytes(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.total_bytes())
    }

    /// Negotiated MIME type of the current session
    pub fn mime_type(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.mime_type())
    }

    pub fn artifact(&self) -> Option<&OutputArtifact> {
        self.artifact.as_ref()
    }

    pub fn error(&self) -> Option<&RecorderError> {
        self.error.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.connection.is_some()
    }

    /// Whether the bound recorder can pause
    pub fn supports_pause(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| c.recorder.supports_pause())
    }

    pub fn snapshot(&self) -> RecorderSnapshot {
        RecorderSnapshot {
            status: self.status,
            duration_ms: self.duration_ms(),
            chunk_count: self.chunks().len(),
            total_bytes: self.total_bytes(),
            mime_type: self.mime_type().map(str::to_string),
            error: self.error.as_ref().map(|e| e.to_string()),
        }
    }

    fn set_status(&mut self, status: RecorderStatus) {
        if self.status != status {
            tracing::debug!("Recorder status {} -> {}", self.status, status);
            self.status = status;
            let _ = self.event_tx.send(RecorderEvent::StatusChanged(status));
        }
    }

    fn warn(&self, message: String) {
        tracing::warn!("{}", message);
        let _ = self.event_tx.send(RecorderEvent::Warning(message));
    }

    /// Move to `error`, stopping the recorder. Returns the error for `?` use.
    fn fail(&mut self, error: RecorderError) -> RecorderError {
        tracing::error!("Recording failed: {}", error);
        self.discard_connection();
        self.error = Some(error.clone());
        self.set_status(RecorderStatus::Error);
        let _ = self.event_tx.send(RecorderEvent::Error(error.clone()));
        error
    }

    fn discard_connection(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.force_stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MediaTrack, PlatformError, StreamRole, TrackKind};
    use crate::recorder::backend::BackendState;
    use crate::recorder::clock::ManualClock;
    use crate::synthetic::{SyntheticRecorderConfig, SyntheticRecorderPlatform};

    struct Fixture {
        platform: Arc<SyntheticRecorderPlatform>,
        clock: Arc<ManualClock>,
        engine: RecorderEngine,
        stream: MediaStream,
    }

    fn fixture_with(config: SyntheticRecorderConfig, settings: RecorderSettings) -> Fixture {
        let platform = Arc::new(SyntheticRecorderPlatform::with_config(config));
        let clock = Arc::new(ManualClock::new(0));
        let engine = RecorderEngine::new(platform.clone(), clock.clone(), settings);
        let stream = MediaStream::new(
            StreamRole::Combined,
            vec![MediaTrack::new(TrackKind::Video, "Screen 1")],
        );
        Fixture {
            platform,
            clock,
            engine,
            stream,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(SyntheticRecorderConfig::default(), RecorderSettings::default())
    }

    fn drain(rx: &mut broadcast::Receiver<RecorderEvent>) -> Vec<RecorderEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_duration_excludes_pause_gaps() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        let recorder = f.platform.last_recorder().unwrap();

        f.clock.set(1000);
        assert!(f.engine.pause());
        assert_eq!(recorder.state(), BackendState::Paused);
        f.clock.set(3000);
        assert!(f.engine.resume());
        f.clock.set(4000);
        recorder.emit_chunk(vec![1; 64]);

        let artifact = f.engine.stop().await.unwrap();
        assert_eq!(artifact.size(), 64);
        assert_eq!(f.engine.status(), RecorderStatus::Completed);

        // 4000 ms wall time minus the 2000 ms gap
        f.clock.set(60_000);
        assert_eq!(f.engine.duration_ms(), 2000);
    }

    #[tokio::test]
    async fn test_stop_while_paused_freezes_at_pause_time() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        let recorder = f.platform.last_recorder().unwrap();
        recorder.emit_chunk(vec![1; 8]);

        f.clock.set(1000);
        assert!(f.engine.pause());
        f.clock.set(5000);

        f.engine.stop().await.unwrap();
        assert_eq!(f.engine.duration_ms(), 1000);
    }

    #[tokio::test]
    async fn test_chunks_keep_order_and_drop_empty() {
        let mut f = fixture();
        let mut events = f.engine.subscribe();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        let recorder = f.platform.last_recorder().unwrap();

        recorder.emit_chunk(vec![b'A'; 100]);
        recorder.emit_chunk(Vec::new());
        recorder.emit_chunk(vec![b'B'; 200]);
        recorder.emit_chunk(vec![b'C'; 150]);
        assert_eq!(f.engine.pump(), 4);

        let sequences: Vec<u64> = f.engine.chunks().iter().map(|c| c.sequence()).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        let data_events = drain(&mut events)
            .into_iter()
            .filter(|e| matches!(e, RecorderEvent::DataAvailable(_)))
            .count();
        assert_eq!(data_events, 3);

        let artifact = f.engine.stop().await.unwrap();
        assert_eq!(artifact.size(), 450);
        assert_eq!(artifact.data()[0], b'A');
        assert_eq!(artifact.data()[100], b'B');
        assert_eq!(artifact.data()[449], b'C');
    }

    #[tokio::test]
    async fn test_stop_without_chunks_is_empty_artifact() {
        let mut f = fixture();
        let mut events = f.engine.subscribe();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();

        let err = f.engine.stop().await.unwrap_err();
        assert_eq!(err, RecorderError::EmptyArtifact);
        assert_eq!(f.engine.status(), RecorderStatus::Error);
        assert_eq!(f.engine.error(), Some(&RecorderError::EmptyArtifact));
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, RecorderEvent::Error(RecorderError::EmptyArtifact))));
    }

    #[tokio::test]
    async fn test_reinitialize_guard() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![1; 10]);

        let err = f
            .engine
            .initialize(&f.stream, RecorderOptions::default())
            .unwrap_err();
        assert!(matches!(err, RecorderError::InvalidState { .. }));
        assert_eq!(f.engine.status(), RecorderStatus::Recording);

        f.engine.stop().await.unwrap();
        assert_eq!(f.engine.status(), RecorderStatus::Completed);

        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        assert_eq!(f.engine.status(), RecorderStatus::Idle);
        assert!(f.engine.chunks().is_empty());
        assert!(f.engine.artifact().is_none());
        assert_eq!(f.platform.created_count(), 2);
    }

    #[tokio::test]
    async fn test_initialize_after_error() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        assert!(f.engine.stop().await.is_err());
        assert_eq!(f.engine.status(), RecorderStatus::Error);

        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        assert_eq!(f.engine.status(), RecorderStatus::Idle);
        assert!(f.engine.error().is_none());
    }

    #[tokio::test]
    async fn test_initialize_force_stops_previous_recorder() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        let first = f.platform.last_recorder().unwrap();
        f.engine.start().unwrap();
        f.engine.reset();

        assert_eq!(first.state(), BackendState::Inactive);
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        assert_eq!(f.platform.created_count(), 2);
    }

    #[test]
    fn test_mime_negotiation_falls_back() {
        let mut f = fixture_with(
            SyntheticRecorderConfig {
                supported_types: vec!["video/webm".to_string()],
                ..SyntheticRecorderConfig::default()
            },
            RecorderSettings::default(),
        );
        let options = RecorderOptions {
            mime_type: Some("video/mp4".to_string()),
            video_bits_per_second: Some(2_500_000),
            audio_bits_per_second: None,
        };

        f.engine.initialize(&f.stream, options).unwrap();
        assert_eq!(f.engine.mime_type(), Some("video/webm"));

        let created = f.platform.last_recorder().unwrap().options();
        assert_eq!(created.mime_type.as_deref(), Some("video/webm"));
        assert_eq!(created.video_bits_per_second, Some(2_500_000));
    }

    #[tokio::test]
    async fn test_flush_timeout_finalizes_buffered_chunks() {
        let mut f = fixture_with(
            SyntheticRecorderConfig {
                signal_stop: false,
                ..SyntheticRecorderConfig::default()
            },
            RecorderSettings {
                flush_timeout_ms: 20,
                ..RecorderSettings::default()
            },
        );
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![7; 32]);

        f.engine.request_stop().unwrap();
        let err = f
            .engine
            .await_stopped(Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(err, RecorderError::FlushTimeout(Duration::from_millis(10)));
        assert_eq!(f.engine.status(), RecorderStatus::Processing);

        let artifact = f.engine.finalize().unwrap();
        assert_eq!(artifact.size(), 32);
    }

    #[tokio::test]
    async fn test_stop_warns_on_flush_timeout() {
        let mut f = fixture_with(
            SyntheticRecorderConfig {
                signal_stop: false,
                ..SyntheticRecorderConfig::default()
            },
            RecorderSettings {
                flush_timeout_ms: 20,
                ..RecorderSettings::default()
            },
        );
        let mut events = f.engine.subscribe();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![7; 32]);

        let artifact = f.engine.stop().await.unwrap();
        assert_eq!(artifact.size(), 32);
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, RecorderEvent::Warning(_))));
    }

    #[tokio::test]
    async fn test_trailing_chunk_is_included() {
        let mut f = fixture_with(
            SyntheticRecorderConfig {
                trailing_chunk_bytes: 5,
                ..SyntheticRecorderConfig::default()
            },
            RecorderSettings::default(),
        );
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![1; 10]);

        let artifact = f.engine.stop().await.unwrap();
        assert_eq!(artifact.size(), 15);
        assert_eq!(artifact.chunk_count(), 2);
    }

    #[test]
    fn test_unrequested_stop_finalizes() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        let recorder = f.platform.last_recorder().unwrap();
        recorder.emit_chunk(vec![3; 12]);
        recorder.emit_stopped();

        f.engine.pump();
        assert_eq!(f.engine.status(), RecorderStatus::Completed);
        assert_eq!(f.engine.artifact().map(|a| a.size()), Some(12));
    }

    #[test]
    fn test_pause_unsupported_returns_false() {
        let mut f = fixture_with(
            SyntheticRecorderConfig {
                supports_pause: false,
                ..SyntheticRecorderConfig::default()
            },
            RecorderSettings::default(),
        );
        let mut events = f.engine.subscribe();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();

        assert!(!f.engine.supports_pause());
        assert!(!f.engine.pause());
        assert_eq!(f.engine.status(), RecorderStatus::Recording);
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, RecorderEvent::Warning(_))));
    }

    #[test]
    fn test_pause_and_resume_require_matching_state() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        assert!(!f.engine.pause());
        assert!(!f.engine.resume());

        f.engine.start().unwrap();
        assert!(!f.engine.resume());
        assert!(f.engine.pause());
        assert!(!f.engine.pause());
    }

    #[test]
    fn test_fatal_recorder_error() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        f.platform
            .last_recorder()
            .unwrap()
            .emit_error(PlatformError::new("EncodingError", "encoder crashed"));

        f.engine.pump();
        assert_eq!(f.engine.status(), RecorderStatus::Error);
        assert!(f.engine.error().is_some());
        assert!(!f.engine.pause());

        f.engine.reset();
        assert_eq!(f.engine.status(), RecorderStatus::Idle);
        assert!(f.engine.error().is_none());
    }

    #[test]
    fn test_start_requires_initialize() {
        let mut f = fixture();
        assert_eq!(f.engine.start(), Err(RecorderError::NotInitialized));
    }

    #[test]
    fn test_create_failure_is_init_failed() {
        let mut f = fixture_with(
            SyntheticRecorderConfig {
                fail_create: Some(PlatformError::not_supported("no encoder")),
                ..SyntheticRecorderConfig::default()
            },
            RecorderSettings::default(),
        );

        let err = f
            .engine
            .initialize(&f.stream, RecorderOptions::default())
            .unwrap_err();
        assert!(matches!(err, RecorderError::InitFailed(_)));
        assert_eq!(err.kind(), crate::utils::error::MediaErrorKind::RecorderInitFailed);
        assert_eq!(f.engine.status(), RecorderStatus::Error);
    }

    #[tokio::test]
    async fn test_engine_never_stops_its_stream() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![1; 4]);
        f.engine.stop().await.unwrap();
        f.engine.reset();

        assert!(f.stream.active());
    }

    #[test]
    fn test_snapshot_reflects_progress() {
        let mut f = fixture();
        f.engine.initialize(&f.stream, RecorderOptions::default()).unwrap();
        f.engine.start().unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![1; 40]);
        f.engine.pump();
        f.clock.set(2500);

        let snapshot = f.engine.snapshot();
        assert_eq!(snapshot.status, RecorderStatus::Recording);
        assert_eq!(snapshot.duration_ms, 2500);
        assert_eq!(snapshot.chunk_count, 1);
        assert_eq!(snapshot.total_bytes, 40);
    }
}
