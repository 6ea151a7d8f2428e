//! Application root
//!
//! Owns every service explicitly (capture services, stream registry,
//! recorder engine, assembler and state store) and keeps the store in step
//! with the engine.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::capture::{
    AudioCaptureService, DeviceWatcher, MediaDevices, MediaTrack, ScreenCaptureService,
    StreamRegistry, StreamRole, WebcamService,
};
use crate::config::Settings;
use crate::output::{ArtifactUrl, ObjectUrlRegistry, OutputAssembler};
use crate::recorder::{Clock, MediaRecorderPlatform, RecorderEngine, RecorderError, RecorderEvent};
use crate::state::{
    Action, ActivePanel, AppStateStore, Notification, NotificationLevel, OutputInfo, StatusError,
};

pub struct Studio {
    pub settings: Settings,
    pub media: Arc<dyn MediaDevices>,
    pub recorder_platform: Arc<dyn MediaRecorderPlatform>,
    pub screen: ScreenCaptureService,
    pub webcam: WebcamService,
    pub audio: AudioCaptureService,
    pub devices: DeviceWatcher,
    pub registry: StreamRegistry,
    pub engine: RecorderEngine,
    pub assembler: OutputAssembler,
    pub store: AppStateStore,
    events: broadcast::Receiver<RecorderEvent>,
}

impl Studio {
    pub fn new(
        media: Arc<dyn MediaDevices>,
        recorder_platform: Arc<dyn MediaRecorderPlatform>,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Self {
        let urls = Arc::new(ObjectUrlRegistry::new());
        let engine = RecorderEngine::new(recorder_platform.clone(), clock, settings.recorder.clone());
        let events = engine.subscribe();

        let mut store = AppStateStore::new(urls.clone());
        store.dispatch(Action::SetOutputFormat(settings.output.format));
        store.dispatch(Action::SetOutputQuality(settings.output.quality));

        Self {
            screen: ScreenCaptureService::new(media.clone(), settings.capture.screen.clone()),
            webcam: WebcamService::new(media.clone(), settings.capture.webcam.clone()),
            audio: AudioCaptureService::new(media.clone(), settings.capture.microphone.clone()),
            devices: DeviceWatcher::new(media.clone()),
            registry: StreamRegistry::new(),
            assembler: OutputAssembler::with_fallback(urls, settings.recorder.fallback_mime_type.clone()),
            engine,
            store,
            events,
            media,
            recorder_platform,
            settings,
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.store
            .dispatch(Action::AddNotification(Notification::new(level, message)));
    }

    /// Record an engine failure in the store
    pub fn mirror_error(&mut self, error: &RecorderError) {
        self.store.dispatch(Action::SetRecordingError(Some(StatusError {
            kind: error.kind(),
            message: error.to_string(),
        })));
    }

    /// Process pending recorder signals and bring the store up to date
    ///
    /// Called on every UI timer tick and after each recorder command.
    pub fn sync(&mut self) {
        self.engine.pump();
        self.drain_events();

        let screen_lost = self.reconcile_screen();
        if !self.registry.prune_ended().is_empty() || screen_lost {
            self.store
                .dispatch(Action::SetStreams(self.registry.presence()));
        }

        let engine = &self.engine;
        let status = engine.status();
        let duration = engine.duration_ms();
        let start_time = engine.start_time_ms();
        let chunk_count = engine.chunks().len();
        let bytes = engine.total_bytes();
        let error = engine.error().cloned();

        self.store.dispatch(Action::SetRecordingStatus(status));
        self.store.dispatch(Action::SetRecordingDuration(duration));
        self.store.dispatch(Action::SetRecordingStartTime(start_time));
        self.store
            .dispatch(Action::SetRecordingProgress { chunk_count, bytes });
        match error {
            Some(error) => self.mirror_error(&error),
            None => self.store.dispatch(Action::SetRecordingError(None)),
        }

        self.publish_artifact();
    }

    /// Whether the registry's screen stream is the one the screen service
    /// still holds, with a live video track
    pub fn screen_is_current(&self) -> bool {
        let Some(registered) = self.registry.stream(StreamRole::Screen) else {
            return false;
        };
        self.screen.stream().is_some_and(|held| {
            held.id() == registered.id() && held.video_tracks().any(MediaTrack::is_live)
        })
    }

    /// Drop a screen stream the screen service no longer holds. Losing the
    /// screen outside a recording sends the user back to source selection.
    ///
    /// Returns true when the screen was dropped.
    fn reconcile_screen(&mut self) -> bool {
        if self.registry.stream(StreamRole::Screen).is_none() || self.screen_is_current() {
            return false;
        }

        tracing::warn!("Screen stream lost");
        self.registry.set_stream(StreamRole::Screen, None);
        self.store.dispatch(Action::SetSelectedScreen(None));
        if !self.engine.status().is_active() {
            self.store
                .dispatch(Action::SetActivePanel(ActivePanel::Source));
        }
        self.notify(NotificationLevel::Error, "Screen sharing ended");
        true
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(RecorderEvent::Warning(message)) => self.notify(NotificationLevel::Warning, message),
                Ok(RecorderEvent::Error(error)) => {
                    self.notify(NotificationLevel::Error, error.kind().user_message())
                }
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} recorder events", skipped);
                }
                Err(_) => break,
            }
        }
    }

    /// Expose the engine's artifact through a URL once per recording
    fn publish_artifact(&mut self) -> Option<ArtifactUrl> {
        let artifact = self.engine.artifact()?;
        if self.store.state().output.output.is_some() {
            return self.store.download_url().cloned();
        }

        let url = self.assembler.create_object_url(artifact);
        let info = OutputInfo {
            mime_type: artifact.mime_type().to_string(),
            size_bytes: artifact.size() as u64,
            chunk_count: artifact.chunk_count(),
        };
        tracing::info!("Recording available at {}", url);

        self.store.dispatch(Action::SetOutput(Some(info)));
        self.store.dispatch(Action::SetDownloadUrl(Some(url.clone())));
        self.store.dispatch(Action::SetActivePanel(ActivePanel::Output));
        self.notify(NotificationLevel::Success, "Recording completed");
        Some(url)
    }

    /// Stop every capture service and forget all streams
    pub fn release_streams(&mut self) {
        self.screen.stop_capture();
        self.webcam.stop_capture();
        self.audio.stop_microphone_capture();
        self.registry.clear();
        self.store
            .dispatch(Action::SetStreams(self.registry.presence()));
    }
}
