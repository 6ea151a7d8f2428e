//! Application state store
//!
//! All state changes go through [`AppStateStore::dispatch`]. The store owns
//! the published artifact URL and revokes it whenever the URL is replaced
//! or the output is reset.

use std::sync::Arc;

use super::types::{Action, AppState, OutputState, RecordingState, WebcamCorner, WebcamPosition};
use crate::output::{ArtifactUrl, ObjectUrlRegistry};
use crate::recorder::RecorderStatus;

pub struct AppStateStore {
    state: AppState,
    urls: Arc<ObjectUrlRegistry>,
}

impl AppStateStore {
    pub fn new(urls: Arc<ObjectUrlRegistry>) -> Self {
        Self {
            state: AppState::default(),
            urls,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        tracing::trace!("dispatch {:?}", action);
        let state = &mut self.state;
        match action {
            Action::SetAvailableDevices(devices) => state.media.available_devices = devices,
            Action::SetSelectedScreen(screen) => state.media.selected_sources.screen = screen,
            Action::SetSelectedWebcam(webcam) => state.media.selected_sources.webcam = webcam,
            Action::SetSelectedMicrophone(microphone) => {
                state.media.selected_sources.microphone = microphone
            }
            Action::SetSystemAudio(enabled) => state.media.selected_sources.system_audio = enabled,
            Action::SetStreams(streams) => state.media.streams = streams,

            Action::SetRecordingStatus(status) => state.recording.status = status,
            Action::SetRecordingDuration(duration_ms) => state.recording.duration_ms = duration_ms,
            Action::SetRecordingStartTime(start) => state.recording.start_time_ms = start,
            Action::SetRecordingProgress { chunk_count, bytes } => {
                state.recording.chunk_count = chunk_count;
                state.recording.bytes_recorded = bytes;
            }
            Action::ClearRecordingChunks => {
                state.recording.chunk_count = 0;
                state.recording.bytes_recorded = 0;
            }
            Action::SetRecordingError(error) => {
                if error.is_some() {
                    state.recording.status = RecorderStatus::Error;
                }
                state.recording.error = error;
            }

            Action::SetOutputFormat(format) => state.output.format = format,
            Action::SetOutputQuality(quality) => {
                state.output.quality = quality;
                if let Some(settings) = quality.settings() {
                    state.output.custom_settings = settings;
                }
            }
            Action::SetCustomQualitySettings(settings) => {
                state.output.quality = crate::output::QualityPreset::Custom;
                state.output.custom_settings = settings;
            }
            Action::SetOutput(output) => state.output.output = output,
            Action::SetDownloadUrl(url) => {
                let previous = std::mem::replace(&mut state.output.download_url, url);
                if let Some(previous) = previous {
                    if Some(&previous) != state.output.download_url.as_ref() {
                        self.urls.revoke(&previous);
                    }
                }
            }

            Action::SetActivePanel(panel) => state.ui.active_panel = panel,
            Action::SetWebcamPosition(position) => state.ui.webcam_position = position,
            Action::ToggleSettings => state.ui.show_settings = !state.ui.show_settings,
            Action::ShowSettings(show) => state.ui.show_settings = show,
            Action::AddNotification(notification) => state.ui.notifications.push(notification),
            Action::RemoveNotification(id) => state.ui.notifications.retain(|n| n.id != id),
            Action::ClearNotifications => state.ui.notifications.clear(),

            Action::ResetRecording => state.recording = RecordingState::default(),
            Action::ResetOutput => {
                Self::revoke_download_url(&self.urls, &mut state.output);
                state.output = OutputState::default();
            }
            Action::ResetState => {
                Self::revoke_download_url(&self.urls, &mut state.output);
                *state = AppState::default();
            }
        }
    }

    /// Clear the artifact but keep the chosen format and quality
    pub fn clear_artifact(&mut self) {
        self.dispatch(Action::SetDownloadUrl(None));
        self.dispatch(Action::SetOutput(None));
    }

    pub fn download_url(&self) -> Option<&ArtifactUrl> {
        self.state.output.download_url.as_ref()
    }

    pub fn set_webcam_corner(&mut self, corner: WebcamCorner, width: u32, height: u32) {
        self.dispatch(Action::SetWebcamPosition(WebcamPosition::preset(corner, width, height)));
    }

    fn revoke_download_url(urls: &ObjectUrlRegistry, output: &mut OutputState) {
        if let Some(url) = output.download_url.take() {
            urls.revoke(&url);
        }
    }
}
