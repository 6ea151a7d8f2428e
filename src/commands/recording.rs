//! Recording commands
//!
//! The operations the UI invokes: source capture, the recording lifecycle
//! and output handling. Each command locks the [`Studio`], performs its work
//! and leaves the state store consistent with the engine.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::capture::{
    DeviceList, DisplaySurface, MediaDevices, ScreenCaptureOptions, StreamRole,
};
use crate::config::Settings;
use crate::output::{save_artifact, suggested_file_name, ArtifactUrl, OutputError, OutputFormat, QualityPreset};
use crate::recorder::{
    Clock, MediaRecorderPlatform, RecorderError, RecorderOptions, RecorderSnapshot, RecorderStatus,
};
use crate::state::{Action, ActivePanel, NotificationLevel, OutputState, RecordingState, WebcamCorner};
use crate::studio::Studio;
use crate::utils::error::{AppError, ErrorResponse};

/// Application state for recording
pub struct RecorderState {
    pub studio: Arc<Mutex<Studio>>,
}

impl RecorderState {
    pub fn new(
        media: Arc<dyn MediaDevices>,
        recorder_platform: Arc<dyn MediaRecorderPlatform>,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Self {
        Self {
            studio: Arc::new(Mutex::new(Studio::new(
                media,
                recorder_platform,
                clock,
                settings,
            ))),
        }
    }
}

/// Which sources to capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureRequest {
    pub capture_system_audio: bool,
    pub display_surface: Option<DisplaySurface>,
    pub capture_webcam: bool,
    pub webcam_device_id: Option<String>,
    pub capture_microphone: bool,
    pub microphone_device_id: Option<String>,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            capture_system_audio: true,
            display_surface: None,
            capture_webcam: false,
            webcam_device_id: None,
            capture_microphone: true,
            microphone_device_id: None,
        }
    }
}

/// Result of [`capture_sources`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
    pub screen_stream_id: String,
    pub webcam_stream_id: Option<String>,
    pub microphone_stream_id: Option<String>,
    pub system_audio: bool,
    /// Optional sources that could not be captured
    pub warnings: Vec<String>,
    /// Whether recording can start
    pub ready: bool,
}

/// A finished recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOutput {
    pub download_url: ArtifactUrl,
    pub mime_type: String,
    pub size_bytes: u64,
    pub total_duration_ms: u64,
    pub chunk_count: usize,
    pub suggested_file_name: String,
}

/// Get the available cameras and microphones
pub async fn get_devices(state: &RecorderState) -> Result<DeviceList, ErrorResponse> {
    let mut studio = state.studio.lock().await;
    studio.devices.request_labels().await;
    let devices = studio.devices.refresh().await.map_err(AppError::from)?;
    studio
        .store
        .dispatch(Action::SetAvailableDevices(devices.clone()));
    Ok(devices)
}

/// Capture the screen and the optional webcam and microphone
///
/// The screen is required: its failure aborts the request. Webcam and
/// microphone failures are reported as warnings and capture continues
/// without them.
pub async fn capture_sources(
    state: &RecorderState,
    request: CaptureRequest,
) -> Result<CaptureOutcome, ErrorResponse> {
    let mut studio = state.studio.lock().await;
    let status = studio.engine.status();
    if status.is_active() {
        return Err(AppError::from(RecorderError::InvalidState {
            operation: "capture sources",
            status,
        })
        .into());
    }
    tracing::info!("Capturing sources: {:?}", request);

    let options = ScreenCaptureOptions {
        audio: request.capture_system_audio,
        display_surface: request.display_surface,
    };
    let screen = match studio.screen.capture_screen(options.clone()).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Screen capture failed: {}", e);
            studio.release_streams();
            studio.store.dispatch(Action::SetSelectedScreen(None));
            studio.store.dispatch(Action::SetSelectedWebcam(None));
            studio.store.dispatch(Action::SetSelectedMicrophone(None));
            studio.notify(NotificationLevel::Error, e.to_string());
            studio.store.dispatch(Action::SetActivePanel(ActivePanel::Source));
            return Err(AppError::from(e).into());
        }
    };
    let system_audio = screen.audio_tracks().next().is_some();
    let screen_stream_id = screen.id().to_string();
    studio.registry.set_stream(StreamRole::Screen, Some(screen));
    studio.registry.set_system_audio(request.capture_system_audio);
    studio.store.dispatch(Action::SetSelectedScreen(Some(options)));
    studio
        .store
        .dispatch(Action::SetSystemAudio(request.capture_system_audio));

    let mut warnings = Vec::new();
    let devices = studio.devices.current();

    let mut webcam_stream_id = None;
    if request.capture_webcam {
        match studio
            .webcam
            .capture_webcam(request.webcam_device_id.as_deref())
            .await
        {
            Ok(stream) => {
                webcam_stream_id = Some(stream.id().to_string());
                let device = match request.webcam_device_id.as_deref() {
                    Some(id) => devices.find(id).cloned(),
                    None => devices.default_video_input().cloned(),
                };
                studio.registry.set_stream(StreamRole::Webcam, Some(stream));
                studio.store.dispatch(Action::SetSelectedWebcam(device));
            }
            Err(e) => {
                tracing::warn!("Continuing without webcam: {}", e);
                warnings.push(format!("Webcam unavailable: {e}"));
                studio.registry.set_stream(StreamRole::Webcam, None);
                studio.store.dispatch(Action::SetSelectedWebcam(None));
            }
        }
    } else {
        studio.webcam.stop_capture();
        studio.registry.set_stream(StreamRole::Webcam, None);
        studio.store.dispatch(Action::SetSelectedWebcam(None));
    }

    let mut microphone_stream_id = None;
    if request.capture_microphone {
        match studio
            .audio
            .capture_microphone(request.microphone_device_id.as_deref())
            .await
        {
            Ok(stream) => {
                microphone_stream_id = Some(stream.id().to_string());
                let device = match request.microphone_device_id.as_deref() {
                    Some(id) => devices.find(id).cloned(),
                    None => devices.default_audio_input().cloned(),
                };
                studio
                    .registry
                    .set_stream(StreamRole::Microphone, Some(stream));
                studio.store.dispatch(Action::SetSelectedMicrophone(device));
            }
            Err(e) => {
                tracing::warn!("Continuing without microphone: {}", e);
                warnings.push(format!("Microphone unavailable: {e}"));
                studio.registry.set_stream(StreamRole::Microphone, None);
                studio.store.dispatch(Action::SetSelectedMicrophone(None));
            }
        }
    } else {
        studio.audio.stop_microphone_capture();
        studio.registry.set_stream(StreamRole::Microphone, None);
        studio.store.dispatch(Action::SetSelectedMicrophone(None));
    }

    for warning in &warnings {
        studio.notify(NotificationLevel::Warning, warning.clone());
    }

    let presence = studio.registry.presence();
    studio.store.dispatch(Action::SetStreams(presence));
    studio.store.dispatch(Action::SetActivePanel(ActivePanel::Preview));

    let ready = studio.screen_is_current();
    Ok(CaptureOutcome {
        screen_stream_id,
        webcam_stream_id,
        microphone_stream_id,
        system_audio,
        warnings,
        ready,
    })
}

/// Start recording the composed stream
pub async fn start_recording(state: &RecorderState) -> Result<RecorderSnapshot, ErrorResponse> {
    let mut studio = state.studio.lock().await;
    studio.sync();

    if studio.engine.status().is_active() {
        return Err(AppError::from(RecorderError::InvalidState {
            operation: "start",
            status: studio.engine.status(),
        })
        .into());
    }

    let stream = match studio.registry.compose() {
        Some(stream) if studio.screen_is_current() => stream,
        _ => {
            tracing::warn!("Start requested without a live screen stream");
            studio.store.dispatch(Action::SetActivePanel(ActivePanel::Source));
            return Err(AppError::NoScreenStream.into());
        }
    };

    // A new recording replaces the previous artifact
    studio.store.clear_artifact();
    studio.store.dispatch(Action::ResetRecording);

    let output = &studio.store.state().output;
    let quality = output.effective_settings();
    let options = RecorderOptions {
        mime_type: Some(output.format.preferred_mime_type().to_string()),
        video_bits_per_second: Some(quality.bitrate),
        audio_bits_per_second: None,
    };

    let started = studio
        .engine
        .initialize(&stream, options)
        .and_then(|()| studio.engine.start());
    if let Err(e) = started {
        studio.sync();
        studio.notify(NotificationLevel::Error, e.to_string());
        return Err(AppError::from(e).into());
    }

    studio.sync();
    let presence = studio.registry.presence();
    studio.store.dispatch(Action::SetStreams(presence));
    studio.store.dispatch(Action::SetActivePanel(ActivePanel::Controls));
    Ok(studio.engine.snapshot())
}

/// Pause recording. Returns false when the recorder cannot pause now.
pub async fn pause_recording(state: &RecorderState) -> Result<bool, ErrorResponse> {
    let mut studio = state.studio.lock().await;
    let paused = studio.engine.pause();
    studio.sync();
    Ok(paused)
}

/// Resume a paused recording. Returns false when not paused.
pub async fn resume_recording(state: &RecorderState) -> Result<bool, ErrorResponse> {
    let mut studio = state.studio.lock().await;
    let resumed = studio.engine.resume();
    studio.sync();
    Ok(resumed)
}

/// Stop recording and publish the artifact
pub async fn stop_recording(state: &RecorderState) -> Result<RecordingOutput, ErrorResponse> {
    let mut studio = state.studio.lock().await;
    let result = studio.engine.stop().await;
    studio.sync();

    let artifact = result.map_err(AppError::from)?;
    let download_url = studio
        .store
        .download_url()
        .cloned()
        .ok_or(AppError::Output(OutputError::EmptyInput))?;
    let format = OutputFormat::from_mime_type(artifact.mime_type())
        .unwrap_or(studio.store.state().output.format);

    Ok(RecordingOutput {
        download_url,
        mime_type: artifact.mime_type().to_string(),
        size_bytes: artifact.size() as u64,
        total_duration_ms: studio.engine.duration_ms(),
        chunk_count: artifact.chunk_count(),
        suggested_file_name: suggested_file_name(format, Utc::now()),
    })
}

/// Process pending recorder signals; called on the UI timer tick
pub async fn sync_recorder(state: &RecorderState) -> Result<RecordingState, ErrorResponse> {
    let mut studio = state.studio.lock().await;
    studio.sync();
    Ok(studio.store.state().recording.clone())
}

/// Discard the recording and its artifact, keeping the captured sources
pub async fn reset_recording(state: &RecorderState) -> Result<(), ErrorResponse> {
    let mut studio = state.studio.lock().await;
    studio.engine.reset();
    studio.store.dispatch(Action::ResetRecording);
    studio.store.dispatch(Action::ResetOutput);

    studio.registry.prune_ended();
    let panel = if studio.registry.stream(StreamRole::Screen).is_some() {
        ActivePanel::Preview
    } else {
        ActivePanel::Source
    };
    let presence = studio.registry.presence();
    studio.store.dispatch(Action::SetStreams(presence));
    studio.store.dispatch(Action::SetActivePanel(panel));
    tracing::info!("Recording reset");
    Ok(())
}

/// Stop every captured source. Rejected while recording.
pub async fn release_sources(state: &RecorderState) -> Result<(), ErrorResponse> {
    let mut studio = state.studio.lock().await;
    let status = studio.engine.status();
    if status.is_active() {
        return Err(AppError::from(RecorderError::InvalidState {
            operation: "release sources",
            status,
        })
        .into());
    }

    studio.release_streams();
    studio.store.dispatch(Action::SetSelectedScreen(None));
    studio.store.dispatch(Action::SetSelectedWebcam(None));
    studio.store.dispatch(Action::SetSelectedMicrophone(None));
    studio.store.dispatch(Action::SetActivePanel(ActivePanel::Source));
    tracing::info!("Sources released");
    Ok(())
}

/// Get the current recording state
pub async fn get_recording_state(state: &RecorderState) -> Result<RecordingState, ErrorResponse> {
    sync_recorder(state).await
}

/// Get the recorded time so far, excluding pauses
pub async fn get_recording_duration(state: &RecorderState) -> Result<u64, ErrorResponse> {
    let studio = state.studio.lock().await;
    Ok(studio.engine.duration_ms())
}

pub async fn get_output(state: &RecorderState) -> Result<OutputState, ErrorResponse> {
    let studio = state.studio.lock().await;
    Ok(studio.store.state().output.clone())
}

/// Write the published artifact to disk
///
/// A directory `path` receives the suggested file name.
pub async fn save_recording(state: &RecorderState, path: &Path) -> Result<PathBuf, ErrorResponse> {
    let studio = state.studio.lock().await;
    let url = studio
        .store
        .download_url()
        .ok_or(AppError::Output(OutputError::EmptyInput))?;
    let artifact = studio.assembler.resolve(url).map_err(AppError::from)?;

    let target = if path.is_dir() {
        let format = OutputFormat::from_mime_type(artifact.mime_type())
            .unwrap_or(studio.store.state().output.format);
        path.join(suggested_file_name(format, Utc::now()))
    } else {
        path.to_path_buf()
    };

    save_artifact(&artifact, &target).map_err(AppError::from)?;
    tracing::info!("Saved recording to {}", target.display());
    Ok(target)
}

pub async fn set_output_format(state: &RecorderState, format: OutputFormat) -> Result<(), ErrorResponse> {
    let mut studio = state.studio.lock().await;
    studio.store.dispatch(Action::SetOutputFormat(format));
    Ok(())
}

pub async fn set_quality_preset(state: &RecorderState, preset: QualityPreset) -> Result<(), ErrorResponse> {
    let mut studio = state.studio.lock().await;
    studio.store.dispatch(Action::SetOutputQuality(preset));
    Ok(())
}

/// Mute or unmute the microphone. Returns false without a microphone.
pub async fn set_microphone_muted(state: &RecorderState, muted: bool) -> Result<bool, ErrorResponse> {
    let studio = state.studio.lock().await;
    Ok(studio.audio.set_muted(muted))
}

/// Move the webcam overlay to a corner of the preview
pub async fn set_webcam_corner(
    state: &RecorderState,
    corner: WebcamCorner,
    viewport_width: u32,
    viewport_height: u32,
) -> Result<(), ErrorResponse> {
    let mut studio = state.studio.lock().await;
    studio
        .store
        .set_webcam_corner(corner, viewport_width, viewport_height);
    Ok(())
}

/// Whether the engine holds a finished artifact
pub async fn has_recording(state: &RecorderState) -> bool {
    let studio = state.studio.lock().await;
    studio.engine.status() == RecorderStatus::Completed && studio.engine.artifact().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{PlatformError, StreamPresence};
    use crate::recorder::ManualClock;
    use crate::synthetic::{SyntheticMediaDevices, SyntheticRecorderPlatform, SyntheticSource};

    struct Fixture {
        devices: Arc<SyntheticMediaDevices>,
        platform: Arc<SyntheticRecorderPlatform>,
        clock: Arc<ManualClock>,
        state: RecorderState,
    }

    fn fixture() -> Fixture {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let platform = Arc::new(SyntheticRecorderPlatform::new());
        let clock = Arc::new(ManualClock::new(10_000));
        let state = RecorderState::new(
            devices.clone(),
            platform.clone(),
            clock.clone(),
            Settings::default(),
        );
        Fixture {
            devices,
            platform,
            clock,
            state,
        }
    }

    fn screen_and_mic() -> CaptureRequest {
        CaptureRequest::default()
    }

    #[tokio::test]
    async fn test_full_recording_cycle() {
        let f = fixture();
        let outcome = capture_sources(&f.state, screen_and_mic()).await.unwrap();
        assert!(outcome.ready);
        assert!(outcome.microphone_stream_id.is_some());
        assert!(outcome.warnings.is_empty());

        start_recording(&f.state).await.unwrap();
        let recorder = f.platform.last_recorder().unwrap();
        recorder.emit_chunk(vec![1; 100]);
        f.clock.advance(1000);
        assert!(pause_recording(&f.state).await.unwrap());
        f.clock.advance(5000);
        assert!(resume_recording(&f.state).await.unwrap());
        recorder.emit_chunk(vec![2; 50]);
        f.clock.advance(1000);

        let output = stop_recording(&f.state).await.unwrap();
        assert_eq!(output.size_bytes, 150);
        assert_eq!(output.chunk_count, 2);
        assert_eq!(output.total_duration_ms, 2000);
        assert!(output.suggested_file_name.ends_with(".webm"));

        let studio = f.state.studio.lock().await;
        let app = studio.store.state();
        assert_eq!(app.recording.status, RecorderStatus::Completed);
        assert_eq!(app.ui.active_panel, ActivePanel::Output);
        assert_eq!(app.output.download_url.as_ref(), Some(&output.download_url));
        assert_eq!(studio.assembler.live_urls(), vec![output.download_url.clone()]);
    }

    #[tokio::test]
    async fn test_webcam_failure_is_a_warning() {
        let f = fixture();
        f.devices.set_failure(
            SyntheticSource::Camera,
            Some(PlatformError::not_found("camera unplugged")),
        );
        let request = CaptureRequest {
            capture_webcam: true,
            ..CaptureRequest::default()
        };

        let outcome = capture_sources(&f.state, request).await.unwrap();
        assert!(outcome.ready);
        assert!(outcome.webcam_stream_id.is_none());
        assert_eq!(outcome.warnings.len(), 1);

        {
            let studio = f.state.studio.lock().await;
            let app = studio.store.state();
            assert_eq!(app.ui.active_panel, ActivePanel::Preview);
            assert!(app
                .ui
                .notifications
                .iter()
                .any(|n| n.level == NotificationLevel::Warning));
        }

        start_recording(&f.state).await.unwrap();
        assert_eq!(f.platform.created_count(), 1);
    }

    #[tokio::test]
    async fn test_screen_failure_is_fatal() {
        let f = fixture();
        f.devices.set_failure(
            SyntheticSource::Display,
            Some(PlatformError::not_allowed("dismissed")),
        );

        let err = capture_sources(&f.state, screen_and_mic()).await.unwrap_err();
        assert_eq!(err.code, "PERMISSION_DENIED");

        let studio = f.state.studio.lock().await;
        let app = studio.store.state();
        assert_eq!(app.ui.active_panel, ActivePanel::Source);
        assert!(app
            .ui
            .notifications
            .iter()
            .any(|n| n.level == NotificationLevel::Error));
        assert!(app.media.streams.screen.is_none());
    }

    #[tokio::test]
    async fn test_start_without_screen() {
        let f = fixture();
        let err = start_recording(&f.state).await.unwrap_err();
        assert_eq!(err.code, "DEVICE_NOT_FOUND");
        assert_eq!(f.platform.created_count(), 0);
    }

    #[tokio::test]
    async fn test_revoked_screen_share_blocks_start() {
        let f = fixture();
        capture_sources(&f.state, screen_and_mic()).await.unwrap();
        f.devices.end_screen_share();

        let err = start_recording(&f.state).await.unwrap_err();
        assert_eq!(err.code, "DEVICE_NOT_FOUND");
        assert_eq!(f.platform.created_count(), 0);

        let studio = f.state.studio.lock().await;
        let app = studio.store.state();
        assert!(app.media.streams.screen.is_none());
        assert_eq!(app.ui.active_panel, ActivePanel::Source);
        assert!(!f
            .devices
            .issued_tracks()
            .iter()
            .any(|t| t.label() == "System Audio" && t.is_live()));
    }

    #[tokio::test]
    async fn test_sync_notices_revoked_screen_share() {
        let f = fixture();
        capture_sources(&f.state, screen_and_mic()).await.unwrap();
        f.devices.end_screen_share();

        sync_recorder(&f.state).await.unwrap();
        sync_recorder(&f.state).await.unwrap();

        let studio = f.state.studio.lock().await;
        let app = studio.store.state();
        assert!(app.media.streams.screen.is_none());
        assert_eq!(app.ui.active_panel, ActivePanel::Source);
        let lost = app
            .ui
            .notifications
            .iter()
            .filter(|n| n.level == NotificationLevel::Error)
            .count();
        assert_eq!(lost, 1);
    }

    #[tokio::test]
    async fn test_failed_recapture_releases_previous_sources() {
        let f = fixture();
        let request = CaptureRequest {
            capture_webcam: true,
            ..CaptureRequest::default()
        };
        capture_sources(&f.state, request.clone()).await.unwrap();
        f.devices.set_failure(
            SyntheticSource::Display,
            Some(PlatformError::not_allowed("dismissed")),
        );

        let err = capture_sources(&f.state, request).await.unwrap_err();
        assert_eq!(err.code, "PERMISSION_DENIED");

        let studio = f.state.studio.lock().await;
        assert!(!studio.audio.is_microphone_capturing());
        assert!(studio.webcam.stream().is_none());
        assert_eq!(studio.store.state().media.streams, StreamPresence::default());
        assert!(f.devices.issued_tracks().iter().all(|t| !t.is_live()));
    }

    #[tokio::test]
    async fn test_stop_without_data_mirrors_error() {
        let f = fixture();
        capture_sources(&f.state, screen_and_mic()).await.unwrap();
        start_recording(&f.state).await.unwrap();

        let err = stop_recording(&f.state).await.unwrap_err();
        assert_eq!(err.code, "EMPTY_ARTIFACT");

        let studio = f.state.studio.lock().await;
        let recording = &studio.store.state().recording;
        assert_eq!(recording.status, RecorderStatus::Error);
        assert_eq!(
            recording.error.as_ref().map(|e| e.kind),
            Some(crate::utils::error::MediaErrorKind::EmptyArtifact)
        );
        assert!(studio.assembler.live_urls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_revokes_url_and_keeps_sources() {
        let f = fixture();
        capture_sources(&f.state, screen_and_mic()).await.unwrap();
        start_recording(&f.state).await.unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![7; 10]);
        let output = stop_recording(&f.state).await.unwrap();

        reset_recording(&f.state).await.unwrap();

        let studio = f.state.studio.lock().await;
        assert!(studio.assembler.live_urls().is_empty());
        assert!(studio.assembler.resolve(&output.download_url).is_err());
        assert_eq!(studio.engine.status(), RecorderStatus::Idle);
        assert!(studio.screen.is_capturing());
        assert_eq!(studio.store.state().ui.active_panel, ActivePanel::Preview);
        assert_eq!(studio.store.state().recording, RecordingState::default());
    }

    #[tokio::test]
    async fn test_second_recording_revokes_first_url() {
        let f = fixture();
        capture_sources(&f.state, screen_and_mic()).await.unwrap();

        start_recording(&f.state).await.unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![1; 10]);
        let first = stop_recording(&f.state).await.unwrap();

        start_recording(&f.state).await.unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![2; 20]);
        let second = stop_recording(&f.state).await.unwrap();

        assert_ne!(first.download_url, second.download_url);
        let studio = f.state.studio.lock().await;
        assert_eq!(studio.assembler.live_urls(), vec![second.download_url.clone()]);
    }

    #[tokio::test]
    async fn test_format_and_quality_reach_the_recorder() {
        let f = fixture();
        set_output_format(&f.state, OutputFormat::Mp4).await.unwrap();
        set_quality_preset(&f.state, QualityPreset::High).await.unwrap();
        capture_sources(&f.state, screen_and_mic()).await.unwrap();

        start_recording(&f.state).await.unwrap();
        let options = f.platform.last_recorder().unwrap().options();
        assert_eq!(options.mime_type.as_deref(), Some("video/mp4"));
        assert_eq!(options.video_bits_per_second, Some(6_000_000));
    }

    #[tokio::test]
    async fn test_sync_mirrors_progress() {
        let f = fixture();
        capture_sources(&f.state, screen_and_mic()).await.unwrap();
        start_recording(&f.state).await.unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![0; 64]);
        f.clock.advance(1500);

        let recording = sync_recorder(&f.state).await.unwrap();
        assert_eq!(recording.status, RecorderStatus::Recording);
        assert_eq!(recording.chunk_count, 1);
        assert_eq!(recording.bytes_recorded, 64);
        assert_eq!(recording.duration_ms, 1500);
        assert_eq!(recording.start_time_ms, Some(10_000));
        assert_eq!(get_recording_duration(&f.state).await.unwrap(), 1500);
    }

    #[tokio::test]
    async fn test_release_sources_rejected_while_recording() {
        let f = fixture();
        capture_sources(&f.state, screen_and_mic()).await.unwrap();
        start_recording(&f.state).await.unwrap();
        assert!(release_sources(&f.state).await.is_err());

        f.platform.last_recorder().unwrap().emit_chunk(vec![1; 4]);
        stop_recording(&f.state).await.unwrap();
        release_sources(&f.state).await.unwrap();

        assert!(f.devices.issued_tracks().iter().all(|t| !t.is_live()));
        let studio = f.state.studio.lock().await;
        assert_eq!(
            studio.store.state().media.streams,
            crate::capture::StreamPresence::default()
        );
        assert_eq!(studio.store.state().ui.active_panel, ActivePanel::Source);
    }

    #[tokio::test]
    async fn test_microphone_mute() {
        let f = fixture();
        assert!(!set_microphone_muted(&f.state, true).await.unwrap());

        capture_sources(&f.state, screen_and_mic()).await.unwrap();
        assert!(set_microphone_muted(&f.state, true).await.unwrap());
        let studio = f.state.studio.lock().await;
        assert!(studio.audio.microphone_track().is_some_and(|t| !t.enabled()));
    }

    #[tokio::test]
    async fn test_save_recording_into_directory() {
        let f = fixture();
        capture_sources(&f.state, screen_and_mic()).await.unwrap();
        start_recording(&f.state).await.unwrap();
        f.platform.last_recorder().unwrap().emit_chunk(vec![9; 32]);
        stop_recording(&f.state).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = save_recording(&f.state, dir.path()).await.unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read(&path).unwrap(), vec![9; 32]);
        assert!(has_recording(&f.state).await);
    }

    #[tokio::test]
    async fn test_get_devices_updates_store() {
        let f = fixture();
        let devices = get_devices(&f.state).await.unwrap();
        assert_eq!(devices.video.len(), 1);
        assert_eq!(devices.audio.len(), 1);

        let studio = f.state.studio.lock().await;
        assert_eq!(studio.store.state().media.available_devices, devices);
    }
}
