//! Application state types

use serde::{Deserialize, Serialize};

use crate::capture::{DeviceList, MediaDeviceInfo, ScreenCaptureOptions, StreamPresence};
use crate::output::{ArtifactUrl, OutputFormat, QualityPreset, QualitySettings};
use crate::recorder::RecorderStatus;
use crate::utils::error::MediaErrorKind;

/// Overlay size used by the webcam presets
pub const WEBCAM_OVERLAY_SIZE: (u32, u32) = (320, 240);
/// Distance of a preset overlay from the viewport edge
pub const WEBCAM_OVERLAY_MARGIN: u32 = 16;
/// Viewport the default webcam position is computed against
pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);

/// Panel shown by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivePanel {
    #[default]
    Source,
    Preview,
    Controls,
    Output,
    Slides,
}

/// Webcam overlay placement in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebcamPosition {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WebcamCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl WebcamPosition {
    /// Preset placement in `corner` of a `viewport_width` x `viewport_height`
    /// viewport. Clamped to the viewport origin when it is too small.
    pub fn preset(corner: WebcamCorner, viewport_width: u32, viewport_height: u32) -> Self {
        let (width, height) = WEBCAM_OVERLAY_SIZE;
        let margin = WEBCAM_OVERLAY_MARGIN;
        let right = viewport_width.saturating_sub(width + margin);
        let bottom = viewport_height.saturating_sub(height + margin);
        let (x, y) = match corner {
            WebcamCorner::TopLeft => (margin, margin),
            WebcamCorner::TopRight => (right, margin),
            WebcamCorner::BottomLeft => (margin, bottom),
            WebcamCorner::BottomRight => (right, bottom),
        };
        Self { x, y, width, height }
    }
}

impl Default for WebcamPosition {
    fn default() -> Self {
        Self::preset(WebcamCorner::BottomRight, DEFAULT_VIEWPORT.0, DEFAULT_VIEWPORT.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
            level,
        }
    }
}

/// Sources the user picked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSources {
    pub screen: Option<ScreenCaptureOptions>,
    pub webcam: Option<MediaDeviceInfo>,
    pub microphone: Option<MediaDeviceInfo>,
    pub system_audio: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaState {
    pub available_devices: DeviceList,
    pub selected_sources: SelectedSources,
    pub streams: StreamPresence,
}

/// Error shown for a failed recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusError {
    pub kind: MediaErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingState {
    pub status: RecorderStatus,
    pub duration_ms: u64,
    pub start_time_ms: Option<u64>,
    pub chunk_count: usize,
    pub bytes_recorded: u64,
    pub error: Option<StatusError>,
}

/// The artifact as exposed to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputInfo {
    pub mime_type: String,
    pub size_bytes: u64,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputState {
    pub format: OutputFormat,
    pub quality: QualityPreset,
    pub custom_settings: QualitySettings,
    pub output: Option<OutputInfo>,
    pub download_url: Option<ArtifactUrl>,
}

impl Default for OutputState {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: QualityPreset::default(),
            custom_settings: QualitySettings::default(),
            output: None,
            download_url: None,
        }
    }
}

impl OutputState {
    /// Settings in effect for the selected preset
    pub fn effective_settings(&self) -> QualitySettings {
        self.quality.settings().unwrap_or(self.custom_settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub active_panel: ActivePanel,
    pub webcam_position: WebcamPosition,
    pub show_settings: bool,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub media: MediaState,
    pub recording: RecordingState,
    pub output: OutputState,
    pub ui: UiState,
}

/// Every mutation the store accepts
#[derive(Debug, Clone)]
pub enum Action {
    SetAvailableDevices(DeviceList),
    SetSelectedScreen(Option<ScreenCaptureOptions>),
    SetSelectedWebcam(Option<MediaDeviceInfo>),
    SetSelectedMicrophone(Option<MediaDeviceInfo>),
    SetSystemAudio(bool),
    SetStreams(StreamPresence),
    SetRecordingStatus(RecorderStatus),
    SetRecordingDuration(u64),
    SetRecordingStartTime(Option<u64>),
    SetRecordingProgress { chunk_count: usize, bytes: u64 },
    ClearRecordingChunks,
    SetRecordingError(Option<StatusError>),
    SetOutputFormat(OutputFormat),
    SetOutputQuality(QualityPreset),
    SetCustomQualitySettings(QualitySettings),
    SetOutput(Option<OutputInfo>),
    SetDownloadUrl(Option<ArtifactUrl>),
    SetActivePanel(ActivePanel),
    SetWebcamPosition(WebcamPosition),
    ToggleSettings,
    ShowSettings(bool),
    AddNotification(Notification),
    RemoveNotification(String),
    ClearNotifications,
    ResetRecording,
    ResetOutput,
    ResetState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webcam_presets() {
        assert_eq!(
            WebcamPosition::preset(WebcamCorner::TopLeft, 1920, 1080),
            WebcamPosition { x: 16, y: 16, width: 320, height: 240 }
        );
        assert_eq!(
            WebcamPosition::preset(WebcamCorner::BottomRight, 1920, 1080),
            WebcamPosition { x: 1584, y: 824, width: 320, height: 240 }
        );
        assert_eq!(WebcamPosition::default().x, 1280 - 336);
    }

    #[test]
    fn test_tiny_viewport_clamps_to_origin() {
        let position = WebcamPosition::preset(WebcamCorner::BottomRight, 100, 100);
        assert_eq!((position.x, position.y), (0, 0));
    }

    #[test]
    fn test_effective_settings_follow_preset() {
        let mut output = OutputState {
            quality: QualityPreset::High,
            ..OutputState::default()
        };
        assert_eq!(output.effective_settings().bitrate, 6_000_000);

        output.quality = QualityPreset::Custom;
        output.custom_settings.bitrate = 1_000_000;
        assert_eq!(output.effective_settings().bitrate, 1_000_000);
    }
}
