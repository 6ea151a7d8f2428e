//! Screen capture service
//!
//! Owns the single display-capture stream. When the user stops sharing from
//! outside the app, the video track's `ended` listener clears the held
//! stream immediately.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::stream::{MediaStream, MediaTrack, StreamRole, StreamSlot};
use super::traits::{DisplayMediaConstraints, DisplaySurface, MediaDevices, ScreenVideoConstraints};
use super::{CaptureError, CaptureResult};

/// Options for a display capture request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenCaptureOptions {
    /// Include system audio
    pub audio: bool,

    /// Preferred surface to offer the user
    pub display_surface: Option<DisplaySurface>,
}

impl Default for ScreenCaptureOptions {
    fn default() -> Self {
        Self {
            audio: true,
            display_surface: None,
        }
    }
}

/// Acquires and releases the screen stream
pub struct ScreenCaptureService {
    devices: Arc<dyn MediaDevices>,
    constraints: ScreenVideoConstraints,
    slot: StreamSlot,
}

impl ScreenCaptureService {
    pub fn new(devices: Arc<dyn MediaDevices>, constraints: ScreenVideoConstraints) -> Self {
        Self {
            devices,
            constraints,
            slot: StreamSlot::default(),
        }
    }

    /// Capture the screen, replacing any stream held before
    pub async fn capture_screen(&self, options: ScreenCaptureOptions) -> CaptureResult<MediaStream> {
        // The previous stream must be fully stopped before the platform
        // is asked for a new one.
        self.stop_capture();

        let constraints = DisplayMediaConstraints {
            video: ScreenVideoConstraints {
                display_surface: options.display_surface.or(self.constraints.display_surface),
                ..self.constraints.clone()
            },
            audio: options.audio,
        };

        let tracks = self
            .devices
            .get_display_media(&constraints)
            .await
            .map_err(|e| {
                let error = CaptureError::from(e);
                tracing::error!("Screen capture failed: {}", error);
                error
            })?;

        let stream = MediaStream::new(StreamRole::Screen, tracks);
        if stream.video_tracks().next().is_none() {
            stream.stop();
            return Err(CaptureError::NotSupported(
                "Display capture returned no video track".to_string(),
            ));
        }

        if let Some(video) = stream.video_tracks().next() {
            let slot = self.slot.downgrade();
            let stream_id = stream.id().to_string();
            video.on_ended(move |_| {
                if slot.clear_if(&stream_id) {
                    tracing::info!("Screen sharing stopped by the user");
                }
            });
        }

        tracing::info!(
            "Screen capture started: {} track(s), system audio: {}",
            stream.tracks().len(),
            stream.audio_tracks().next().is_some()
        );

        self.slot.set(stream.clone());
        Ok(stream)
    }

    /// Stop all tracks of the held stream and clear it
    pub fn stop_capture(&self) {
        if self.slot.stop() {
            tracing::info!("Screen capture stopped");
        }
    }

    /// Current screen stream, if any
    pub fn stream(&self) -> Option<MediaStream> {
        self.slot.get()
    }

    pub fn is_capturing(&self) -> bool {
        self.slot.is_capturing()
    }

    pub fn video_track(&self) -> Option<MediaTrack> {
        self.slot.get()?.video_tracks().next().cloned()
    }

    /// System audio track, present when the user shared audio
    pub fn audio_track(&self) -> Option<MediaTrack> {
        self.slot.get()?.audio_tracks().next().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::traits::PlatformError;
    use crate::capture::TrackState;
    use crate::synthetic::{SyntheticMediaDevices, SyntheticSource};
    use crate::utils::error::MediaErrorKind;

    fn service(devices: &Arc<SyntheticMediaDevices>) -> ScreenCaptureService {
        ScreenCaptureService::new(devices.clone(), ScreenVideoConstraints::default())
    }

    #[tokio::test]
    async fn test_second_capture_stops_first_stream() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let screen = service(&devices);

        let first = screen.capture_screen(ScreenCaptureOptions::default()).await.unwrap();
        let second = screen.capture_screen(ScreenCaptureOptions::default()).await.unwrap();

        assert!(first.tracks().iter().all(|t| t.state() == TrackState::Ended));
        assert!(second.active());
        assert_eq!(screen.stream().unwrap().id(), second.id());

        let live_screens = devices
            .issued_tracks()
            .iter()
            .filter(|t| t.label().starts_with("Screen") && t.is_live())
            .count();
        assert_eq!(live_screens, 1);
    }

    #[tokio::test]
    async fn test_revoked_sharing_clears_stream_immediately() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let screen = service(&devices);

        screen.capture_screen(ScreenCaptureOptions::default()).await.unwrap();
        assert!(screen.is_capturing());

        devices.end_screen_share();

        assert!(screen.stream().is_none());
        assert!(!screen.is_capturing());
    }

    #[tokio::test]
    async fn test_revoked_sharing_stops_system_audio() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let screen = service(&devices);

        let stream = screen.capture_screen(ScreenCaptureOptions::default()).await.unwrap();
        assert_eq!(stream.audio_tracks().count(), 1);

        devices.end_screen_share();

        let live_system_audio = devices
            .issued_tracks()
            .iter()
            .filter(|t| t.label() == "System Audio" && t.is_live())
            .count();
        assert_eq!(live_system_audio, 0);
        assert!(!stream.active());
    }

    #[tokio::test]
    async fn test_stale_ended_listener_leaves_new_stream_alone() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let screen = service(&devices);

        let first = screen.capture_screen(ScreenCaptureOptions::default()).await.unwrap();
        let second = screen.capture_screen(ScreenCaptureOptions::default()).await.unwrap();

        // The first stream's track was stopped by us; ending it again from
        // the source must not clear the replacement.
        for track in first.video_tracks() {
            track.end_from_source();
        }
        assert_eq!(screen.stream().unwrap().id(), second.id());
    }

    #[tokio::test]
    async fn test_permission_denied_is_mapped() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        devices.set_failure(
            SyntheticSource::Display,
            Some(PlatformError::not_allowed("denied")),
        );
        let screen = service(&devices);

        let err = screen
            .capture_screen(ScreenCaptureOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), MediaErrorKind::PermissionDenied);
        assert!(screen.stream().is_none());
    }

    #[tokio::test]
    async fn test_stop_capture_is_idempotent() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let screen = service(&devices);

        let stream = screen.capture_screen(ScreenCaptureOptions::default()).await.unwrap();
        screen.stop_capture();
        screen.stop_capture();

        assert!(!stream.active());
        assert!(screen.stream().is_none());
    }

    #[tokio::test]
    async fn test_system_audio_track_only_when_requested() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let screen = service(&devices);

        screen
            .capture_screen(ScreenCaptureOptions {
                audio: false,
                display_surface: None,
            })
            .await
            .unwrap();
        assert!(screen.audio_track().is_none());

        screen.capture_screen(ScreenCaptureOptions::default()).await.unwrap();
        assert!(screen.audio_track().is_some());
        assert!(screen.video_track().is_some());
    }
}
