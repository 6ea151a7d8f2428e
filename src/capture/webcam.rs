//! Webcam capture service

use std::sync::Arc;

use super::stream::{MediaStream, MediaTrack, StreamRole, StreamSlot};
use super::traits::{MediaDevices, UserMediaConstraints, VideoConstraints};
use super::{CaptureError, CaptureResult};

/// Acquires and releases the webcam stream
///
/// Audio is never requested here; the microphone has its own service.
pub struct WebcamService {
    devices: Arc<dyn MediaDevices>,
    constraints: VideoConstraints,
    slot: StreamSlot,
}

impl WebcamService {
    pub fn new(devices: Arc<dyn MediaDevices>, constraints: VideoConstraints) -> Self {
        Self {
            devices,
            constraints,
            slot: StreamSlot::default(),
        }
    }

    /// Open the webcam, replacing any stream held before
    ///
    /// `device_id` pins an exact device; `None` uses the platform default.
    pub async fn capture_webcam(&self, device_id: Option<&str>) -> CaptureResult<MediaStream> {
        self.stop_capture();

        let constraints = UserMediaConstraints {
            video: Some(VideoConstraints {
                device_id: device_id.map(str::to_string),
                ..self.constraints.clone()
            }),
            audio: None,
        };

        let tracks = self
            .devices
            .get_user_media(&constraints)
            .await
            .map_err(|e| {
                let error = CaptureError::from(e);
                tracing::error!("Webcam capture failed: {}", error);
                error
            })?;

        let stream = MediaStream::new(StreamRole::Webcam, tracks);
        tracing::info!(
            "Webcam capture started: device={}",
            device_id.unwrap_or("default")
        );

        self.slot.set(stream.clone());
        Ok(stream)
    }

    /// Stop all tracks of the held stream and clear it
    pub fn stop_capture(&self) {
        if self.slot.stop() {
            tracing::info!("Webcam capture stopped");
        }
    }

    pub fn stream(&self) -> Option<MediaStream> {
        self.slot.get()
    }

    pub fn is_capturing(&self) -> bool {
        self.slot.is_capturing()
    }

    pub fn video_track(&self) -> Option<MediaTrack> {
        self.slot.get()?.video_tracks().next().cloned()
    }

    /// Re-negotiate the live video track
    ///
    /// Returns false when there is no track or the platform rejects the
    /// constraints.
    pub async fn apply_constraints(&self, constraints: &VideoConstraints) -> bool {
        let Some(track) = self.video_track() else {
            return false;
        };

        match self.devices.apply_constraints(&track, constraints).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to apply webcam constraints: {}", CaptureError::from(e));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::traits::Resolution;
    use crate::synthetic::SyntheticMediaDevices;
    use crate::utils::error::MediaErrorKind;

    #[tokio::test]
    async fn test_unknown_device_is_not_found() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let webcam = WebcamService::new(devices, VideoConstraints::default());

        let err = webcam.capture_webcam(Some("no-such-camera")).await.unwrap_err();
        assert_eq!(err.kind(), MediaErrorKind::DeviceNotFound);
        assert!(!webcam.is_capturing());
    }

    #[tokio::test]
    async fn test_capture_default_camera() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let webcam = WebcamService::new(devices, VideoConstraints::default());

        let stream = webcam.capture_webcam(None).await.unwrap();
        assert_eq!(stream.role(), StreamRole::Webcam);
        assert_eq!(stream.audio_tracks().count(), 0);
        assert!(webcam.video_track().is_some());

        webcam.stop_capture();
        assert!(!stream.active());
    }

    #[tokio::test]
    async fn test_apply_constraints() {
        let devices = Arc::new(SyntheticMediaDevices::new());
        let webcam = WebcamService::new(devices, VideoConstraints::default());

        // No track yet
        assert!(!webcam.apply_constraints(&VideoConstraints::default()).await);

        webcam.capture_webcam(None).await.unwrap();
        assert!(webcam.apply_constraints(&VideoConstraints::default()).await);

        let too_large = VideoConstraints {
            ideal: Resolution {
                width: 7680,
                height: 4320,
            },
            ..VideoConstraints::default()
        };
        assert!(!webcam.apply_constraints(&too_large).await);
    }
}
