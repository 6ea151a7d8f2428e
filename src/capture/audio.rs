//! Audio capture service (microphone and system audio)
//!
//! System audio is not captured here: it arrives as an audio track of the
//! screen stream when the user shares it.

use std::sync::Arc;

use super::stream::{MediaStream, MediaTrack, StreamRole, StreamSlot};
use super::traits::{AudioConstraints, MediaDevices, UserMediaConstraints};
use super::{CaptureError, CaptureResult};

/// Acquires and releases the microphone stream
pub struct AudioCaptureService {
    devices: Arc<dyn MediaDevices>,
    constraints: AudioConstraints,
    slot: StreamSlot,
}

impl AudioCaptureService {
    pub fn new(devices: Arc<dyn MediaDevices>, constraints: AudioConstraints) -> Self {
        Self {
            devices,
            constraints,
            slot: StreamSlot::default(),
        }
    }

    /// Open the microphone, replacing any stream held before
    pub async fn capture_microphone(&self, device_id: Option<&str>) -> CaptureResult<MediaStream> {
        self.stop_microphone_capture();

        let constraints = UserMediaConstraints {
            video: None,
            audio: Some(AudioConstraints {
                device_id: device_id.map(str::to_string),
                ..self.constraints.clone()
            }),
        };

        let tracks = self
            .devices
            .get_user_media(&constraints)
            .await
            .map_err(|e| {
                let error = CaptureError::from(e);
                tracing::error!("Microphone capture failed: {}", error);
                error
            })?;

        let stream = MediaStream::new(StreamRole::Microphone, tracks);
        tracing::info!(
            "Microphone capture started: device={}",
            device_id.unwrap_or("default")
        );

        self.slot.set(stream.clone());
        Ok(stream)
    }

    /// Stop all tracks of the held stream and clear it
    pub fn stop_microphone_capture(&self) {
        if self.slot.stop() {
            tracing::info!("Microphone capture stopped");
        }
    }

    pub fn microphone_stream(&self) -> Option<MediaStream> {
        self.slot.get()
    }

    pub fn is_microphone_capturing(&self) -> bool {
        self.slot.is_capturing()
    }

    pub fn microphone_track(&self) -> Option<MediaTrack> {
        self.slot.get()?.audio_tracks().next().cloned()
    }

    /// Audio track of a screen stream, when system audio was shared
    pub fn system_audio_track(&self, screen_stream: &MediaStream) -> Option<MediaTrack> {
        screen_stream.audio_tracks().next().cloned()
    }

    /// Build a stream holding the given audio tracks, or `None` if both are absent
    pub fn combine_audio_tracks(
        &self,
        microphone: Option<&MediaTrack>,
        system_audio: Option<&MediaTrack>,
    ) -> Option<MediaStream> {
        let tracks: Vec<MediaTrack> = microphone
            .into_iter()
            .chain(system_audio)
            .cloned()
            .collect();
        if tracks.is_empty() {
            return None;
        }
        Some(MediaStream::new(StreamRole::Combined, tracks))
    }

    /// Mute or unmute the microphone track
    ///
    /// Returns false when no microphone is being captured.
    pub fn set_muted(&self, muted: bool) -> bool {
        match self.microphone_track() {
            Some(track) => {
                track.set_enabled(!muted);
                tracing::debug!("Microphone muted: {}", muted);
                true
            }
            None => false,
        }
    }
}
