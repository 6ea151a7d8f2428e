//! In-process capture devices

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;

use crate::capture::{
    DeviceKind, DisplayMediaConstraints, MediaDeviceInfo, MediaDevices, MediaTrack,
    PlatformError, TrackKind, UserMediaConstraints, VideoConstraints,
};

/// Largest size the synthetic camera accepts
const MAX_CAMERA_WIDTH: u32 = 3840;
const MAX_CAMERA_HEIGHT: u32 = 2160;

/// Acquisition path a failure can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticSource {
    Display,
    Camera,
    Microphone,
}

/// Capture devices backed by plain in-memory tracks
///
/// Starts with one camera (`camera-0`) and one microphone (`mic-0`).
pub struct SyntheticMediaDevices {
    devices: Mutex<Vec<MediaDeviceInfo>>,
    failures: Mutex<HashMap<SyntheticSource, PlatformError>>,
    issued: Mutex<Vec<MediaTrack>>,
    displays_shared: Mutex<u32>,
    supports_display: bool,
    supports_system_audio: bool,
    change_tx: broadcast::Sender<()>,
}

impl SyntheticMediaDevices {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(16);
        Self {
            devices: Mutex::new(vec![
                MediaDeviceInfo {
                    device_id: "camera-0".to_string(),
                    kind: DeviceKind::VideoInput,
                    label: "Synthetic Camera".to_string(),
                    group_id: "synthetic-camera".to_string(),
                },
                MediaDeviceInfo {
                    device_id: "mic-0".to_string(),
                    kind: DeviceKind::AudioInput,
                    label: "Synthetic Microphone".to_string(),
                    group_id: "synthetic-mic".to_string(),
                },
            ]),
            failures: Mutex::new(HashMap::new()),
            issued: Mutex::new(Vec::new()),
            displays_shared: Mutex::new(0),
            supports_display: true,
            supports_system_audio: true,
            change_tx,
        }
    }

    /// A platform without display capture or system audio
    pub fn without_display_capture() -> Self {
        Self {
            supports_display: false,
            supports_system_audio: false,
            ..Self::new()
        }
    }

    /// Make every acquisition from `source` fail with `error` (or succeed again with `None`)
    pub fn set_failure(&self, source: SyntheticSource, error: Option<PlatformError>) {
        let mut failures = self.failures.lock();
        match error {
            Some(error) => {
                failures.insert(source, error);
            }
            None => {
                failures.remove(&source);
            }
        }
    }

    pub fn add_device(&self, device: MediaDeviceInfo) {
        self.devices.lock().push(device);
        let _ = self.change_tx.send(());
    }

    pub fn remove_device(&self, device_id: &str) -> bool {
        let removed = {
            let mut devices = self.devices.lock();
            let before = devices.len();
            devices.retain(|d| d.device_id != device_id);
            devices.len() != before
        };
        if removed {
            let _ = self.change_tx.send(());
        }
        removed
    }

    /// Every track handed out so far, live or not
    pub fn issued_tracks(&self) -> Vec<MediaTrack> {
        self.issued.lock().clone()
    }

    /// Simulate the user revoking screen sharing from outside the app
    pub fn end_screen_share(&self) {
        let screens: Vec<MediaTrack> = self
            .issued
            .lock()
            .iter()
            .filter(|t| t.kind() == TrackKind::Video && t.label().starts_with("Screen") && t.is_live())
            .cloned()
            .collect();
        // Listeners run outside the lock
        for track in screens {
            track.end_from_source();
        }
    }

    fn check_failure(&self, source: SyntheticSource) -> Result<(), PlatformError> {
        match self.failures.lock().get(&source) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn find_device(&self, kind: DeviceKind, device_id: Option<&str>) -> Result<MediaDeviceInfo, PlatformError> {
        let devices = self.devices.lock();
        let found = match device_id {
            Some(id) => devices.iter().find(|d| d.kind == kind && d.device_id == id),
            None => devices.iter().find(|d| d.kind == kind),
        };
        found.cloned().ok_or_else(|| {
            PlatformError::not_found(match device_id {
                Some(id) => format!("Requested device not found: {id}"),
                None => "Requested device not found".to_string(),
            })
        })
    }

    fn issue(&self, tracks: &[MediaTrack]) {
        self.issued.lock().extend(tracks.iter().cloned());
    }
}

impl Default for SyntheticMediaDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for SyntheticMediaDevices {
    async fn get_display_media(
        &self,
        constraints: &DisplayMediaConstraints,
    ) -> Result<Vec<MediaTrack>, PlatformError> {
        if !self.supports_display {
            return Err(PlatformError::not_supported("Display capture is not supported"));
        }
        self.check_failure(SyntheticSource::Display)?;

        let index = {
            let mut shared = self.displays_shared.lock();
            *shared += 1;
            *shared
        };
        let mut tracks = vec![MediaTrack::new(TrackKind::Video, format!("Screen {index}"))];
        if constraints.audio && self.supports_system_audio {
            tracks.push(MediaTrack::new(TrackKind::Audio, "System Audio"));
        }
        self.issue(&tracks);
        Ok(tracks)
    }

    async fn get_user_media(
        &self,
        constraints: &UserMediaConstraints,
    ) -> Result<Vec<MediaTrack>, PlatformError> {
        if constraints.video.is_none() && constraints.audio.is_none() {
            return Err(PlatformError::new(
                "TypeError",
                "At least one of audio and video must be requested",
            ));
        }

        let camera = match &constraints.video {
            Some(video) => {
                self.check_failure(SyntheticSource::Camera)?;
                Some(self.find_device(DeviceKind::VideoInput, video.device_id.as_deref())?)
            }
            None => None,
        };
        let microphone = match &constraints.audio {
            Some(audio) => {
                self.check_failure(SyntheticSource::Microphone)?;
                Some(self.find_device(DeviceKind::AudioInput, audio.device_id.as_deref())?)
            }
            None => None,
        };

        let mut tracks = Vec::new();
        if let Some(camera) = camera {
            tracks.push(MediaTrack::new(TrackKind::Video, camera.display_name()));
        }
        if let Some(microphone) = microphone {
            tracks.push(MediaTrack::new(TrackKind::Audio, microphone.display_name()));
        }
        self.issue(&tracks);
        Ok(tracks)
    }

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, PlatformError> {
        Ok(self.devices.lock().clone())
    }

    async fn apply_constraints(
        &self,
        track: &MediaTrack,
        constraints: &VideoConstraints,
    ) -> Result<(), PlatformError> {
        if !track.is_live() {
            return Err(PlatformError::invalid_state("Track has ended"));
        }
        if constraints.ideal.width > MAX_CAMERA_WIDTH || constraints.ideal.height > MAX_CAMERA_HEIGHT {
            return Err(PlatformError::overconstrained("width"));
        }
        Ok(())
    }

    fn device_changes(&self) -> broadcast::Receiver<()> {
        self.change_tx.subscribe()
    }

    fn supports_display_capture(&self) -> bool {
        self.supports_display
    }

    fn supports_system_audio(&self) -> bool {
        self.supports_system_audio
    }
}
