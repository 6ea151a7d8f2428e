//! Device enumeration
//!
//! Keeps the last known list of cameras and microphones and relays the
//! platform's change notifications.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::traits::{
    AudioConstraints, DeviceKind, MediaDeviceInfo, MediaDevices, UserMediaConstraints,
    VideoConstraints,
};
use super::{CaptureError, CaptureResult};

/// Input devices split by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceList {
    pub video: Vec<MediaDeviceInfo>,
    pub audio: Vec<MediaDeviceInfo>,
}

impl DeviceList {
    pub fn from_devices(devices: Vec<MediaDeviceInfo>) -> Self {
        let mut list = DeviceList::default();
        for device in devices {
            match device.kind {
                DeviceKind::VideoInput => list.video.push(device),
                DeviceKind::AudioInput => list.audio.push(device),
                DeviceKind::AudioOutput => {}
            }
        }
        list
    }

    /// Look up an input device by ID
    pub fn find(&self, device_id: &str) -> Option<&MediaDeviceInfo> {
        self.video
            .iter()
            .chain(self.audio.iter())
            .find(|d| d.device_id == device_id)
    }

    pub fn default_video_input(&self) -> Option<&MediaDeviceInfo> {
        self.video.first()
    }

    pub fn default_audio_input(&self) -> Option<&MediaDeviceInfo> {
        self.audio.first()
    }
}

/// Tracks attached input devices
pub struct DeviceWatcher {
    devices: Arc<dyn MediaDevices>,
    current: Mutex<DeviceList>,
}

impl DeviceWatcher {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            devices,
            current: Mutex::new(DeviceList::default()),
        }
    }

    /// Open and immediately close camera and microphone so the platform
    /// reveals device labels. Failure is ignored; devices can still be
    /// listed without labels.
    pub async fn request_labels(&self) {
        let constraints = UserMediaConstraints {
            video: Some(VideoConstraints::default()),
            audio: Some(AudioConstraints::default()),
        };
        match self.devices.get_user_media(&constraints).await {
            Ok(tracks) => {
                for track in tracks {
                    track.stop();
                }
            }
            Err(e) => tracing::debug!("Label permission request declined: {}", e),
        }
    }

    /// Re-enumerate devices
    pub async fn refresh(&self) -> CaptureResult<DeviceList> {
        let devices = self.devices.enumerate_devices().await.map_err(|e| {
            let error = CaptureError::from(e);
            tracing::error!("Failed to list available devices: {}", error);
            error
        })?;

        let list = DeviceList::from_devices(devices);
        tracing::debug!(
            "Found {} camera(s), {} microphone(s)",
            list.video.len(),
            list.audio.len()
        );
        *self.current.lock() = list.clone();
        Ok(list)
    }

    /// Last enumerated list
    pub fn current(&self) -> DeviceList {
        self.current.lock().clone()
    }

    /// Notifications of device attach/detach
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.devices.device_changes()
    }
}
