//! System-related commands
//!
//! Platform information and the capability checks the UI runs before
//! offering capture.

use serde::{Deserialize, Serialize};

use super::recording::RecorderState;
use crate::recorder::mime::supported_mime_types;
use crate::utils::error::ErrorResponse;

/// What the current platform can do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    pub screen_capture: bool,
    pub media_recorder: bool,
    pub system_audio: bool,
    /// Recorder types the platform accepts, in preference order
    pub supported_mime_types: Vec<String>,
}

impl CompatibilityReport {
    /// Recording needs both display capture and a recorder
    pub fn can_record(&self) -> bool {
        self.screen_capture && self.media_recorder
    }
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub os_version: String,
    pub arch: String,
    pub app_version: String,
}

/// Check platform support for capture and recording
pub async fn check_compatibility(state: &RecorderState) -> Result<CompatibilityReport, ErrorResponse> {
    let studio = state.studio.lock().await;
    let platform = &studio.recorder_platform;
    let media_recorder = platform.is_available();
    let mime_types = if media_recorder {
        supported_mime_types(&studio.settings.recorder.mime_types, |t| {
            platform.is_type_supported(t)
        })
    } else {
        Vec::new()
    };

    let report = CompatibilityReport {
        screen_capture: studio.media.supports_display_capture(),
        media_recorder,
        system_audio: studio.media.supports_system_audio(),
        supported_mime_types: mime_types,
    };
    if !report.can_record() {
        tracing::warn!("Recording is not supported here: {:?}", report);
    }
    Ok(report)
}

/// Get basic system information
pub async fn get_system_info() -> Result<SystemInfo, ErrorResponse> {
    Ok(SystemInfo {
        os: std::env::consts::OS.to_string(),
        os_version: get_os_version(),
        arch: std::env::consts::ARCH.to_string(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn get_os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "Unknown".to_string())
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        "Unknown".to_string()
    }
}
