//! Saving artifacts to disk

use chrono::{DateTime, Utc};
use std::path::Path;

use super::assembler::OutputArtifact;
use super::types::OutputFormat;
use super::OutputError;

/// Download name, e.g. `screen_recording_2024-03-01_14-05-09-042.webm`
pub fn suggested_file_name(format: OutputFormat, at: DateTime<Utc>) -> String {
    format!(
        "screen_recording_{}.{}",
        at.format("%Y-%m-%d_%H-%M-%S-%3f"),
        format.extension()
    )
}

/// Human readable size using binary units, e.g. `1.5 MB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Write the artifact's bytes to `path`, creating parent directories
pub fn save_artifact(artifact: &OutputArtifact, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, artifact.data())?;
    tracing::info!(
        "Saved recording to {} ({})",
        path.display(),
        format_file_size(artifact.size() as u64)
    );
    Ok(())
}
