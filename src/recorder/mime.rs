//! MIME type negotiation
//!
//! Type negotiation never fails: when nothing in the priority list is
//! supported the recorder is created without a hint and the platform picks.

/// Known-good container/codec pairs, best first
pub const RECORDER_MIME_TYPES: [&str; 4] = [
    "video/webm;codecs=vp9,opus",
    "video/webm;codecs=vp8,opus",
    "video/webm",
    "video/mp4",
];

pub fn default_mime_priority() -> Vec<String> {
    RECORDER_MIME_TYPES.iter().map(|t| t.to_string()).collect()
}

/// Pick the MIME type to record with
///
/// The requested type wins when supported; otherwise the first supported
/// entry of `priority`; otherwise `None`.
pub fn resolve_mime_type<F>(requested: Option<&str>, priority: &[String], is_supported: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    if let Some(requested) = requested.filter(|t| !t.is_empty()) {
        if is_supported(requested) {
            return Some(requested.to_string());
        }
        tracing::debug!("Requested MIME type {} is not supported, falling back", requested);
    }

    let resolved = priority.iter().find(|t| is_supported(t.as_str())).cloned();
    if resolved.is_none() {
        tracing::warn!("No preferred MIME type is supported, using the platform default");
    }
    resolved
}

/// Every entry of `priority` the platform supports, in priority order
pub fn supported_mime_types<F>(priority: &[String], is_supported: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    priority
        .iter()
        .filter(|t| is_supported(t.as_str()))
        .cloned()
        .collect()
}
