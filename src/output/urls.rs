//! Revocable references to assembled artifacts

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::assembler::OutputArtifact;

const URL_PREFIX: &str = "blob:open-screenrecorder/";

/// Opaque handle to an artifact held by an [`ObjectUrlRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactUrl(String);

impl ArtifactUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Live artifact URLs. Each URL is revoked exactly once.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    live: Mutex<HashMap<String, OutputArtifact>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, artifact: &OutputArtifact) -> ArtifactUrl {
        let url = format!("{URL_PREFIX}{}", Uuid::new_v4());
        self.live.lock().insert(url.clone(), artifact.clone());
        tracing::debug!("Created artifact URL {}", url);
        ArtifactUrl(url)
    }

    /// Release a URL. Returns false if it was already revoked or never issued.
    pub fn revoke(&self, url: &ArtifactUrl) -> bool {
        if self.live.lock().remove(url.as_str()).is_some() {
            tracing::debug!("Revoked artifact URL {}", url);
            true
        } else {
            tracing::warn!("Artifact URL {} is not live", url);
            false
        }
    }

    pub fn resolve(&self, url: &ArtifactUrl) -> Option<OutputArtifact> {
        self.live.lock().get(url.as_str()).cloned()
    }

    pub fn live_urls(&self) -> Vec<ArtifactUrl> {
        self.live.lock().keys().cloned().map(ArtifactUrl).collect()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}
