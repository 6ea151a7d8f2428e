//! Artifact assembly
//!
//! Assembly is a pure function of the ordered chunk list: the artifact's
//! bytes are the chunks concatenated in sequence order.

use std::sync::Arc;

use super::urls::{ArtifactUrl, ObjectUrlRegistry};
use super::OutputError;
use crate::recorder::DataChunk;

/// MIME type used when neither the caller nor the chunks name one
pub const FALLBACK_MIME_TYPE: &str = "video/webm;codecs=vp8,opus";

/// A finished recording as a single binary object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    data: Arc<[u8]>,
    mime_type: String,
    chunk_count: usize,
}

impl OutputArtifact {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Concatenate `chunks` into one artifact
///
/// The type is `hint` when non-empty, else the first chunk's type when
/// non-empty, else [`FALLBACK_MIME_TYPE`].
pub fn assemble(chunks: &[DataChunk], hint: Option<&str>) -> Result<OutputArtifact, OutputError> {
    assemble_with_fallback(chunks, hint, FALLBACK_MIME_TYPE)
}

/// [`assemble`] with a caller-chosen fallback type
pub fn assemble_with_fallback(
    chunks: &[DataChunk],
    hint: Option<&str>,
    fallback: &str,
) -> Result<OutputArtifact, OutputError> {
    if chunks.is_empty() {
        return Err(OutputError::EmptyInput);
    }

    let mime_type = hint
        .filter(|t| !t.is_empty())
        .or_else(|| chunks.first().map(|c| c.mime_type()).filter(|t| !t.is_empty()))
        .unwrap_or(fallback)
        .to_string();

    let total: usize = chunks.iter().map(|c| c.size()).sum();
    let mut data = Vec::with_capacity(total);
    for chunk in chunks {
        data.extend_from_slice(chunk.data());
    }

    Ok(OutputArtifact {
        data: data.into(),
        mime_type,
        chunk_count: chunks.len(),
    })
}

/// Builds artifacts and manages their reference handles
pub struct OutputAssembler {
    urls: Arc<ObjectUrlRegistry>,
    fallback_mime_type: String,
}

impl OutputAssembler {
    pub fn new(urls: Arc<ObjectUrlRegistry>) -> Self {
        Self::with_fallback(urls, FALLBACK_MIME_TYPE)
    }

    pub fn with_fallback(urls: Arc<ObjectUrlRegistry>, fallback_mime_type: impl Into<String>) -> Self {
        Self {
            urls,
            fallback_mime_type: fallback_mime_type.into(),
        }
    }

    pub fn assemble(
        &self,
        chunks: &[DataChunk],
        hint: Option<&str>,
    ) -> Result<OutputArtifact, OutputError> {
        let artifact = assemble_with_fallback(chunks, hint, &self.fallback_mime_type)?;
        tracing::info!(
            "Assembled {} chunk(s) into {} bytes ({})",
            artifact.chunk_count(),
            artifact.size(),
            artifact.mime_type()
        );
        Ok(artifact)
    }

    pub fn create_object_url(&self, artifact: &OutputArtifact) -> ArtifactUrl {
        self.urls.create(artifact)
    }

    pub fn revoke_object_url(&self, url: &ArtifactUrl) -> bool {
        self.urls.revoke(url)
    }

    pub fn resolve(&self, url: &ArtifactUrl) -> Result<OutputArtifact, OutputError> {
        self.urls
            .resolve(url)
            .ok_or_else(|| OutputError::UnknownUrl(url.to_string()))
    }

    pub fn live_urls(&self) -> Vec<ArtifactUrl> {
        self.urls.live_urls()
    }

    /// Registry shared with the state store
    pub fn registry(&self) -> Arc<ObjectUrlRegistry> {
        self.urls.clone()
    }
}
