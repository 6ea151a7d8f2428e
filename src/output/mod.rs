//! Output assembly module
//!
//! Turns the chunks of a finished recording into a single artifact, hands
//! out revocable references to it and writes it to disk.

pub mod assembler;
pub mod files;
pub mod types;
pub mod urls;

pub use assembler::{assemble, assemble_with_fallback, OutputArtifact, OutputAssembler, FALLBACK_MIME_TYPE};
pub use files::{format_file_size, save_artifact, suggested_file_name};
pub use types::{OutputFormat, QualityPreset, QualitySettings};
pub use urls::{ArtifactUrl, ObjectUrlRegistry};

use thiserror::Error;

use crate::utils::error::MediaErrorKind;

/// Output errors
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("No recorded data to assemble")]
    EmptyInput,

    #[error("Unknown artifact URL: {0}")]
    UnknownUrl(String),

    #[error("Failed to write recording: {0}")]
    Io(#[from] std::io::Error),
}

impl OutputError {
    pub fn kind(&self) -> MediaErrorKind {
        match self {
            OutputError::EmptyInput => MediaErrorKind::EmptyArtifact,
            OutputError::UnknownUrl(_) | OutputError::Io(_) => MediaErrorKind::Unknown,
        }
    }
}
