//! Stream registry
//!
//! Remembers the stream held for each role and builds the combined stream
//! the recorder consumes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::stream::{MediaStream, MediaTrack, StreamRole};

/// Which roles currently hold a stream, by stream ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPresence {
    pub screen: Option<String>,
    pub webcam: Option<String>,
    pub microphone: Option<String>,
    pub combined: Option<String>,
}

/// Per-role stream bookkeeping
#[derive(Debug)]
pub struct StreamRegistry {
    streams: HashMap<StreamRole, MediaStream>,
    include_system_audio: bool,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self {
            streams: HashMap::new(),
            include_system_audio: true,
        }
    }

    /// Record (or forget, with `None`) the stream for `role`
    pub fn set_stream(&mut self, role: StreamRole, stream: Option<MediaStream>) {
        match stream {
            Some(stream) => {
                self.streams.insert(role, stream);
            }
            None => {
                self.streams.remove(&role);
            }
        }
    }

    pub fn stream(&self, role: StreamRole) -> Option<&MediaStream> {
        self.streams.get(&role)
    }

    pub fn set_system_audio(&mut self, include: bool) {
        self.include_system_audio = include;
    }

    pub fn include_system_audio(&self) -> bool {
        self.include_system_audio
    }

    /// Forget streams whose tracks have all ended. Returns the roles removed.
    pub fn prune_ended(&mut self) -> Vec<StreamRole> {
        let ended: Vec<StreamRole> = self
            .streams
            .iter()
            .filter(|(_, stream)| !stream.active())
            .map(|(role, _)| *role)
            .collect();
        for role in &ended {
            tracing::debug!("Dropping ended {} stream", role);
            self.streams.remove(role);
        }
        ended
    }

    pub fn clear(&mut self) {
        self.streams.clear();
    }

    pub fn presence(&self) -> StreamPresence {
        let id = |role: StreamRole| self.streams.get(&role).map(|s| s.id().to_string());
        StreamPresence {
            screen: id(StreamRole::Screen),
            webcam: id(StreamRole::Webcam),
            microphone: id(StreamRole::Microphone),
            combined: id(StreamRole::Combined),
        }
    }

    /// Build the stream to record: the screen's video, its system audio when
    /// enabled and the microphone. The webcam is a preview overlay and is not
    /// recorded.
    ///
    /// Returns `None` unless the screen stream has a live video track.
    pub fn compose(&mut self) -> Option<MediaStream> {
        let screen = self
            .streams
            .get(&StreamRole::Screen)
            .filter(|s| s.video_tracks().any(MediaTrack::is_live))?;

        let mut tracks: Vec<MediaTrack> = screen.video_tracks().cloned().collect();
        if self.include_system_audio {
            tracks.extend(screen.audio_tracks().cloned());
        }
        if let Some(microphone) = self.streams.get(&StreamRole::Microphone) {
            tracks.extend(microphone.audio_tracks().cloned());
        }
        tracks.retain(MediaTrack::is_live);

        let combined = MediaStream::new(StreamRole::Combined, tracks);
        tracing::debug!(
            "Composed stream {} with {} track(s)",
            combined.id(),
            combined.tracks().len()
        );
        self.streams.insert(StreamRole::Combined, combined.clone());
        Some(combined)
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
