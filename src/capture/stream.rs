//! Media stream and track handles
//!
//! A [`MediaStream`] is a cheap, cloneable view over a set of shared
//! [`MediaTrack`]s. Stopping a track through any clone stops it everywhere.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Lifecycle of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    Live,
    Ended,
}

/// Logical source a stream is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamRole {
    Screen,
    Webcam,
    Microphone,
    /// Composition of other streams' tracks, built for the recorder
    Combined,
}

impl std::fmt::Display for StreamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamRole::Screen => write!(f, "screen"),
            StreamRole::Webcam => write!(f, "webcam"),
            StreamRole::Microphone => write!(f, "microphone"),
            StreamRole::Combined => write!(f, "combined"),
        }
    }
}

/// Identifier returned when registering an `ended` listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type EndedListener = Arc<dyn Fn(&MediaTrack) + Send + Sync>;

struct TrackInner {
    id: String,
    kind: TrackKind,
    label: String,
    ended: AtomicBool,
    enabled: AtomicBool,
    next_listener: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, EndedListener)>>,
}

/// One live audio or video track
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    /// Create a live track
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: Uuid::new_v4().to_string(),
                kind,
                label: label.into(),
                ended: AtomicBool::new(false),
                enabled: AtomicBool::new(true),
                next_listener: AtomicU64::new(0),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn state(&self) -> TrackState {
        if self.inner.ended.load(Ordering::Acquire) {
            TrackState::Ended
        } else {
            TrackState::Live
        }
    }

    pub fn is_live(&self) -> bool {
        self.state() == TrackState::Live
    }

    /// Whether the track produces media (false when muted)
    pub fn enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Release);
    }

    /// Stop the track from our side
    ///
    /// Does not notify `ended` listeners.
    pub fn stop(&self) {
        if !self.inner.ended.swap(true, Ordering::AcqRel) {
            tracing::debug!("Stopped {:?} track {}", self.inner.kind, self.inner.id);
        }
    }

    /// End the track from the platform side (device unplugged, sharing
    /// revoked by the user). Listeners run synchronously, in registration
    /// order.
    pub fn end_from_source(&self) {
        if self.inner.ended.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!("{:?} track {} ended by source", self.inner.kind, self.inner.id);

        let listeners: Vec<EndedListener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(self);
        }
    }

    /// Register a listener fired when the source ends the track
    pub fn on_ended<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&MediaTrack) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a previously registered listener
    pub fn remove_ended_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl std::fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("label", &self.inner.label)
            .field("state", &self.state())
            .field("enabled", &self.enabled())
            .finish()
    }
}

impl PartialEq for MediaTrack {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// A set of tracks bound to one role
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    role: StreamRole,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(role: StreamRole, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> StreamRole {
        self.role
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Audio)
    }

    /// True while at least one track is live
    pub fn active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    /// Stop every track
    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

/// Holder for the single stream a capture service owns
#[derive(Clone, Default)]
pub(crate) struct StreamSlot {
    inner: Arc<Mutex<Option<MediaStream>>>,
}

impl StreamSlot {
    pub(crate) fn get(&self) -> Option<MediaStream> {
        self.inner.lock().clone()
    }

    pub(crate) fn set(&self, stream: MediaStream) {
        *self.inner.lock() = Some(stream);
    }

    /// Stop all tracks of the held stream and clear it. Idempotent.
    pub(crate) fn stop(&self) -> bool {
        let stream = self.inner.lock().take();
        match stream {
            Some(stream) => {
                stream.stop();
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_capturing(&self) -> bool {
        self.inner.lock().as_ref().is_some_and(MediaStream::active)
    }

    pub(crate) fn downgrade(&self) -> WeakStreamSlot {
        WeakStreamSlot {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

pub(crate) struct WeakStreamSlot {
    inner: Weak<Mutex<Option<MediaStream>>>,
}

impl WeakStreamSlot {
    /// Release the stream with `stream_id` if the slot still holds it,
    /// stopping every remaining track
    pub(crate) fn clear_if(&self, stream_id: &str) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let stream = {
            let mut slot = inner.lock();
            if !slot.as_ref().is_some_and(|s| s.id() == stream_id) {
                return false;
            }
            slot.take()
        };
        if let Some(stream) = stream {
            stream.stop();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_stop_does_not_fire_ended_listeners() {
        let track = MediaTrack::new(TrackKind::Video, "screen");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        track.on_ended(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        track.stop();
        assert_eq!(track.state(), TrackState::Ended);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Already ended, so the source ending it is a no-op
        track.end_from_source();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_end_from_source_fires_listeners_once() {
        let track = MediaTrack::new(TrackKind::Video, "screen");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        track.on_ended(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        track.end_from_source();
        track.end_from_source();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!track.is_live());
    }

    #[test]
    fn test_removed_listener_is_not_called() {
        let track = MediaTrack::new(TrackKind::Audio, "mic");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let id = track.on_ended(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(track.remove_ended_listener(id));
        assert!(!track.remove_ended_listener(id));
        track.end_from_source();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stream_active_until_all_tracks_stop() {
        let video = MediaTrack::new(TrackKind::Video, "screen");
        let audio = MediaTrack::new(TrackKind::Audio, "system");
        let stream = MediaStream::new(StreamRole::Screen, vec![video.clone(), audio.clone()]);

        assert!(stream.active());
        video.stop();
        assert!(stream.active());
        audio.stop();
        assert!(!stream.active());
    }

    #[test]
    fn test_slot_clear_if_matches_stream_id() {
        let slot = StreamSlot::default();
        let stream = MediaStream::new(
            StreamRole::Webcam,
            vec![MediaTrack::new(TrackKind::Video, "cam")],
        );
        slot.set(stream.clone());

        let weak = slot.downgrade();
        assert!(!weak.clear_if("another-stream"));
        assert!(slot.get().is_some());
        assert!(weak.clear_if(stream.id()));
        assert!(slot.get().is_none());
        assert!(!stream.active());
    }
}
