//! Track and stream abstractions
//!
//! A [`MediaStreamTrack`] is the owning handle of one hardware track: dropping
//! it stops the hardware. Display surfaces get [`TrackView`]s and
//! [`StreamView`]s instead, which only hold weak references and can never stop
//! or re-enable anything.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    /// Microphone audio
    Audio,
    /// Camera video
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// Host-side handle of a hardware track
pub trait PlatformTrack: Send + Sync + fmt::Debug {
    /// Mirror the `enabled` flag onto the hardware track
    fn set_enabled(&self, enabled: bool);

    /// Stop the hardware track and release the device
    fn stop(&self);
}

#[derive(Debug, Clone, Copy)]
struct TrackFlags {
    enabled: bool,
    ended: bool,
}

#[derive(Debug)]
struct TrackShared {
    id: String,
    kind: MediaKind,
    label: String,
    flags: RwLock<TrackFlags>,
    platform: Box<dyn PlatformTrack>,
}

/// Owning handle of an acquired hardware track
#[derive(Debug)]
pub struct MediaStreamTrack {
    shared: Arc<TrackShared>,
}

impl MediaStreamTrack {
    /// Wrap a freshly acquired hardware track; tracks start enabled
    pub fn new(
        id: impl Into<String>,
        kind: MediaKind,
        label: impl Into<String>,
        platform: Box<dyn PlatformTrack>,
    ) -> Self {
        Self {
            shared: Arc::new(TrackShared {
                id: id.into(),
                kind,
                label: label.into(),
                flags: RwLock::new(TrackFlags {
                    enabled: true,
                    ended: false,
                }),
                platform,
            }),
        }
    }

    /// Get track ID
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Get track kind
    pub fn kind(&self) -> MediaKind {
        self.shared.kind
    }

    /// Device label
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Whether the track currently produces media
    pub fn enabled(&self) -> bool {
        self.shared.flags.read().enabled
    }

    /// Whether the track has been stopped
    pub fn is_ended(&self) -> bool {
        self.shared.flags.read().ended
    }

    /// Enable or disable the track without releasing the device.
    ///
    /// Returns `false` if the track has already ended.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let mut flags = self.shared.flags.write();
        if flags.ended {
            return false;
        }
        if flags.enabled != enabled {
            flags.enabled = enabled;
            self.shared.platform.set_enabled(enabled);
        }
        true
    }

    /// Stop the hardware track. Returns `true` only for the call that
    /// actually stopped it.
    pub fn stop(&self) -> bool {
        let mut flags = self.shared.flags.write();
        if flags.ended {
            return false;
        }
        flags.ended = true;
        flags.enabled = false;
        self.shared.platform.stop();
        debug!("Stopped {} track {}", self.shared.kind, self.shared.id);
        true
    }

    /// Non-owning view for display surfaces
    pub fn view(&self) -> TrackView {
        TrackView {
            id: self.shared.id.clone(),
            kind: self.shared.kind,
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl Drop for MediaStreamTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Weak, read-only reference to a track
#[derive(Debug, Clone)]
pub struct TrackView {
    id: String,
    kind: MediaKind,
    shared: Weak<TrackShared>,
}

impl TrackView {
    /// Get track ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get track kind
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Current `enabled` flag, or `None` once the owner released the track
    pub fn enabled(&self) -> Option<bool> {
        let shared = self.shared.upgrade()?;
        let flags = *shared.flags.read();
        if flags.ended {
            None
        } else {
            Some(flags.enabled)
        }
    }

    /// Whether the underlying track is still owned and running
    pub fn is_live(&self) -> bool {
        self.enabled().is_some()
    }
}

/// A set of tracks acquired together
#[derive(Debug)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaStreamTrack>,
}

impl MediaStream {
    /// Create a stream from owned tracks
    pub fn new(id: impl Into<String>, tracks: Vec<MediaStreamTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    /// Combine the tracks of several streams into one
    pub fn merge(id: impl Into<String>, streams: impl IntoIterator<Item = MediaStream>) -> Self {
        let tracks = streams
            .into_iter()
            .flat_map(MediaStream::into_tracks)
            .collect();
        Self::new(id, tracks)
    }

    /// Get stream ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All tracks
    pub fn tracks(&self) -> &[MediaStreamTrack] {
        &self.tracks
    }

    /// Tracks of one kind
    pub fn tracks_of(&self, kind: MediaKind) -> impl Iterator<Item = &MediaStreamTrack> {
        self.tracks.iter().filter(move |track| track.kind() == kind)
    }

    /// Whether the stream carries at least one track of `kind`
    pub fn has_kind(&self, kind: MediaKind) -> bool {
        self.tracks_of(kind).next().is_some()
    }

    /// Whether the stream has no tracks at all
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// `Some(true)` when every live track of `kind` is enabled, `None` when
    /// the stream has no live track of that kind
    pub fn enabled(&self, kind: MediaKind) -> Option<bool> {
        let mut live = self.tracks_of(kind).filter(|track| !track.is_ended()).peekable();
        live.peek()?;
        Some(live.all(MediaStreamTrack::enabled))
    }

    /// Set `enabled` on every track of `kind`, returning how many were updated
    pub fn set_enabled(&self, kind: MediaKind, enabled: bool) -> usize {
        self.tracks_of(kind)
            .filter(|track| track.set_enabled(enabled))
            .count()
    }

    /// Stop every track, returning how many were actually stopped
    pub fn stop_all(&self) -> usize {
        self.tracks.iter().filter(|track| track.stop()).count()
    }

    /// Give up the stream wrapper and keep the tracks
    pub fn into_tracks(self) -> Vec<MediaStreamTrack> {
        self.tracks
    }

    /// Non-owning view for display surfaces
    pub fn view(&self) -> StreamView {
        StreamView {
            id: self.id.clone(),
            tracks: self.tracks.iter().map(MediaStreamTrack::view).collect(),
        }
    }
}

/// Weak, read-only reference to a stream
#[derive(Debug, Clone)]
pub struct StreamView {
    id: String,
    tracks: Vec<TrackView>,
}

impl StreamView {
    /// Get stream ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Track views
    pub fn tracks(&self) -> &[TrackView] {
        &self.tracks
    }

    /// Whether the view references any audio track
    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|track| track.kind() == MediaKind::Audio)
    }

    /// Whether any referenced track is still live
    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(TrackView::is_live)
    }

    /// Same semantics as [`MediaStream::enabled`], read through the view
    pub fn enabled(&self, kind: MediaKind) -> Option<bool> {
        let states: Vec<bool> = self
            .tracks
            .iter()
            .filter(|track| track.kind() == kind)
            .filter_map(TrackView::enabled)
            .collect();
        if states.is_empty() {
            None
        } else {
            Some(states.into_iter().all(|enabled| enabled))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingTrack {
        toggles: AtomicUsize,
        stops: AtomicUsize,
    }

    #[derive(Debug)]
    struct SharedCountingTrack(Arc<CountingTrack>);

    impl PlatformTrack for SharedCountingTrack {
        fn set_enabled(&self, _enabled: bool) {
            self.0.toggles.fetch_add(1, Ordering::SeqCst);
        }

        fn stop(&self) {
            self.0.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn make_track(kind: MediaKind) -> (MediaStreamTrack, Arc<CountingTrack>) {
        let counters = Arc::new(CountingTrack::default());
        let track = MediaStreamTrack::new(
            format!("{}-1", kind),
            kind,
            "test device",
            Box::new(SharedCountingTrack(counters.clone())),
        );
        (track, counters)
    }

    #[test]
    fn test_track_enable_and_stop() {
        let (track, counters) = make_track(MediaKind::Video);
        assert!(track.enabled());

        assert!(track.set_enabled(false));
        assert!(!track.enabled());
        assert!(track.set_enabled(false));
        assert_eq!(counters.toggles.load(Ordering::SeqCst), 1);

        assert!(track.stop());
        assert!(!track.stop());
        assert!(!track.set_enabled(true));
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_stops_once() {
        let (track, counters) = make_track(MediaKind::Audio);
        track.stop();
        drop(track);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);

        let (untouched, counters) = make_track(MediaKind::Video);
        drop(untouched);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_view_is_weak() {
        let (video, _) = make_track(MediaKind::Video);
        let (audio, _) = make_track(MediaKind::Audio);
        let stream = MediaStream::new("stream-1", vec![video, audio]);
        let view = stream.view();

        assert!(view.has_audio());
        assert_eq!(view.enabled(MediaKind::Video), Some(true));

        stream.set_enabled(MediaKind::Video, false);
        assert_eq!(view.enabled(MediaKind::Video), Some(false));
        assert_eq!(view.enabled(MediaKind::Audio), Some(true));

        drop(stream);
        assert!(!view.is_live());
        assert_eq!(view.enabled(MediaKind::Video), None);
    }

    #[test]
    fn test_merge_keeps_tracks() {
        let (video, _) = make_track(MediaKind::Video);
        let (audio, _) = make_track(MediaKind::Audio);
        let merged = MediaStream::merge(
            "merged",
            vec![
                MediaStream::new("video-only", vec![video]),
                MediaStream::new("audio-only", vec![audio]),
            ],
        );

        assert_eq!(merged.tracks().len(), 2);
        assert!(merged.has_kind(MediaKind::Video));
        assert!(merged.has_kind(MediaKind::Audio));
        assert!(merged.tracks().iter().all(|track| !track.is_ended()));
        assert_eq!(merged.stop_all(), 2);
        assert_eq!(merged.enabled(MediaKind::Audio), None);
    }
}
