//! Resource bookkeeping for room sessions
//!
//! Every hardware track, audio context, playback source and element listener a
//! session acquires is recorded here. Releases are checked against the record
//! so a resource can never be released twice, and whatever is still held at
//! teardown can be listed in reverse acquisition order.

use crate::error::RoomError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Kinds of resource a session can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ResourceKind {
    /// Local camera track
    CameraTrack,
    /// Local microphone track
    MicrophoneTrack,
    /// Audio processing context backing the audio graph
    AudioContext,
    /// Source assigned to the main playback element
    PlaybackSource,
    /// Load/error listener registered on the main playback element
    ElementListener,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::CameraTrack => "camera-track",
            ResourceKind::MicrophoneTrack => "microphone-track",
            ResourceKind::AudioContext => "audio-context",
            ResourceKind::PlaybackSource => "playback-source",
            ResourceKind::ElementListener => "element-listener",
        };
        f.write_str(name)
    }
}

/// Opaque handle returned by [`ResourceTracker::acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceId(u64);

/// A single held resource
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    /// Handle
    pub id: ResourceId,
    /// Kind of resource
    pub kind: ResourceKind,
    /// Human readable label (track id, source URL, ...)
    pub label: String,
    /// When the resource was acquired
    pub acquired_at: Instant,
}

impl ResourceRecord {
    /// How long the resource has been held
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

/// Snapshot of resource usage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    /// Currently held resources per kind
    pub held: BTreeMap<ResourceKind, u32>,
    /// Total acquisitions since the tracker was created
    pub total_acquired: u64,
    /// Total releases since the tracker was created
    pub total_released: u64,
}

impl ResourceUsage {
    /// Number of resources currently held
    pub fn held_total(&self) -> u32 {
        self.held.values().sum()
    }

    /// Number of held resources of one kind
    pub fn held_of(&self, kind: ResourceKind) -> u32 {
        self.held.get(&kind).copied().unwrap_or(0)
    }
}

/// Bookkeeping of everything a session currently owns
#[derive(Debug, Default)]
pub struct ResourceTracker {
    held: Vec<ResourceRecord>,
    next_id: u64,
    total_acquired: u64,
    total_released: u64,
}

impl ResourceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly acquired resource
    pub fn acquire(&mut self, kind: ResourceKind, label: impl Into<String>) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.total_acquired += 1;

        let record = ResourceRecord {
            id,
            kind,
            label: label.into(),
            acquired_at: Instant::now(),
        };
        debug!("Acquired {} ({})", record.kind, record.label);
        self.held.push(record);
        id
    }

    /// Record the release of a held resource
    pub fn release(&mut self, id: ResourceId) -> Result<ResourceRecord, RoomError> {
        let position = self
            .held
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| RoomError::ResourceNotHeld {
                resource: format!("{:?}", id),
            })?;

        let record = self.held.remove(position);
        self.total_released += 1;
        debug!(
            "Released {} ({}) after {:?}",
            record.kind,
            record.label,
            record.held_for()
        );
        Ok(record)
    }

    /// Release every held resource of `kind`, newest first
    pub fn release_kind(&mut self, kind: ResourceKind) -> Vec<ResourceRecord> {
        let ids: Vec<ResourceId> = self
            .held
            .iter()
            .rev()
            .filter(|record| record.kind == kind)
            .map(|record| record.id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.release(id).ok())
            .collect()
    }

    /// Whether the handle is still held
    pub fn is_held(&self, id: ResourceId) -> bool {
        self.held.iter().any(|record| record.id == id)
    }

    /// Held resources, newest first
    pub fn outstanding(&self) -> Vec<ResourceRecord> {
        self.held.iter().rev().cloned().collect()
    }

    /// Forget everything still held, reporting each leak, newest first
    pub fn drain_leaks(&mut self) -> Vec<ResourceRecord> {
        let leaked: Vec<ResourceRecord> = self.held.drain(..).rev().collect();
        for record in &leaked {
            warn!("Resource {} ({}) was never released", record.kind, record.label);
        }
        self.total_released += leaked.len() as u64;
        leaked
    }

    /// Current usage snapshot
    pub fn usage(&self) -> ResourceUsage {
        let mut held = BTreeMap::new();
        for record in &self.held {
            *held.entry(record.kind).or_insert(0) += 1;
        }
        ResourceUsage {
            held,
            total_acquired: self.total_acquired,
            total_released: self.total_released,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let mut tracker = ResourceTracker::new();
        let camera = tracker.acquire(ResourceKind::CameraTrack, "cam-1");
        let context = tracker.acquire(ResourceKind::AudioContext, "ctx");

        assert!(tracker.is_held(camera));
        assert_eq!(tracker.usage().held_total(), 2);

        let record = tracker.release(camera).unwrap();
        assert_eq!(record.kind, ResourceKind::CameraTrack);
        assert!(!tracker.is_held(camera));
        assert!(tracker.is_held(context));

        let usage = tracker.usage();
        assert_eq!(usage.total_acquired, 2);
        assert_eq!(usage.total_released, 1);
        assert_eq!(usage.held_of(ResourceKind::AudioContext), 1);
    }

    #[test]
    fn test_double_release_is_rejected() {
        let mut tracker = ResourceTracker::new();
        let id = tracker.acquire(ResourceKind::PlaybackSource, "movie.mp4");

        assert!(tracker.release(id).is_ok());
        let error = tracker.release(id).unwrap_err();
        assert_eq!(error.error_code(), "RESOURCE_NOT_HELD");
        assert_eq!(tracker.usage().total_released, 1);
    }

    #[test]
    fn test_outstanding_is_newest_first() {
        let mut tracker = ResourceTracker::new();
        tracker.acquire(ResourceKind::AudioContext, "ctx");
        tracker.acquire(ResourceKind::CameraTrack, "cam");
        tracker.acquire(ResourceKind::MicrophoneTrack, "mic");

        let kinds: Vec<ResourceKind> = tracker.outstanding().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::MicrophoneTrack,
                ResourceKind::CameraTrack,
                ResourceKind::AudioContext,
            ]
        );
    }

    #[test]
    fn test_release_kind_and_drain() {
        let mut tracker = ResourceTracker::new();
        tracker.acquire(ResourceKind::CameraTrack, "cam-a");
        tracker.acquire(ResourceKind::CameraTrack, "cam-b");
        tracker.acquire(ResourceKind::ElementListener, "canplay");

        let released = tracker.release_kind(ResourceKind::CameraTrack);
        assert_eq!(released.len(), 2);
        assert_eq!(released[0].label, "cam-b");
        assert!(tracker.release_kind(ResourceKind::CameraTrack).is_empty());

        let leaked = tracker.drain_leaks();
        assert_eq!(leaked.len(), 1);
        assert_eq!(tracker.usage().held_total(), 0);
    }
}
