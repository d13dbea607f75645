//! Simulated host platform
//!
//! In-memory implementations of [`MediaDevices`], [`MediaElement`] and
//! [`AudioBackend`] used on hosts without real capture hardware, in demos and
//! in tests. Each one counts what it was asked to do so callers can check that
//! hardware was acquired and released exactly as often as expected.

use crate::audio_graph::{AudioBackend, AudioContext, NodeId};
use crate::devices::{MediaConstraints, MediaDevices};
use crate::error::{MediaError, MediaResult};
use crate::playback::{ElementCallback, ElementEventKind, ElementSignal, ListenerId, MediaElement};
use crate::tracks::{MediaKind, MediaStream, MediaStreamTrack, PlatformTrack, StreamView};
use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// How a simulated device answers a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePolicy {
    /// Hand out a track
    Granted,
    /// Refuse with [`MediaError::PermissionDenied`]
    Denied,
    /// Fail with [`MediaError::DeviceUnavailable`]
    Unavailable,
}

/// Counters kept by [`SimulatedDevices`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Calls to `get_user_media`
    pub requests: u32,
    /// Requests that produced a stream
    pub acquisitions: u32,
    /// Tracks handed out
    pub tracks_created: u32,
    /// Tracks stopped
    pub tracks_stopped: u32,
    /// `enabled` flips applied to tracks
    pub toggles: u32,
}

impl DeviceStats {
    /// Tracks handed out and not yet stopped
    pub fn live_tracks(&self) -> u32 {
        self.tracks_created - self.tracks_stopped
    }
}

#[derive(Debug)]
struct SimulatedTrack {
    stats: Arc<Mutex<DeviceStats>>,
}

impl PlatformTrack for SimulatedTrack {
    fn set_enabled(&self, _enabled: bool) {
        self.stats.lock().toggles += 1;
    }

    fn stop(&self) {
        self.stats.lock().tracks_stopped += 1;
    }
}

/// Holds simulated acquisitions pending until released
#[derive(Debug, Clone)]
pub struct AcquisitionGate {
    permits: Arc<Semaphore>,
}

impl AcquisitionGate {
    /// Let `count` pending or future requests complete
    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    /// Fail every pending and future request
    pub fn close(&self) {
        self.permits.close();
    }
}

/// Simulated camera and microphone
#[derive(Debug)]
pub struct SimulatedDevices {
    camera: DevicePolicy,
    microphone: DevicePolicy,
    stats: Arc<Mutex<DeviceStats>>,
    gate: Option<AcquisitionGate>,
}

impl SimulatedDevices {
    /// Both devices granted, requests answered immediately
    pub fn new() -> Self {
        Self {
            camera: DevicePolicy::Granted,
            microphone: DevicePolicy::Granted,
            stats: Arc::new(Mutex::new(DeviceStats::default())),
            gate: None,
        }
    }

    /// Requests stay pending until the returned gate releases them
    pub fn held() -> (Self, AcquisitionGate) {
        let gate = AcquisitionGate {
            permits: Arc::new(Semaphore::new(0)),
        };
        let devices = Self {
            gate: Some(gate.clone()),
            ..Self::new()
        };
        (devices, gate)
    }

    /// Set the camera policy
    pub fn with_camera(mut self, policy: DevicePolicy) -> Self {
        self.camera = policy;
        self
    }

    /// Set the microphone policy
    pub fn with_microphone(mut self, policy: DevicePolicy) -> Self {
        self.microphone = policy;
        self
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> DeviceStats {
        self.stats.lock().clone()
    }

    fn check(&self, kind: MediaKind) -> MediaResult<()> {
        let (policy, device) = match kind {
            MediaKind::Video => (self.camera, "camera"),
            MediaKind::Audio => (self.microphone, "microphone"),
        };
        match policy {
            DevicePolicy::Granted => Ok(()),
            DevicePolicy::Denied => Err(MediaError::PermissionDenied {
                device: device.to_string(),
            }),
            DevicePolicy::Unavailable => Err(MediaError::DeviceUnavailable {
                device: device.to_string(),
                reason: "no such device".to_string(),
            }),
        }
    }

    fn track(&self, kind: MediaKind, serial: u32) -> MediaStreamTrack {
        let label = match kind {
            MediaKind::Video => "Simulated Camera",
            MediaKind::Audio => "Simulated Microphone",
        };
        MediaStreamTrack::new(
            format!("{}-{}", kind, serial),
            kind,
            label,
            Box::new(SimulatedTrack {
                stats: self.stats.clone(),
            }),
        )
    }
}

impl Default for SimulatedDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for SimulatedDevices {
    async fn get_user_media(&self, constraints: MediaConstraints) -> MediaResult<MediaStream> {
        self.stats.lock().requests += 1;

        if let Some(gate) = &self.gate {
            let permit = gate
                .permits
                .acquire()
                .await
                .map_err(|_| MediaError::DeviceUnavailable {
                    device: constraints.to_string(),
                    reason: "request abandoned".to_string(),
                })?;
            permit.forget();
        }

        // Like a browser, one refused device fails the whole request.
        for kind in [MediaKind::Video, MediaKind::Audio] {
            if constraints.wants(kind) {
                self.check(kind)?;
            }
        }

        let serial = {
            let mut stats = self.stats.lock();
            stats.acquisitions += 1;
            stats.acquisitions
        };
        let mut tracks = Vec::new();
        for kind in [MediaKind::Video, MediaKind::Audio] {
            if constraints.wants(kind) {
                tracks.push(self.track(kind, serial));
            }
        }
        self.stats.lock().tracks_created += tracks.len() as u32;

        debug!("Simulated devices granted {}", constraints);
        Ok(MediaStream::new(format!("stream-{}", serial), tracks))
    }
}

/// How the simulated element answers `play()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayPolicy {
    /// Playback starts
    Resolve,
    /// Playback is refused with the given reason
    Reject(String),
}

struct ElementState {
    source: Option<String>,
    looping: bool,
    volume: f64,
    muted: bool,
    paused: bool,
    play_calls: u32,
    load_calls: u32,
    source_assignments: u32,
    play_policy: PlayPolicy,
    listeners: BTreeMap<u64, (ElementEventKind, ElementCallback)>,
    next_listener: u64,
}

/// Simulated video element
pub struct SimulatedElement {
    state: Arc<Mutex<ElementState>>,
}

/// Test-side handle onto a [`SimulatedElement`] owned by a controller
#[derive(Clone)]
pub struct ElementHandle {
    state: Arc<Mutex<ElementState>>,
}

impl SimulatedElement {
    /// Create an element whose `play()` resolves
    pub fn new() -> (Self, ElementHandle) {
        let state = Arc::new(Mutex::new(ElementState {
            source: None,
            looping: false,
            volume: 1.0,
            muted: false,
            paused: true,
            play_calls: 0,
            load_calls: 0,
            source_assignments: 0,
            play_policy: PlayPolicy::Resolve,
            listeners: BTreeMap::new(),
            next_listener: 0,
        }));
        (
            Self {
                state: state.clone(),
            },
            ElementHandle { state },
        )
    }
}

impl fmt::Debug for SimulatedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimulatedElement")
            .field("source", &state.source)
            .field("paused", &state.paused)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl MediaElement for SimulatedElement {
    fn set_source(&mut self, url: Option<&str>) {
        let mut state = self.state.lock();
        state.source = url.map(str::to_string);
        if url.is_some() {
            state.source_assignments += 1;
        }
    }

    fn set_loop(&mut self, looping: bool) {
        self.state.lock().looping = looping;
    }

    fn set_volume(&mut self, volume: f64) {
        self.state.lock().volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.lock().muted = muted;
    }

    fn play(&mut self) -> BoxFuture<'static, Result<(), String>> {
        let mut state = self.state.lock();
        state.play_calls += 1;
        let result = match &state.play_policy {
            PlayPolicy::Resolve => {
                state.paused = false;
                Ok(())
            }
            PlayPolicy::Reject(reason) => Err(reason.clone()),
        };
        future::ready(result).boxed()
    }

    fn pause(&mut self) {
        self.state.lock().paused = true;
    }

    fn load(&mut self) {
        self.state.lock().load_calls += 1;
    }

    fn add_listener(&mut self, kind: ElementEventKind, callback: ElementCallback) -> ListenerId {
        let mut state = self.state.lock();
        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.insert(id, (kind, callback));
        ListenerId(id)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.state.lock().listeners.remove(&id.0);
    }
}

impl ElementHandle {
    /// Fire a signal at the registered listeners, returning how many ran
    pub fn fire(&self, signal: ElementSignal) -> usize {
        let kind = signal.event_kind();
        let callbacks: Vec<ElementCallback> = self
            .state
            .lock()
            .listeners
            .values()
            .filter(|(listener_kind, _)| *listener_kind == kind)
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in &callbacks {
            callback(signal.clone());
        }
        callbacks.len()
    }

    /// Fire `canplay`
    pub fn can_play(&self) -> usize {
        self.fire(ElementSignal::CanPlay)
    }

    /// Fire `error`
    pub fn fail(&self, reason: &str) -> usize {
        self.fire(ElementSignal::Error(reason.to_string()))
    }

    /// Change how later `play()` calls answer
    pub fn set_play_policy(&self, policy: PlayPolicy) {
        self.state.lock().play_policy = policy;
    }

    /// Assigned source
    pub fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    /// Loop flag
    pub fn looping(&self) -> bool {
        self.state.lock().looping
    }

    /// Element volume in `[0.0, 1.0]`
    pub fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    /// Element mute flag
    pub fn muted(&self) -> bool {
        self.state.lock().muted
    }

    /// Whether playback is paused
    pub fn paused(&self) -> bool {
        self.state.lock().paused
    }

    /// Number of `play()` calls
    pub fn play_calls(&self) -> u32 {
        self.state.lock().play_calls
    }

    /// Number of `load()` calls
    pub fn load_calls(&self) -> u32 {
        self.state.lock().load_calls
    }

    /// Number of non-empty source assignments
    pub fn source_assignments(&self) -> u32 {
        self.state.lock().source_assignments
    }

    /// Registered listeners
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }
}

/// Counters kept by [`SimulatedAudioBackend`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioStats {
    /// Contexts created
    pub contexts_created: u32,
    /// Contexts closed
    pub contexts_closed: u32,
    /// Stream sources created
    pub sources: u32,
    /// Gain values of created gain nodes
    pub gains: Vec<f32>,
    /// Connections made
    pub connections: Vec<(NodeId, NodeId)>,
}

/// Simulated audio context factory
#[derive(Debug, Default)]
pub struct SimulatedAudioBackend {
    stats: Arc<Mutex<AudioStats>>,
    unavailable: bool,
}

impl SimulatedAudioBackend {
    /// Working backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose context creation always fails
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> AudioStats {
        self.stats.lock().clone()
    }
}

impl AudioBackend for SimulatedAudioBackend {
    fn create_context(&self) -> MediaResult<Box<dyn AudioContext>> {
        if self.unavailable {
            return Err(MediaError::Audio {
                message: "audio output unavailable".to_string(),
            });
        }
        self.stats.lock().contexts_created += 1;
        Ok(Box::new(SimulatedAudioContext {
            stats: self.stats.clone(),
            next_node: 1,
            closed: false,
        }))
    }
}

#[derive(Debug)]
struct SimulatedAudioContext {
    stats: Arc<Mutex<AudioStats>>,
    next_node: u32,
    closed: bool,
}

impl SimulatedAudioContext {
    fn node(&mut self) -> MediaResult<NodeId> {
        if self.closed {
            return Err(MediaError::AudioGraphClosed);
        }
        let id = NodeId(self.next_node);
        self.next_node += 1;
        Ok(id)
    }
}

impl AudioContext for SimulatedAudioContext {
    fn create_stream_source(&mut self, stream: &StreamView) -> MediaResult<NodeId> {
        if !stream.has_audio() {
            return Err(MediaError::Audio {
                message: format!("stream {} has no audio track", stream.id()),
            });
        }
        let id = self.node()?;
        self.stats.lock().sources += 1;
        Ok(id)
    }

    fn create_gain(&mut self, gain: f32) -> MediaResult<NodeId> {
        let id = self.node()?;
        self.stats.lock().gains.push(gain);
        Ok(id)
    }

    fn destination(&self) -> NodeId {
        NodeId(0)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> MediaResult<()> {
        if self.closed {
            return Err(MediaError::AudioGraphClosed);
        }
        self.stats.lock().connections.push((from, to));
        Ok(())
    }

    fn close(&mut self) -> MediaResult<()> {
        if self.closed {
            return Err(MediaError::AudioGraphClosed);
        }
        self.closed = true;
        self.stats.lock().contexts_closed += 1;
        Ok(())
    }
}
