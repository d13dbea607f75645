//! Room session state machine
//!
//! A [`RoomSession`] gates entry by local time, builds the roster, owns the
//! local capture, the main playback controller and the audio graph, and tears
//! all of it down again on exit.
//!
//! Hardware acquisition and `play()` negotiation run as spawned tasks. Their
//! results, and the signals raised by the video element, come back through an
//! inbox stamped with the mount epoch. Every mount and every teardown bumps the
//! epoch, so anything that completes after the view went away is recognised as
//! stale and dropped, which stops any tracks it carried.
//!
//! The session must be mounted from within a tokio runtime. A current-thread
//! runtime matches the cooperative model of a UI event loop.

use crate::config::RoomConfig;
use crate::event::{Event, EventStream, ExitReason};
use crate::participant::{Participant, Participants, LOCAL_PARTICIPANT_ID};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;
use watchroom_core::{
    Clock, GateDecision, OperatingHours, ResourceKind, ResourceTracker, ResourceUsage, RoomError,
    SessionGate,
};
use watchroom_media::{
    AudioBackend, AudioGraph, CaptureOutcome, ElementCallback, ElementSignal, LocalCaptureManager,
    LocalPreview, MediaDeviceGateway, MediaDevices, MediaElement, MediaKind, MediaStream,
    PlaybackController, PlaybackState,
};

/// Idle polling rounds after which [`RoomSession::settle`] returns
const SETTLE_IDLE_ROUNDS: usize = 3;

/// Host capabilities a session runs against
#[derive(Debug)]
pub struct Platform {
    /// Camera and microphone access
    pub devices: Arc<dyn MediaDevices>,
    /// The shared video element
    pub element: Box<dyn MediaElement>,
    /// Audio context factory
    pub audio: Arc<dyn AudioBackend>,
    /// Local wall clock
    pub clock: Arc<dyn Clock>,
}

impl Platform {
    /// Bundle host capabilities
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        element: Box<dyn MediaElement>,
        audio: Arc<dyn AudioBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            devices,
            element,
            audio,
            clock,
        }
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not mounted yet
    Gating,
    /// Gate passed, roster and media being set up
    Entering,
    /// Room is live
    Active,
    /// Left, either by the gate or by exit/unmount
    Exited,
}

impl SessionState {
    /// Short name
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Gating => "gating",
            SessionState::Entering => "entering",
            SessionState::Active => "active",
            SessionState::Exited => "exited",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a teardown released, in release order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownSummary {
    /// Kinds of the released resources, in the order they were released
    pub released: Vec<ResourceKind>,
    /// Hardware tracks stopped
    pub tracks_stopped: usize,
    /// Roster entries cleared
    pub participants_cleared: usize,
    /// Inbox signals dropped without being handled
    pub signals_discarded: usize,
    /// Resources that had no release step and were forgotten
    pub leaked: usize,
}

#[derive(Debug)]
enum Signal {
    Captured(CaptureOutcome),
    Element(ElementSignal),
    PlaySettled(Result<(), String>),
}

#[derive(Debug)]
struct Envelope {
    epoch: u64,
    signal: Signal,
}

/// Media session controller of a room view
pub struct RoomSession {
    id: Uuid,
    config: RoomConfig,
    clock: Arc<dyn Clock>,
    audio_backend: Arc<dyn AudioBackend>,
    gate: SessionGate,
    state: SessionState,
    epoch: u64,
    roster: Participants,
    capture: LocalCaptureManager,
    playback: PlaybackController,
    audio_graph: Option<AudioGraph>,
    resources: ResourceTracker,
    inbox_tx: mpsc::UnboundedSender<Envelope>,
    inbox_rx: mpsc::UnboundedReceiver<Envelope>,
    tasks: Vec<JoinHandle<()>>,
    subscribers: Vec<mpsc::UnboundedSender<Event>>,
    torn_down: bool,
    last_teardown: Option<TeardownSummary>,
}

impl fmt::Debug for RoomSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("epoch", &self.epoch)
            .field("participants", &self.roster.len())
            .field("capture_active", &self.capture.is_active())
            .field("playback", &self.playback.state().as_str())
            .finish()
    }
}

impl RoomSession {
    /// Create an unmounted session
    pub fn new(config: RoomConfig, platform: Platform) -> Result<Self, RoomError> {
        config.validate()?;

        let gateway = MediaDeviceGateway::new(platform.devices);
        let capture = LocalCaptureManager::new(gateway, config.capture);
        let playback = PlaybackController::new(platform.element, config.playback.clone());
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            id: Uuid::new_v4(),
            gate: SessionGate::new(config.operating_hours),
            config,
            clock: platform.clock,
            audio_backend: platform.audio,
            state: SessionState::Gating,
            epoch: 0,
            roster: Participants::new(),
            capture,
            playback,
            audio_graph: None,
            resources: ResourceTracker::new(),
            inbox_tx,
            inbox_rx,
            tasks: Vec::new(),
            subscribers: Vec::new(),
            torn_down: true,
            last_teardown: None,
        })
    }

    /// Create and mount with the default configuration
    pub fn join(platform: Platform, display_name: Option<&str>) -> Result<Self, RoomError> {
        let mut session = Self::new(RoomConfig::default(), platform)?;
        session.mount(display_name)?;
        Ok(session)
    }

    /// Get session ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Mount epoch; stale signals carry an older one
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Configuration in use
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Operating window of the gate
    pub fn operating_hours(&self) -> OperatingHours {
        self.gate.hours()
    }

    /// Subscribe to session events
    pub fn events(&mut self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        EventStream::new(rx)
    }

    /// Mount the view: evaluate the gate once and, when open, enter the room.
    ///
    /// Outside operating hours the session goes straight to
    /// [`SessionState::Exited`] and asks to navigate back to the join screen;
    /// no roster is built and no media is touched. Remounting is allowed from
    /// `Exited`.
    pub fn mount(&mut self, display_name: Option<&str>) -> Result<SessionState, RoomError> {
        match self.state {
            SessionState::Gating => {}
            SessionState::Exited => self.set_state(SessionState::Gating),
            other => {
                return Err(RoomError::InvalidState {
                    expected: "gating or exited".to_string(),
                    actual: other.to_string(),
                })
            }
        }

        self.epoch += 1;
        match self.gate.evaluate(self.clock.as_ref()) {
            GateDecision::Closed { hour } => {
                let hours = self.gate.hours();
                info!(
                    "🚪 Room closed at hour {} (open {}:00 to {}:00), back to join",
                    hour, hours.open_hour, hours.close_hour
                );
                self.set_state(SessionState::Exited);
                self.emit(Event::NavigateToJoin {
                    reason: ExitReason::OutsideOperatingHours { hour },
                });
            }
            GateDecision::Open { hour } => {
                if tokio::runtime::Handle::try_current().is_err() {
                    return Err(RoomError::InvalidState {
                        expected: "mount inside a tokio runtime".to_string(),
                        actual: "no runtime".to_string(),
                    });
                }
                debug!("Gate open at hour {}", hour);
                self.set_state(SessionState::Entering);
                self.enter(display_name);
                self.set_state(SessionState::Active);
            }
        }
        Ok(self.state)
    }

    fn enter(&mut self, display_name: Option<&str>) {
        self.torn_down = false;

        let name = self.config.display_name(display_name);
        self.roster = Participants::with_local(name.clone(), self.clock.local_now());
        info!("👋 {} entered room session {}", name, self.id);
        self.emit(Event::ParticipantJoined {
            participant_id: LOCAL_PARTICIPANT_ID.to_string(),
            name,
        });

        match AudioGraph::create(self.audio_backend.as_ref()) {
            Ok(graph) => {
                self.resources
                    .acquire(ResourceKind::AudioContext, format!("session-{}", self.id));
                self.audio_graph = Some(graph);
            }
            Err(error) => {
                warn!("Audio graph unavailable: {}", error);
                self.emit(Event::RoomError {
                    error: error.to_string(),
                    recoverable: error.is_recoverable(),
                });
            }
        }

        // Neither waits on the other.
        self.start_capture();
        self.start_playback();
    }

    fn start_capture(&mut self) {
        let request = self.capture.request();
        let inbox = self.inbox_tx.clone();
        let epoch = self.epoch;
        self.spawn(async move {
            let outcome = request.await;
            // If the session is gone the envelope is dropped with the error,
            // which stops any tracks it carries.
            let _ = inbox.send(Envelope {
                epoch,
                signal: Signal::Captured(outcome),
            });
        });
    }

    fn start_playback(&mut self) {
        let inbox = self.inbox_tx.clone();
        let epoch = self.epoch;
        let callback: ElementCallback = Arc::new(move |signal| {
            let _ = inbox.send(Envelope {
                epoch,
                signal: Signal::Element(signal),
            });
        });

        let listeners = self.playback.initialize(callback).len();
        self.resources.acquire(
            ResourceKind::PlaybackSource,
            self.playback.source_url().to_string(),
        );
        for index in 0..listeners {
            self.resources
                .acquire(ResourceKind::ElementListener, format!("listener-{}", index));
        }
        self.emit(Event::PlaybackStateChanged {
            state: PlaybackState::Loading,
        });
    }

    fn spawn_play(&mut self, negotiation: BoxFuture<'static, Result<(), String>>) {
        let inbox = self.inbox_tx.clone();
        let epoch = self.epoch;
        self.spawn(async move {
            let result = negotiation.await;
            let _ = inbox.send(Envelope {
                epoch,
                signal: Signal::PlaySettled(result),
            });
        });
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|handle| !handle.is_finished());
        self.tasks.push(tokio::spawn(task));
    }

    /// Handle every signal already in the inbox without waiting.
    ///
    /// Returns how many signals were taken, stale ones included.
    pub fn process_pending(&mut self) -> usize {
        let mut taken = 0;
        while let Ok(envelope) = self.inbox_rx.try_recv() {
            taken += 1;
            self.dispatch(envelope);
        }
        taken
    }

    /// Wait for the next signal and handle it
    pub async fn process_next(&mut self) -> bool {
        match self.inbox_rx.recv().await {
            Some(envelope) => {
                self.dispatch(envelope);
                true
            }
            None => false,
        }
    }

    /// Let spawned work run and handle what it produces until the inbox stays
    /// quiet. Requests the host keeps pending are left pending.
    pub async fn settle(&mut self) -> usize {
        let mut handled = 0;
        let mut idle_rounds = 0;
        while idle_rounds < SETTLE_IDLE_ROUNDS {
            tokio::task::yield_now().await;
            match self.process_pending() {
                0 => idle_rounds += 1,
                taken => {
                    handled += taken;
                    idle_rounds = 0;
                }
            }
        }
        handled
    }

    fn dispatch(&mut self, envelope: Envelope) {
        if envelope.epoch != self.epoch || self.state != SessionState::Active {
            debug!(
                "Discarding stale signal from epoch {} (current {}, {})",
                envelope.epoch, self.epoch, self.state
            );
            return;
        }

        match envelope.signal {
            Signal::Captured(outcome) => self.on_captured(outcome),
            Signal::Element(signal) => {
                let before = self.playback.state().clone();
                if let Some(negotiation) = self.playback.handle_signal(signal) {
                    self.spawn_play(negotiation);
                }
                self.emit_playback_change(&before);
            }
            Signal::PlaySettled(result) => {
                if self.playback.on_play_settled(result) {
                    let state = self.playback.state().clone();
                    self.emit(Event::PlaybackStateChanged { state });
                }
            }
        }
    }

    fn emit_playback_change(&mut self, before: &PlaybackState) {
        if self.playback.state() != before {
            let state = self.playback.state().clone();
            self.emit(Event::PlaybackStateChanged { state });
        }
    }

    fn on_captured(&mut self, outcome: CaptureOutcome) {
        for error in outcome.errors {
            warn!("Local capture: {}", error);
            self.emit(Event::CaptureFailed { error });
        }
        if let Some(stream) = outcome.stream {
            self.adopt_stream(stream);
        }
    }

    fn adopt_stream(&mut self, stream: MediaStream) {
        let stream_id = stream.id().to_string();
        let camera = stream.has_kind(MediaKind::Video);
        let microphone = stream.has_kind(MediaKind::Audio);
        let tracks: Vec<(MediaKind, String)> = stream
            .tracks()
            .iter()
            .map(|track| (track.kind(), track.id().to_string()))
            .collect();

        if let Err(error) = self.capture.adopt(stream) {
            warn!("Dropping extra capture stream {}: {}", stream_id, error);
            return;
        }
        for (kind, track_id) in tracks {
            let resource = match kind {
                MediaKind::Video => ResourceKind::CameraTrack,
                MediaKind::Audio => ResourceKind::MicrophoneTrack,
            };
            self.resources.acquire(resource, track_id);
        }
        self.emit(Event::CaptureStarted {
            stream_id,
            camera,
            microphone,
        });

        if microphone {
            self.wire_microphone();
        }
    }

    fn wire_microphone(&mut self) {
        let (Some(graph), Some(stream)) = (self.audio_graph.as_mut(), self.capture.stream()) else {
            return;
        };
        match graph.attach(stream) {
            Ok(()) => {
                let view = stream.view();
                if let Err(error) = self.roster.attach_audio_stream(LOCAL_PARTICIPANT_ID, view) {
                    warn!("Could not attach local audio to roster: {}", error);
                }
            }
            Err(error) => warn!("Microphone not wired into the audio graph: {}", error),
        }
    }

    /// Flip the camera tracks. `None` when there is no camera to toggle.
    pub fn toggle_camera(&mut self) -> Option<bool> {
        self.toggle(MediaKind::Video)
    }

    /// Flip the microphone tracks. `None` when there is no microphone to
    /// toggle.
    pub fn toggle_microphone(&mut self) -> Option<bool> {
        self.toggle(MediaKind::Audio)
    }

    fn toggle(&mut self, kind: MediaKind) -> Option<bool> {
        if self.state != SessionState::Active {
            return None;
        }
        let enabled = self.capture.toggle(kind)?;
        self.emit(Event::TrackToggled { kind, enabled });
        Some(enabled)
    }

    /// Camera indicator
    pub fn camera_enabled(&self) -> bool {
        self.capture.camera_enabled()
    }

    /// Microphone indicator
    pub fn microphone_enabled(&self) -> bool {
        self.capture.microphone_enabled()
    }

    /// Self-view handle
    pub fn preview(&self) -> Option<LocalPreview> {
        self.capture.preview()
    }

    /// Set the main volume (clamped to 0-100). `None` outside an active room.
    pub fn set_volume(&mut self, volume: u8) -> Option<u8> {
        self.adjust_volume(|playback| playback.set_volume(volume))
    }

    /// Raise the main volume by one step
    pub fn volume_up(&mut self) -> Option<u8> {
        self.adjust_volume(PlaybackController::volume_up)
    }

    /// Lower the main volume by one step
    pub fn volume_down(&mut self) -> Option<u8> {
        self.adjust_volume(PlaybackController::volume_down)
    }

    fn adjust_volume(
        &mut self,
        adjust: impl FnOnce(&mut PlaybackController) -> u8,
    ) -> Option<u8> {
        if self.state != SessionState::Active {
            return None;
        }
        let before = self.playback.volume();
        let volume = adjust(&mut self.playback);
        if volume != before {
            self.emit(Event::VolumeChanged { volume });
        }
        Some(volume)
    }

    /// Flip main mute; the stored volume is untouched. `None` outside an
    /// active room.
    pub fn toggle_mute(&mut self) -> Option<bool> {
        if self.state != SessionState::Active {
            return None;
        }
        let muted = self.playback.toggle_mute();
        self.emit(Event::MuteChanged { muted });
        Some(muted)
    }

    /// Stored main volume
    pub fn volume(&self) -> u8 {
        self.playback.volume()
    }

    /// Main mute flag
    pub fn is_muted(&self) -> bool {
        self.playback.is_muted()
    }

    /// Audible main level in `[0.0, 1.0]`
    pub fn effective_volume(&self) -> f64 {
        self.playback.effective_volume()
    }

    /// Main playback state
    pub fn playback_state(&self) -> &PlaybackState {
        self.playback.state()
    }

    /// Message to show over the main video, if errored
    pub fn playback_error_message(&self) -> Option<&'static str> {
        self.playback.error_message()
    }

    /// Roster in join order
    pub fn roster(&self) -> &Participants {
        &self.roster
    }

    /// Add a decorative participant with no media; returns its id
    pub fn join_placeholder(&mut self, name: &str) -> Result<String, RoomError> {
        self.require_active()?;
        let participant = Participant::placeholder(name, self.clock.local_now());
        let id = self.roster.insert(participant)?.id().to_string();
        self.emit(Event::ParticipantJoined {
            participant_id: id.clone(),
            name: name.to_string(),
        });
        Ok(id)
    }

    /// Remove a decorative participant
    pub fn leave(&mut self, participant_id: &str) -> Result<(), RoomError> {
        self.require_active()?;
        self.roster.remove(participant_id)?;
        self.emit(Event::ParticipantLeft {
            participant_id: participant_id.to_string(),
        });
        Ok(())
    }

    fn require_active(&self) -> Result<(), RoomError> {
        if self.state == SessionState::Active {
            Ok(())
        } else {
            Err(RoomError::InvalidState {
                expected: SessionState::Active.to_string(),
                actual: self.state.to_string(),
            })
        }
    }

    /// Resources currently held
    pub fn resource_usage(&self) -> ResourceUsage {
        self.resources.usage()
    }

    /// Summary of the most recent teardown
    pub fn last_teardown(&self) -> Option<&TeardownSummary> {
        self.last_teardown.as_ref()
    }

    /// User exit: tear down, then ask to navigate back to the join screen.
    ///
    /// Returns `false` when there was nothing to leave.
    pub fn exit(&mut self) -> bool {
        if !self.leave_room() {
            return false;
        }
        self.emit(Event::NavigateToJoin {
            reason: ExitReason::UserExit,
        });
        true
    }

    /// The view is being replaced: tear down without navigating.
    ///
    /// Returns `false` when there was nothing to leave.
    pub fn unmount(&mut self) -> bool {
        self.leave_room()
    }

    fn leave_room(&mut self) -> bool {
        if !matches!(self.state, SessionState::Entering | SessionState::Active) {
            return false;
        }
        self.teardown();
        self.set_state(SessionState::Exited);
        true
    }

    /// Release everything in order: hardware tracks, audio graph, main video
    /// source, roster. A second call is a no-op returning `None`.
    fn teardown(&mut self) -> Option<TeardownSummary> {
        if self.torn_down {
            return None;
        }
        self.torn_down = true;
        self.epoch += 1;

        for task in self.tasks.drain(..) {
            task.abort();
        }
        let mut summary = TeardownSummary::default();
        // Late streams still in the inbox are dropped here, stopping them.
        while self.inbox_rx.try_recv().is_ok() {
            summary.signals_discarded += 1;
        }

        summary.tracks_stopped = self.capture.release();
        self.release_kind(ResourceKind::CameraTrack, &mut summary);
        self.release_kind(ResourceKind::MicrophoneTrack, &mut summary);

        if let Some(mut graph) = self.audio_graph.take() {
            graph.close();
        }
        self.release_kind(ResourceKind::AudioContext, &mut summary);

        self.playback.teardown();
        self.release_kind(ResourceKind::ElementListener, &mut summary);
        self.release_kind(ResourceKind::PlaybackSource, &mut summary);

        let departed: Vec<String> = self.roster.iter().map(|p| p.id().to_string()).collect();
        summary.participants_cleared = self.roster.clear();
        for participant_id in departed {
            self.emit(Event::ParticipantLeft { participant_id });
        }

        summary.leaked = self.resources.drain_leaks().len();
        info!(
            "🧹 Session {} torn down: {} track(s) stopped, {} resource(s) released, {} stale signal(s) dropped",
            self.id,
            summary.tracks_stopped,
            summary.released.len(),
            summary.signals_discarded
        );
        self.last_teardown = Some(summary.clone());
        Some(summary)
    }

    fn release_kind(&mut self, kind: ResourceKind, summary: &mut TeardownSummary) {
        for record in self.resources.release_kind(kind) {
            summary.released.push(record.kind);
        }
    }

    fn set_state(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        debug!("Session {}: {} -> {}", self.id, from, to);
        self.state = to;
        self.emit(Event::StateChanged { from, to });
    }

    fn emit(&mut self, event: Event) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    /// Serializable snapshot for debugging
    #[cfg(feature = "diagnostics")]
    pub fn report(&self) -> watchroom_diagnostics::SessionReport {
        use watchroom_diagnostics::{
            CaptureSummary, ParticipantSummary, PlaybackSummary, SessionReport,
        };

        SessionReport {
            session_id: self.id.to_string(),
            state: self.state.to_string(),
            epoch: self.epoch,
            roster: self
                .roster
                .iter()
                .map(|participant| ParticipantSummary {
                    id: participant.id().to_string(),
                    name: participant.name().to_string(),
                    joined_at: participant.joined_at().format("%Y-%m-%dT%H:%M:%S").to_string(),
                    local: participant.is_local(),
                    has_audio: participant.audio_stream().is_some(),
                })
                .collect(),
            capture: CaptureSummary {
                active: self.capture.is_active(),
                camera_on: self.capture.camera_enabled(),
                microphone_on: self.capture.microphone_enabled(),
            },
            playback: PlaybackSummary {
                state: self.playback.state().as_str().to_string(),
                error_message: self.playback.error_message().map(str::to_string),
                volume: self.playback.volume(),
                muted: self.playback.is_muted(),
            },
            resources: self.resources.usage(),
        }
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        if self.teardown().is_some() {
            debug!("Session {} unmounted on drop", self.id);
        }
    }
}

/// Fluent builder for room configuration and mounting
#[derive(Debug, Clone, Default)]
pub struct RoomBuilder {
    config: RoomConfig,
    display_name: Option<String>,
}

impl RoomBuilder {
    /// Builder with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn with_config(config: RoomConfig) -> Self {
        Self {
            config,
            display_name: None,
        }
    }

    /// Name supplied by the join screen
    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    /// Name used when none is supplied
    pub fn fallback_display_name(mut self, name: &str) -> Self {
        self.config.fallback_display_name = name.to_string();
        self
    }

    /// Operating window
    pub fn operating_hours(mut self, hours: OperatingHours) -> Self {
        self.config.operating_hours = hours;
        self
    }

    /// Main content URL
    pub fn source_url(mut self, url: &str) -> Self {
        self.config.playback.source_url = url.to_string();
        self
    }

    /// Volume applied when playback is initialised
    pub fn initial_volume(mut self, volume: u8) -> Self {
        self.config.playback.initial_volume = volume;
        self
    }

    /// Increment for volume up/down
    pub fn volume_step(mut self, step: u8) -> Self {
        self.config.playback.volume_step = step;
        self
    }

    /// Request camera and microphone separately when the combined request
    /// fails
    pub fn per_kind_fallback(mut self, enabled: bool) -> Self {
        self.config.capture.per_kind_fallback = enabled;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Create the session without mounting it
    pub fn build(self, platform: Platform) -> Result<RoomSession, RoomError> {
        RoomSession::new(self.config, platform)
    }

    /// Create and mount the session
    pub fn mount(self, platform: Platform) -> Result<RoomSession, RoomError> {
        let display_name = self.display_name.clone();
        let mut session = self.build(platform)?;
        session.mount(display_name.as_deref())?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchroom_core::FixedClock;
    use watchroom_media::{SimulatedAudioBackend, SimulatedDevices, SimulatedElement};

    fn simulated(devices: Arc<SimulatedDevices>) -> Platform {
        let (element, _handle) = SimulatedElement::new();
        Platform::new(
            devices,
            Box::new(element),
            Arc::new(SimulatedAudioBackend::new()),
            Arc::new(FixedClock::at_hour(10)),
        )
    }

    #[tokio::test]
    async fn test_stale_epoch_stream_is_stopped() {
        let devices = Arc::new(SimulatedDevices::new());
        let mut session = RoomSession::join(simulated(devices.clone()), Some("Ana")).unwrap();
        session.settle().await;
        assert_eq!(devices.stats().live_tracks(), 2);

        // A stream from an earlier mount turns up late
        let late = Arc::new(SimulatedDevices::new());
        let stream = MediaDeviceGateway::new(late.clone())
            .request_video_and_audio()
            .await
            .unwrap();
        let outcome = CaptureOutcome {
            stream: Some(stream),
            errors: Vec::new(),
        };
        session
            .inbox_tx
            .send(Envelope {
                epoch: session.epoch() - 1,
                signal: Signal::Captured(outcome),
            })
            .unwrap();

        assert_eq!(session.process_pending(), 1);
        assert_eq!(late.stats().live_tracks(), 0);
        assert_eq!(devices.stats().live_tracks(), 2);
        assert_eq!(session.resource_usage().held_of(ResourceKind::CameraTrack), 1);
    }

    #[tokio::test]
    async fn test_signal_after_exit_is_ignored() {
        let devices = Arc::new(SimulatedDevices::new());
        let mut session = RoomSession::join(simulated(devices), Some("Ana")).unwrap();
        let epoch = session.epoch();
        session.exit();

        session
            .inbox_tx
            .send(Envelope {
                epoch,
                signal: Signal::Element(ElementSignal::CanPlay),
            })
            .unwrap();
        assert_eq!(session.process_pending(), 1);
        assert_eq!(session.playback_state(), &PlaybackState::Loading);
    }

    #[test]
    fn test_mount_needs_runtime() {
        let devices = Arc::new(SimulatedDevices::new());
        let mut session = RoomSession::new(RoomConfig::default(), simulated(devices)).unwrap();
        let err = session.mount(Some("Ana")).unwrap_err();
        assert!(matches!(err, RoomError::InvalidState { .. }));
        assert_eq!(session.state(), SessionState::Gating);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SessionState::Gating.to_string(), "gating");
        assert_eq!(SessionState::Exited.as_str(), "exited");
    }

    #[test]
    fn test_builder_collects_config() {
        let builder = RoomBuilder::new()
            .display_name("Ada")
            .initial_volume(70)
            .volume_step(5)
            .per_kind_fallback(false)
            .source_url("https://example.com/movie.mp4");

        let config = builder.config();
        assert_eq!(config.playback.initial_volume, 70);
        assert_eq!(config.playback.volume_step, 5);
        assert!(!config.capture.per_kind_fallback);
        assert_eq!(config.playback.source_url, "https://example.com/movie.mp4");
        assert!(config.validate().is_ok());
    }
}
