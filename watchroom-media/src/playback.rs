//! Main playback control
//!
//! The [`PlaybackController`] owns the shared video element: it assigns the
//! source, registers the load/error listeners, negotiates playback and keeps
//! volume and mute apart. Signals from the element reach it through the
//! `on_*` methods; the controller never waits on the element itself.

use crate::error::MediaError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default main content
pub const DEFAULT_SOURCE_URL: &str =
    "https://storage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

/// Highest volume level
pub const MAX_VOLUME: u8 = 100;

/// Signals raised by the media element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementSignal {
    /// Enough data is buffered to start playback
    CanPlay,
    /// The source failed to load or decode
    Error(String),
}

/// Kinds of element listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementEventKind {
    /// Fires [`ElementSignal::CanPlay`]
    CanPlay,
    /// Fires [`ElementSignal::Error`]
    Error,
}

impl ElementSignal {
    /// Listener kind this signal is delivered to
    pub fn event_kind(&self) -> ElementEventKind {
        match self {
            ElementSignal::CanPlay => ElementEventKind::CanPlay,
            ElementSignal::Error(_) => ElementEventKind::Error,
        }
    }
}

/// Handle of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Callback invoked by the element
pub type ElementCallback = Arc<dyn Fn(ElementSignal) + Send + Sync>;

/// Host-side video element
pub trait MediaElement: Send + fmt::Debug {
    /// Assign or clear (`None`) the source
    fn set_source(&mut self, url: Option<&str>);

    /// Enable or disable looping
    fn set_loop(&mut self, looping: bool);

    /// Output volume in `[0.0, 1.0]`
    fn set_volume(&mut self, volume: f64);

    /// Suppress or restore output without touching the volume
    fn set_muted(&mut self, muted: bool);

    /// Start playback; the future settles once the element accepted or
    /// refused it
    fn play(&mut self) -> BoxFuture<'static, Result<(), String>>;

    /// Pause playback
    fn pause(&mut self);

    /// Reload the current source; with no source this drops buffered media
    fn load(&mut self);

    /// Register a listener
    fn add_listener(&mut self, kind: ElementEventKind, callback: ElementCallback) -> ListenerId;

    /// Remove a listener registered with [`MediaElement::add_listener`]
    fn remove_listener(&mut self, id: ListenerId);
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Main content URL
    pub source_url: String,
    /// Restart at the end
    pub looping: bool,
    /// Volume applied on initialisation (0-100)
    pub initial_volume: u8,
    /// Increment used by [`PlaybackController::volume_up`] and
    /// [`PlaybackController::volume_down`]
    pub volume_step: u8,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            looping: true,
            initial_volume: 50,
            volume_step: 10,
        }
    }
}

/// Main playback state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    /// Waiting for the element to buffer or for playback to start
    Loading,
    /// Content is playing
    Playing,
    /// Terminal until the controller is initialised again
    Errored(MediaError),
}

impl PlaybackState {
    /// Short name
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
            PlaybackState::Errored(_) => "errored",
        }
    }

    /// Whether the state is terminal
    pub fn is_errored(&self) -> bool {
        matches!(self, PlaybackState::Errored(_))
    }

    /// Message for the viewer when errored
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            PlaybackState::Errored(error) => error.user_message(),
            _ => None,
        }
    }
}

/// Controller of the shared video element
#[derive(Debug)]
pub struct PlaybackController {
    element: Box<dyn MediaElement>,
    config: PlaybackConfig,
    state: PlaybackState,
    volume: u8,
    muted: bool,
    listeners: Vec<ListenerId>,
    attached: bool,
    play_pending: bool,
}

impl PlaybackController {
    /// Take ownership of the element; nothing is assigned until
    /// [`PlaybackController::initialize`]
    pub fn new(element: Box<dyn MediaElement>, config: PlaybackConfig) -> Self {
        let volume = config.initial_volume.min(MAX_VOLUME);
        Self {
            element,
            config,
            state: PlaybackState::Loading,
            volume,
            muted: false,
            listeners: Vec::new(),
            attached: false,
            play_pending: false,
        }
    }

    /// Assign the source, enable looping, apply the stored volume, unmute and
    /// register `callback` for load and error signals.
    ///
    /// Initialising an attached controller tears the previous binding down
    /// first, so this is also the explicit reload path out of `Errored`.
    pub fn initialize(&mut self, callback: ElementCallback) -> &[ListenerId] {
        if self.attached {
            self.teardown();
        }

        self.state = PlaybackState::Loading;
        self.muted = false;
        self.play_pending = false;

        self.element.set_source(Some(&self.config.source_url));
        self.element.set_loop(self.config.looping);
        self.element.set_volume(Self::element_volume(self.volume));
        self.element.set_muted(false);

        let can_play = self
            .element
            .add_listener(ElementEventKind::CanPlay, callback.clone());
        let error = self.element.add_listener(ElementEventKind::Error, callback);
        self.listeners = vec![can_play, error];
        self.attached = true;

        info!("🎬 Main playback loading {}", self.config.source_url);
        &self.listeners
    }

    /// The element can play: start playback while still loading.
    ///
    /// Returns the playback negotiation for the caller to drive; its result
    /// goes back through [`PlaybackController::on_play_settled`].
    pub fn on_can_play(&mut self) -> Option<BoxFuture<'static, Result<(), String>>> {
        if !self.attached || self.play_pending || self.state != PlaybackState::Loading {
            debug!("Ignoring canplay in state {}", self.state.as_str());
            return None;
        }

        self.play_pending = true;
        Some(self.element.play())
    }

    /// Outcome of a playback negotiation. Returns `true` if the state changed.
    pub fn on_play_settled(&mut self, result: Result<(), String>) -> bool {
        self.play_pending = false;
        if !self.attached || self.state != PlaybackState::Loading {
            debug!("Ignoring play result in state {}", self.state.as_str());
            return false;
        }

        match result {
            Ok(()) => {
                info!("▶️ Main playback started");
                self.state = PlaybackState::Playing;
            }
            Err(reason) => {
                warn!("Main playback rejected: {}", reason);
                self.state = PlaybackState::Errored(MediaError::PlaybackRejected { reason });
            }
        }
        true
    }

    /// The source failed to load. Returns `true` if the state changed.
    pub fn on_load_error(&mut self, reason: String) -> bool {
        if !self.attached || self.state.is_errored() {
            debug!("Ignoring load error in state {}", self.state.as_str());
            return false;
        }

        warn!("Main content failed to load: {}", reason);
        self.state = PlaybackState::Errored(MediaError::LoadError {
            source_url: self.config.source_url.clone(),
            reason,
        });
        true
    }

    /// Route an element signal to the matching handler.
    ///
    /// Returns a playback negotiation to drive, if one was started.
    pub fn handle_signal(
        &mut self,
        signal: ElementSignal,
    ) -> Option<BoxFuture<'static, Result<(), String>>> {
        match signal {
            ElementSignal::CanPlay => self.on_can_play(),
            ElementSignal::Error(reason) => {
                self.on_load_error(reason);
                None
            }
        }
    }

    /// Current state
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Message for the viewer when errored
    pub fn error_message(&self) -> Option<&'static str> {
        self.state.error_message()
    }

    /// Stored volume (0-100), kept while muted
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Mute flag
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Audible level in `[0.0, 1.0]`
    pub fn effective_volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            Self::element_volume(self.volume)
        }
    }

    /// Whether the element is bound
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Listeners currently registered
    pub fn listeners(&self) -> &[ListenerId] {
        &self.listeners
    }

    /// Configured source
    pub fn source_url(&self) -> &str {
        &self.config.source_url
    }

    /// Store and apply a volume; values above 100 are clamped. Mute is left
    /// alone.
    pub fn set_volume(&mut self, volume: u8) -> u8 {
        self.volume = volume.min(MAX_VOLUME);
        if self.attached {
            self.element.set_volume(Self::element_volume(self.volume));
        }
        self.volume
    }

    /// Raise the volume by the configured step
    pub fn volume_up(&mut self) -> u8 {
        self.set_volume(self.volume.saturating_add(self.config.volume_step))
    }

    /// Lower the volume by the configured step
    pub fn volume_down(&mut self) -> u8 {
        self.set_volume(self.volume.saturating_sub(self.config.volume_step))
    }

    /// Flip mute; the stored volume is untouched
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        if self.attached {
            self.element.set_muted(self.muted);
        }
        self.muted
    }

    /// Remove listeners, pause, detach the source and make the element drop
    /// buffered media. Returns `false` when already torn down.
    pub fn teardown(&mut self) -> bool {
        if !self.attached {
            return false;
        }

        for id in self.listeners.drain(..) {
            self.element.remove_listener(id);
        }
        self.element.pause();
        self.element.set_source(None);
        self.element.load();
        self.attached = false;
        self.play_pending = false;

        info!("Main playback detached");
        true
    }

    fn element_volume(volume: u8) -> f64 {
        f64::from(volume.min(MAX_VOLUME)) / f64::from(MAX_VOLUME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_config_default() {
        let config = PlaybackConfig::default();
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
        assert!(config.looping);
        assert_eq!(config.initial_volume, 50);
        assert_eq!(config.volume_step, 10);
    }

    #[test]
    fn test_playback_config_from_json() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{ "source_url": "https://example.com/a.mp4" }"#).unwrap();
        assert_eq!(config.source_url, "https://example.com/a.mp4");
        assert_eq!(config.initial_volume, 50);
    }

    #[test]
    fn test_state_messages() {
        assert_eq!(PlaybackState::Loading.error_message(), None);
        let rejected = PlaybackState::Errored(MediaError::PlaybackRejected {
            reason: "autoplay".to_string(),
        });
        assert_eq!(
            rejected.error_message(),
            Some(crate::error::PLAYBACK_ERROR_MESSAGE)
        );
        assert_eq!(rejected.as_str(), "errored");
    }
}
