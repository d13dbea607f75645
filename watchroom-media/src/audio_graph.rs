//! Per-session audio graph
//!
//! One audio context per session, wired `source -> gain -> destination` around
//! the local microphone. The gain stays at unity; it is the hook for later
//! processing. The context is closed exactly once, whether or not a stream was
//! ever attached.

use crate::error::{MediaError, MediaResult};
use crate::tracks::{MediaKind, MediaStream, StreamView};
use std::fmt;
use tracing::{debug, info, warn};

/// Gain applied by the graph
pub const UNITY_GAIN: f32 = 1.0;

/// Node handle inside an [`AudioContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Host audio processing context
pub trait AudioContext: Send + fmt::Debug {
    /// Create a source node reading the audio tracks of `stream`
    fn create_stream_source(&mut self, stream: &StreamView) -> MediaResult<NodeId>;

    /// Create a gain node
    fn create_gain(&mut self, gain: f32) -> MediaResult<NodeId>;

    /// Output node
    fn destination(&self) -> NodeId;

    /// Connect `from` into `to`
    fn connect(&mut self, from: NodeId, to: NodeId) -> MediaResult<()>;

    /// Release the context and everything created in it
    fn close(&mut self) -> MediaResult<()>;
}

/// Host factory of audio contexts
pub trait AudioBackend: Send + Sync + fmt::Debug {
    /// Create a fresh context
    fn create_context(&self) -> MediaResult<Box<dyn AudioContext>>;
}

/// Lifecycle of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioGraphState {
    /// Context created, nothing wired yet
    Idle,
    /// Source wired through the gain stage
    Attached,
    /// Context released
    Closed,
}

#[derive(Debug, Clone, Copy)]
struct GainStage {
    source: NodeId,
    gain: NodeId,
}

/// Gain stage around the local microphone
#[derive(Debug)]
pub struct AudioGraph {
    context: Option<Box<dyn AudioContext>>,
    stage: Option<GainStage>,
    state: AudioGraphState,
}

impl AudioGraph {
    /// Create the session's audio context
    pub fn create(backend: &dyn AudioBackend) -> MediaResult<Self> {
        let context = backend.create_context()?;
        debug!("Audio context created");
        Ok(Self {
            context: Some(context),
            stage: None,
            state: AudioGraphState::Idle,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> AudioGraphState {
        self.state
    }

    /// Gain applied to the microphone
    pub fn gain(&self) -> f32 {
        UNITY_GAIN
    }

    /// Wire the audio of `stream` through the gain stage into the output.
    /// Only one attach per session.
    pub fn attach(&mut self, stream: &MediaStream) -> MediaResult<()> {
        match self.state {
            AudioGraphState::Attached => return Err(MediaError::AudioGraphAlreadyAttached),
            AudioGraphState::Closed => return Err(MediaError::AudioGraphClosed),
            AudioGraphState::Idle => {}
        }
        if !stream.has_kind(MediaKind::Audio) {
            return Err(MediaError::Audio {
                message: format!("stream {} has no audio track", stream.id()),
            });
        }

        let context = self.context.as_mut().ok_or(MediaError::AudioGraphClosed)?;
        let source = context.create_stream_source(&stream.view())?;
        let gain = context.create_gain(UNITY_GAIN)?;
        let destination = context.destination();
        context.connect(source, gain)?;
        context.connect(gain, destination)?;

        self.stage = Some(GainStage { source, gain });
        self.state = AudioGraphState::Attached;
        info!("🎵 Microphone of stream {} wired into the audio graph", stream.id());
        Ok(())
    }

    /// Release the context. Returns `false` when it was already closed.
    pub fn close(&mut self) -> bool {
        let Some(mut context) = self.context.take() else {
            return false;
        };

        if let Err(error) = context.close() {
            warn!("Audio context did not close cleanly: {}", error);
        }
        if let Some(stage) = self.stage.take() {
            debug!("Dropped gain stage {:?} -> {:?}", stage.source, stage.gain);
        }
        self.state = AudioGraphState::Closed;
        info!("Audio graph closed");
        true
    }
}

impl Drop for AudioGraph {
    fn drop(&mut self) {
        self.close();
    }
}
