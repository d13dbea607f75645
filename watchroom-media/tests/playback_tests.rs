//! Tests for main playback control against the simulated element

use parking_lot::Mutex;
use std::sync::Arc;
use watchroom_media::*;

fn controller() -> (PlaybackController, ElementHandle) {
    let (element, handle) = SimulatedElement::new();
    let controller = PlaybackController::new(Box::new(element), PlaybackConfig::default());
    (controller, handle)
}

/// Callback that records every signal it receives
fn recorder() -> (ElementCallback, Arc<Mutex<Vec<ElementSignal>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: ElementCallback = Arc::new(move |signal| sink.lock().push(signal));
    (callback, seen)
}

#[tokio::test]
async fn test_initialize_configures_element() {
    let (mut playback, handle) = controller();
    let (callback, _) = recorder();

    let listeners = playback.initialize(callback).len();
    assert_eq!(listeners, 2);
    assert_eq!(handle.listener_count(), 2);
    assert_eq!(handle.source().as_deref(), Some(DEFAULT_SOURCE_URL));
    assert!(handle.looping());
    assert!(!handle.muted());
    assert!((handle.volume() - 0.5).abs() < f64::EPSILON);
    assert_eq!(playback.state(), &PlaybackState::Loading);
}

#[tokio::test]
async fn test_can_play_then_play_resolves() {
    let (mut playback, handle) = controller();
    let (callback, seen) = recorder();
    playback.initialize(callback);

    assert_eq!(handle.can_play(), 1);
    let signal = seen.lock().pop().unwrap();
    assert_eq!(signal, ElementSignal::CanPlay);

    let negotiation = playback.handle_signal(signal).unwrap();
    // A second canplay while negotiating does not call play() again
    assert!(playback.on_can_play().is_none());

    let result = negotiation.await;
    assert!(playback.on_play_settled(result));
    assert_eq!(playback.state(), &PlaybackState::Playing);
    assert_eq!(handle.play_calls(), 1);
    assert!(!handle.paused());
}

#[tokio::test]
async fn test_rejected_play_is_terminal() {
    let (mut playback, handle) = controller();
    handle.set_play_policy(PlayPolicy::Reject("NotAllowedError".to_string()));
    let (callback, _) = recorder();
    playback.initialize(callback);

    let result = playback.on_can_play().unwrap().await;
    assert!(playback.on_play_settled(result));
    assert_eq!(playback.error_message(), Some(PLAYBACK_ERROR_MESSAGE));

    // Later canplay and error signals leave the state alone
    assert!(playback.on_can_play().is_none());
    assert!(!playback.on_load_error("network".to_string()));
    assert_eq!(playback.error_message(), Some(PLAYBACK_ERROR_MESSAGE));
    assert_eq!(handle.play_calls(), 1);
}

#[tokio::test]
async fn test_load_error_before_can_play() {
    let (mut playback, _handle) = controller();
    let (callback, _) = recorder();
    playback.initialize(callback);

    assert!(playback.on_load_error("MEDIA_ERR_NETWORK".to_string()));
    assert!(playback.state().is_errored());
    assert_eq!(playback.error_message(), Some(LOAD_ERROR_MESSAGE));
    assert!(playback.on_can_play().is_none());
}

#[tokio::test]
async fn test_load_error_while_playing() {
    let (mut playback, _handle) = controller();
    let (callback, _) = recorder();
    playback.initialize(callback);

    let result = playback.on_can_play().unwrap().await;
    playback.on_play_settled(result);
    assert!(playback.on_load_error("MEDIA_ERR_DECODE".to_string()));
    assert_eq!(playback.error_message(), Some(LOAD_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_play_settled_after_error_is_ignored() {
    let (mut playback, _handle) = controller();
    let (callback, _) = recorder();
    playback.initialize(callback);

    let negotiation = playback.on_can_play().unwrap();
    playback.on_load_error("MEDIA_ERR_NETWORK".to_string());
    assert!(!playback.on_play_settled(negotiation.await));
    assert_eq!(playback.error_message(), Some(LOAD_ERROR_MESSAGE));
}

#[test]
fn test_volume_and_mute_are_independent() {
    let (mut playback, handle) = controller();
    let (callback, _) = recorder();
    playback.initialize(callback);

    assert_eq!(playback.set_volume(80), 80);
    assert!(playback.toggle_mute());
    assert!(handle.muted());
    assert_eq!(playback.volume(), 80);
    assert_eq!(playback.effective_volume(), 0.0);

    assert_eq!(playback.set_volume(30), 30);
    assert!(playback.is_muted());
    assert!(!playback.toggle_mute());
    assert!((playback.effective_volume() - 0.3).abs() < f64::EPSILON);
    assert!((handle.volume() - 0.3).abs() < f64::EPSILON);
}

#[test]
fn test_volume_clamped_and_stepped() {
    let (mut playback, _handle) = controller();
    assert_eq!(playback.set_volume(250), MAX_VOLUME);
    assert_eq!(playback.volume_up(), MAX_VOLUME);
    assert_eq!(playback.volume_down(), 90);
    playback.set_volume(5);
    assert_eq!(playback.volume_down(), 0);
}

#[test]
fn test_teardown_releases_element() {
    let (mut playback, handle) = controller();
    let (callback, _) = recorder();
    playback.initialize(callback);

    assert!(playback.teardown());
    assert!(!playback.teardown());
    assert_eq!(handle.listener_count(), 0);
    assert_eq!(handle.source(), None);
    assert!(handle.paused());
    assert_eq!(handle.load_calls(), 1);
    assert_eq!(handle.can_play(), 0);
    assert!(playback.on_can_play().is_none());
}

#[tokio::test]
async fn test_reinitialize_recovers_from_error() {
    let (mut playback, handle) = controller();
    let (callback, _) = recorder();
    playback.initialize(callback.clone());
    playback.on_load_error("MEDIA_ERR_NETWORK".to_string());
    playback.toggle_mute();

    playback.initialize(callback);
    assert_eq!(playback.state(), &PlaybackState::Loading);
    assert!(!playback.is_muted());
    assert_eq!(handle.listener_count(), 2);
    assert_eq!(handle.source_assignments(), 2);

    let result = playback.on_can_play().unwrap().await;
    playback.on_play_settled(result);
    assert_eq!(playback.state(), &PlaybackState::Playing);
}
