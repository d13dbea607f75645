//! Tests for the per-session audio graph

use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use watchroom_media::*;

async fn microphone_stream(devices: &Arc<SimulatedDevices>) -> MediaStream {
    MediaDeviceGateway::new(devices.clone())
        .request_video_and_audio()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_attach_wires_source_gain_destination() {
    let backend = SimulatedAudioBackend::new();
    let devices = Arc::new(SimulatedDevices::new());
    let stream = microphone_stream(&devices).await;

    let mut graph = AudioGraph::create(&backend).unwrap();
    assert_eq!(graph.state(), AudioGraphState::Idle);
    graph.attach(&stream).unwrap();
    assert_eq!(graph.state(), AudioGraphState::Attached);
    assert_eq!(graph.gain(), UNITY_GAIN);

    let stats = backend.stats();
    assert_eq!(stats.contexts_created, 1);
    assert_eq!(stats.sources, 1);
    assert_eq!(stats.gains, vec![UNITY_GAIN]);
    assert_eq!(stats.connections.len(), 2);
    // source -> gain, then gain -> destination
    assert_eq!(stats.connections[0].1, stats.connections[1].0);
    assert_eq!(stats.connections[1].1, NodeId(0));
}

#[tokio::test]
async fn test_attach_only_once() {
    let backend = SimulatedAudioBackend::new();
    let devices = Arc::new(SimulatedDevices::new());
    let stream = microphone_stream(&devices).await;

    let mut graph = assert_ok!(AudioGraph::create(&backend));
    assert_ok!(graph.attach(&stream));
    let err = assert_err!(graph.attach(&stream));
    assert_eq!(err, MediaError::AudioGraphAlreadyAttached);
    assert_eq!(backend.stats().sources, 1);
}

#[tokio::test]
async fn test_attach_requires_audio_track() {
    let backend = SimulatedAudioBackend::new();
    let devices = Arc::new(SimulatedDevices::new());
    let camera_only = MediaDeviceGateway::new(devices.clone())
        .request_video()
        .await
        .unwrap();

    let mut graph = AudioGraph::create(&backend).unwrap();
    let result = graph.attach(&camera_only);
    assert!(matches!(result, Err(MediaError::Audio { .. })));
    assert_eq!(graph.state(), AudioGraphState::Idle);
}

#[test]
fn test_close_is_idempotent() {
    let backend = SimulatedAudioBackend::new();
    let mut graph = AudioGraph::create(&backend).unwrap();

    assert!(graph.close());
    assert!(!graph.close());
    assert_eq!(graph.state(), AudioGraphState::Closed);
    drop(graph);
    assert_eq!(backend.stats().contexts_closed, 1);
}

#[test]
fn test_attach_after_close_fails() {
    let backend = SimulatedAudioBackend::new();
    let devices = Arc::new(SimulatedDevices::new());
    let stream = tokio_test::block_on(microphone_stream(&devices));

    let mut graph = AudioGraph::create(&backend).unwrap();
    graph.close();
    assert_eq!(graph.attach(&stream), Err(MediaError::AudioGraphClosed));
}

#[test]
fn test_drop_closes_context() {
    let backend = SimulatedAudioBackend::new();
    {
        let _graph = AudioGraph::create(&backend).unwrap();
    }
    let stats = backend.stats();
    assert_eq!(stats.contexts_created, 1);
    assert_eq!(stats.contexts_closed, 1);
}

#[test]
fn test_unavailable_backend() {
    let backend = SimulatedAudioBackend::unavailable();
    let result = AudioGraph::create(&backend);
    assert!(matches!(result, Err(MediaError::Audio { .. })));
    assert_eq!(backend.stats().contexts_created, 0);
}
