//! Shared rig for session tests: a session on simulated hardware at a fixed
//! local hour, plus handles onto every simulated device.

#![allow(dead_code)]

use std::sync::Arc;
use watchroom::{EventStream, FixedClock, Platform, RoomBuilder, RoomSession};
use watchroom_media::{ElementHandle, SimulatedAudioBackend, SimulatedDevices, SimulatedElement};

pub struct Rig {
    pub devices: Arc<SimulatedDevices>,
    pub element: ElementHandle,
    pub audio: Arc<SimulatedAudioBackend>,
}

pub fn platform(hour: u32, devices: SimulatedDevices) -> (Platform, Rig) {
    platform_with_audio(hour, devices, SimulatedAudioBackend::new())
}

pub fn platform_with_audio(
    hour: u32,
    devices: SimulatedDevices,
    audio: SimulatedAudioBackend,
) -> (Platform, Rig) {
    let devices = Arc::new(devices);
    let audio = Arc::new(audio);
    let (element, handle) = SimulatedElement::new();
    let platform = Platform::new(
        devices.clone(),
        Box::new(element),
        audio.clone(),
        Arc::new(FixedClock::at_hour(hour)),
    );
    let rig = Rig {
        devices,
        element: handle,
        audio,
    };
    (platform, rig)
}

/// Unmounted session with an event subscription taken before mount
pub fn session(hour: u32, devices: SimulatedDevices) -> (RoomSession, EventStream, Rig) {
    let (platform, rig) = platform(hour, devices);
    let mut session = RoomBuilder::new().build(platform).unwrap();
    let events = session.events();
    (session, events, rig)
}

/// Event type names, in order
pub fn types(events: &mut EventStream) -> Vec<&'static str> {
    events.drain().iter().map(|event| event.event_type()).collect()
}
