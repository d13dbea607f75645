//! Operating Hours Demo
//!
//! Mounts a room at every hour of the day and shows which mounts are turned
//! away by the gate, and what a denied microphone does to a session.

use std::sync::Arc;
use watchroom::{
    Event, FixedClock, OperatingHours, Platform, RoomBuilder, SessionGate, SessionState,
};
use watchroom_media::{DevicePolicy, SimulatedAudioBackend, SimulatedDevices, SimulatedElement};

fn platform(hour: u32, devices: Arc<SimulatedDevices>) -> Platform {
    let (element, _video) = SimulatedElement::new();
    Platform::new(
        devices,
        Box::new(element),
        Arc::new(SimulatedAudioBackend::new()),
        Arc::new(FixedClock::at_hour(hour)),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("🕰️ Operating Hours Demo");
    println!("=======================");

    let hours = OperatingHours::default();
    let gate = SessionGate::new(hours);
    println!("Open from {}:00 until {}:00\n", hours.open_hour, hours.close_hour);

    for hour in 0..24 {
        let devices = Arc::new(SimulatedDevices::new());
        let clock = FixedClock::at_hour(hour);
        let decision = gate.evaluate(&clock);

        let mut session = RoomBuilder::new().build(platform(hour, devices.clone()))?;
        let mut events = session.events();
        let state = session.mount(Some("Ana"))?;

        let redirected = events
            .drain()
            .iter()
            .any(|event| matches!(event, Event::NavigateToJoin { .. }));
        println!(
            "{:02}:00  gate {:<6}  state {:<7}  redirected {:<5}  hardware requests {}",
            hour,
            if decision.is_open() { "open" } else { "closed" },
            state.as_str(),
            redirected,
            devices.stats().requests
        );
    }

    println!("\n🎙️ Microphone denied at 10:00");
    let devices = Arc::new(SimulatedDevices::new().with_microphone(DevicePolicy::Denied));
    let mut session = RoomBuilder::new()
        .display_name("Ana")
        .mount(platform(10, devices.clone()))?;
    session.settle().await;

    assert_eq!(session.state(), SessionState::Active);
    println!(
        "   camera on: {}, microphone on: {}, microphone toggle: {:?}",
        session.camera_enabled(),
        session.microphone_enabled(),
        session.toggle_microphone()
    );
    session.exit();
    println!("   live tracks after exit: {}", devices.stats().live_tracks());

    Ok(())
}
