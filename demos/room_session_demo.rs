//! Room Session Demo
//!
//! Walks one viewer through a watch room on simulated hardware:
//! - Entering at a fixed local hour with a display name
//! - Local capture with camera/microphone toggles
//! - Main playback, volume and mute
//! - Exit and the session report

use anyhow::Context;
use std::sync::Arc;
use watchroom::{
    Event, FixedClock, GlobalConfig, Platform, RoomBuilder, RoomConfig, SessionState,
};
use watchroom_media::{SimulatedAudioBackend, SimulatedDevices, SimulatedElement};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    watchroom::init(&GlobalConfig {
        debug_logging: true,
        ..Default::default()
    })?;

    println!("🎬 Watchroom Session Demo");
    println!("=========================");

    let config = RoomConfig::from_json(
        r#"{
            "playback": { "initial_volume": 60, "volume_step": 5 }
        }"#,
    )
    .context("room configuration")?;

    let devices = Arc::new(SimulatedDevices::new());
    let (element, video) = SimulatedElement::new();
    let platform = Platform::new(
        devices.clone(),
        Box::new(element),
        Arc::new(SimulatedAudioBackend::new()),
        Arc::new(FixedClock::at_hour(19)),
    );

    let mut session = RoomBuilder::with_config(config).build(platform)?;
    let mut events = session.events();

    let state = session.mount(Some("Ana"))?;
    println!("✅ Mounted: {}", state);
    if state != SessionState::Active {
        return Ok(());
    }

    session.join_placeholder("Grace")?;
    session.settle().await;
    println!(
        "📹 Camera {} / microphone {}",
        on_off(session.camera_enabled()),
        on_off(session.microphone_enabled())
    );

    // The element buffered enough to start
    video.can_play();
    session.settle().await;
    println!("▶️ Main video: {}", session.playback_state().as_str());

    // ============================================================================
    // Controls
    // ============================================================================
    println!("\n🎛️ Controls");
    session.toggle_camera();
    session.toggle_microphone();
    session.volume_up();
    session.toggle_mute();
    println!(
        "   camera {}, microphone {}, volume {} (muted: {})",
        on_off(session.camera_enabled()),
        on_off(session.microphone_enabled()),
        session.volume(),
        session.is_muted()
    );
    println!("   hardware requests so far: {}", devices.stats().requests);

    println!("\n📊 Session report");
    println!("{}", session.report().to_json_pretty()?);

    session.exit();
    println!("\n🧹 After exit: {} live track(s)", devices.stats().live_tracks());

    println!("\n📡 Events");
    for event in events.drain() {
        match event {
            Event::NavigateToJoin { reason } => println!("   navigate to join ({})", reason),
            other => println!("   {}", other.event_type()),
        }
    }

    Ok(())
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
