//! Vanity Preview Demo
//!
//! Opens synthetic video hardware for a call, starts the self-preview and
//! prints how the orientation router rewrites each captured frame on its way
//! to the local sink.

use camsession::{
    init_logging, CamSessionConfig, FnVideoSink, HardwareContext, Orientation, SessionEvent,
    SyntheticCameraConfig, SyntheticCameraFactory, SyntheticRenderContextFactory, SyntheticStats,
    VideoFrame, VideoRotation, VideoSession,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CamSessionConfig::default();
    init_logging(&config.global)?;

    println!("📷 camsession Vanity Preview Demo");
    println!("=================================");

    let stats = Arc::new(SyntheticStats::default());
    let hardware = HardwareContext::new(
        Arc::new(SyntheticRenderContextFactory::new(stats.clone())),
        Arc::new(SyntheticCameraFactory::new(
            SyntheticCameraConfig {
                fps: 10,
                ..Default::default()
            },
            stats.clone(),
        )),
    );

    let session = VideoSession::new(&config, hardware)?;
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                SessionEvent::StateChanged { operation, summary } => {
                    println!("   📡 {} -> version {}", operation, summary.version)
                }
                other => println!("   📡 {}", other.event_type()),
            }
        }
    });

    // Demo 1: open hardware
    println!("\n🔧 Demo 1: Initialize video");
    let summary = session.start_video()?;
    println!("   camera: {:?}", summary.camera);
    println!("   render context: {:?}", summary.render_context);

    // Demo 2: attach a renderer and start the preview
    println!("\n🪞 Demo 2: Vanity preview");
    let printed = Arc::new(AtomicU64::new(0));
    let counter = printed.clone();
    let renderer = FnVideoSink::new(move |frame: VideoFrame| {
        if counter.fetch_add(1, Ordering::Relaxed) < 5 {
            println!(
                "   frame {}x{} shown at {}° ({}x{} on screen)",
                frame.width(),
                frame.height(),
                frame.rotation().degrees(),
                frame.rotated_width(),
                frame.rotated_height()
            );
        }
    });
    if let Some(local_sink) = session.local_sink() {
        local_sink.add_sink(Arc::new(renderer));
    }
    session.start_vanity()?;
    tokio::time::sleep(Duration::from_millis(600)).await;

    // Demo 3: rotate the device and restart the camera
    println!("\n🔄 Demo 3: Rotate and restart camera");
    session.set_orientation(Orientation::LandscapeLeft)?;
    let summary = session.restart_camera()?;
    println!("   new camera: {:?}", summary.camera);
    println!(
        "   landscape preview rotation: {}°",
        VideoRotation::Deg270.degrees()
    );

    // Demo 4: tear down
    println!("\n🛑 Demo 4: Deinitialize video");
    session.stop_video()?;
    let counts = stats.counts();
    println!(
        "   cameras {}/{} disposed, contexts {}/{} released, {} frames produced",
        counts.cameras_disposed,
        counts.cameras_created,
        counts.contexts_released,
        counts.contexts_created,
        counts.frames_produced
    );

    println!("\n✨ Vanity preview demo completed!");
    Ok(())
}
