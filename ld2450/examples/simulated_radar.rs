//! Drive a simulated radar end to end
//!
//! Run with `RUST_LOG=debug` to see the frames on the wire.

use std::time::Duration;

use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use ld2450::{
    Area, AreaMode, AreaSlot, Device, DeviceIdentity, MemoryProvider, SimulatedRadar, StateEvent,
    Target, TargetMode, TargetState,
};

#[tokio::main]
async fn main() -> ld2450::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let provider = MemoryProvider::new().with_simulator(SimulatedRadar::new());
    let identity = DeviceIdentity::new("AA:BB:CC:DD:EE:FF").with_name("HLK-LD2450_A1B2");
    let device = Device::new(identity, provider.clone());

    let _state = device.register_callback(|event| {
        if let StateEvent::Targets(targets) = event {
            println!("{}", targets);
        }
    });
    let _disconnected = device.register_disconnected_callback(|| println!("Link lost"));

    device.initialise().await?;
    println!("Connected: {}", device.config());

    device.set_target_mode(TargetMode::Single).await?;
    device
        .set_area(
            AreaMode::MonitorInside,
            [Area::new(-1000, 0, 1000, 2000), Area::default(), Area::default()],
        )
        .await?;

    // read backs run in the background
    sleep(Duration::from_millis(50)).await;
    println!("Target mode: {:?}", device.target_mode());
    println!("Area 1: {:?} ({:?})", device.area(AreaSlot::One), device.area_mode());

    // someone walks towards the sensor
    for step in 0..5i16 {
        let targets = TargetState::new([
            Target { x: -200 + step * 50, y: 3000 - step * 400, speed: -40, resolution: 320 },
            Target::default(),
            Target::default(),
        ]);
        provider.emit(&ld2450_core::telemetry::encode(&targets));
        sleep(Duration::from_millis(100)).await;
    }

    // out of range for a moment; the device reconnects on its own
    provider.drop_link();
    sleep(Duration::from_millis(500)).await;
    println!("Reconnected: {} ({} connections)", device.is_connected(), device.connections());

    device.stop().await?;
    Ok(())
}
