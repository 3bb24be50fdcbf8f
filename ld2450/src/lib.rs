//! # ld2450
//!
//! Client for HLK-LD2450 mmWave radar modules over a BLE-style link.
//!
//! ## Features
//!
//! - Decodes the telemetry stream into typed targets
//! - Config mode bracketing for every read and write
//! - Reconnects on its own after link loss
//! - Pluggable transport (an in-memory simulator ships with it)
//!
//! ## Quick Start
//!
//! ```no_run
//! use ld2450::{Device, DeviceIdentity, MemoryProvider, SimulatedRadar, TargetMode};
//!
//! #[tokio::main]
//! async fn main() -> ld2450::Result<()> {
//!     let provider = MemoryProvider::new().with_simulator(SimulatedRadar::new());
//!     let device = Device::new(DeviceIdentity::new("AA:BB:CC:DD:EE:FF"), provider);
//!
//!     // Connect and read the configuration
//!     device.initialise().await?;
//!     println!("{}", device.config());
//!
//!     device.set_target_mode(TargetMode::Single).await?;
//!
//!     device.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod callbacks;
pub mod device;
pub mod error;
pub mod options;
pub mod pump;
mod state;
mod supervisor;

// Re-exports
pub use callbacks::{CallbackHandle, CallbackKind, StateEvent};
pub use device::Device;
pub use error::{Error, Result};
pub use options::DeviceOptions;
pub use pump::FollowUp;

// Re-export types
pub use ld2450_core::{Command, LinkState};
pub use ld2450_transport::{ConnectionProvider, ErrorKind, Link, MemoryProvider, SimulatedRadar};
pub use ld2450_types::{
    Area, AreaField, AreaMode, AreaSlot, DeviceConfig, DeviceIdentity, Target, TargetField,
    TargetMode, TargetSlot, TargetState,
};
