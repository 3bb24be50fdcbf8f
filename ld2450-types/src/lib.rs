//! Type definitions for ld2450

pub mod config;
pub mod error;
pub mod identity;
pub mod target;

pub use config::{Area, AreaField, AreaMode, AreaSlot, DeviceConfig, TargetMode};
pub use error::{Error, Result};
pub use identity::DeviceIdentity;
pub use target::{Target, TargetField, TargetSlot, TargetState};
