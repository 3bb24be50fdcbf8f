//! Transport layer for LD2450 modules
//!
//! The wireless stack is a black box behind [`ConnectionProvider`] and
//! [`Link`]. An in-memory implementation with a simulated module is provided
//! for tests and demos.

pub mod error;
pub mod memory;

pub use error::{Error, ErrorKind, Result};
pub use memory::{MemoryProvider, SimulatedRadar};

use std::sync::Arc;

use async_trait::async_trait;
use ld2450_types::DeviceIdentity;

/// Called with every notification payload, in arrival order
pub type NotifyHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Called once when an established link goes down, expected or not
pub type DisconnectCallback = Arc<dyn Fn() + Send + Sync>;

/// Establishes links to a device
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Connect to the device
    ///
    /// `on_disconnect` fires when the returned link drops, including after
    /// [`Link::disconnect`].
    async fn establish(
        &self,
        identity: &DeviceIdentity,
        on_disconnect: DisconnectCallback,
    ) -> Result<Arc<dyn Link>>;
}

/// An established link (GATT client)
#[async_trait]
pub trait Link: Send + Sync {
    /// Write raw bytes to a characteristic
    async fn write(&self, characteristic: &str, data: &[u8]) -> Result<()>;

    /// Subscribe to notifications on a characteristic
    async fn start_notify(&self, characteristic: &str, handler: NotifyHandler) -> Result<()>;

    /// Unsubscribe from a characteristic
    async fn stop_notify(&self, characteristic: &str) -> Result<()>;

    /// Drop the link
    async fn disconnect(&self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;
}
