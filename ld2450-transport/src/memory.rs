//! In-memory transport
//!
//! [`MemoryProvider`] stands in for a wireless stack: it records every write,
//! lets callers inject notifications and link loss, and can script failures.
//! With a [`SimulatedRadar`] attached, each command write is answered with the
//! ACK a real module sends, delivered through the notify handler before the
//! write returns.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;
use tracing::{debug, trace};

use ld2450_core::{
    ack::{RESULT_FAILURE, RESULT_SUCCESS},
    constants::{CHARACTERISTIC_NOTIFY, CHARACTERISTIC_WRITE},
    Ack, Command,
};
use ld2450_types::{Area, AreaMode, DeviceIdentity, TargetMode};

use crate::{error::*, ConnectionProvider, DisconnectCallback, Link, NotifyHandler};

/// Command handling of an LD2450 module
///
/// Reads and writes are rejected (nonzero result) outside a config bracket.
#[derive(Debug, Clone)]
pub struct SimulatedRadar {
    config_mode: bool,
    target_mode: TargetMode,
    firmware: [u8; 6],
    mac: [u8; 6],
    area_mode: AreaMode,
    areas: [Area; 3],
    reboots: u32,
}

impl SimulatedRadar {
    pub fn new() -> Self {
        Self {
            config_mode: false,
            target_mode: TargetMode::Multi,
            firmware: [0x04, 0x02, 0x15, 0x19, 0x10, 0x23],
            mac: [0x8C, 0x4F, 0x00, 0x2A, 0x91, 0x3E],
            area_mode: AreaMode::Disabled,
            areas: [Area::default(); 3],
            reboots: 0,
        }
    }

    pub fn with_target_mode(mut self, mode: TargetMode) -> Self {
        self.target_mode = mode;
        self
    }

    pub fn with_firmware(mut self, firmware: [u8; 6]) -> Self {
        self.firmware = firmware;
        self
    }

    pub fn with_mac(mut self, mac: [u8; 6]) -> Self {
        self.mac = mac;
        self
    }

    pub fn with_areas(mut self, mode: AreaMode, areas: [Area; 3]) -> Self {
        self.area_mode = mode;
        self.areas = areas;
        self
    }

    pub fn in_config_mode(&self) -> bool {
        self.config_mode
    }

    pub fn target_mode(&self) -> TargetMode {
        self.target_mode
    }

    pub fn area_mode(&self) -> AreaMode {
        self.area_mode
    }

    pub fn areas(&self) -> [Area; 3] {
        self.areas
    }

    pub fn reboots(&self) -> u32 {
        self.reboots
    }

    /// Handle one written command frame, returning the ACK bytes
    pub fn respond(&mut self, data: &[u8]) -> Option<BytesMut> {
        let command = match Command::decode(data) {
            Ok(command) => command,
            Err(e) => {
                debug!("Simulator ignoring write: {}", e);
                return None;
            }
        };

        let allowed = self.config_mode || command == Command::EnableConfig;
        let result = if allowed { RESULT_SUCCESS } else { RESULT_FAILURE };

        if allowed {
            self.apply(command);
        }

        let ack = self.ack_for(command, result);
        trace!("Simulator answering {} with result {}", command, result);
        Some(ack.encode())
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::EnableConfig => self.config_mode = true,
            Command::DisableConfig => self.config_mode = false,
            Command::EnableSingleTarget => self.target_mode = TargetMode::Single,
            Command::EnableMultiTarget => self.target_mode = TargetMode::Multi,
            Command::SetArea { mode, areas } => {
                self.area_mode = mode;
                self.areas = areas;
            }
            Command::Reboot => {
                self.reboots += 1;
                self.config_mode = false;
            }
            Command::QueryTargetMode
            | Command::ReadFirmwareVersion
            | Command::ReadMacAddress
            | Command::QueryArea => {}
        }
    }

    fn ack_for(&self, command: Command, result: u16) -> Ack {
        match command {
            Command::EnableConfig => Ack::EnableConfig {
                result,
                protocol_version: 1,
                buffer_size: 0x40,
            },
            Command::DisableConfig => Ack::DisableConfig { result },
            Command::EnableSingleTarget => Ack::SingleTarget { result },
            Command::EnableMultiTarget => Ack::MultiTarget { result },
            Command::SetArea { .. } => Ack::SetArea { result },
            Command::Reboot => Ack::Reboot { result },
            Command::QueryTargetMode => Ack::TargetMode {
                result,
                mode: self.target_mode.into(),
            },
            Command::ReadFirmwareVersion => Ack::FirmwareVersion {
                result,
                firmware_type: 0,
                version: self.firmware,
            },
            Command::ReadMacAddress => Ack::MacAddress {
                result,
                mac: self.mac,
            },
            Command::QueryArea => Ack::Area {
                result,
                mode: self.area_mode.into(),
                areas: self.areas,
            },
        }
    }
}

impl Default for SimulatedRadar {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Shared {
    connected: bool,
    generation: u64,
    establish_calls: u32,
    establish_failures: VecDeque<Error>,
    write_failures: VecDeque<Error>,
    writes: Vec<Vec<u8>>,
    handler: Option<NotifyHandler>,
    on_disconnect: Option<DisconnectCallback>,
    simulator: Option<SimulatedRadar>,
}

impl Shared {
    /// Tear the current link down and hand back the callback to fire
    fn drop_link(&mut self) -> Option<DisconnectCallback> {
        if !self.connected {
            return None;
        }
        self.connected = false;
        self.handler = None;
        self.on_disconnect.take()
    }
}

/// In-memory connection provider
///
/// Cloning shares the same simulated device.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryProvider {
    /// Create a provider with no device behind it
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands with a simulated module
    pub fn with_simulator(self, radar: SimulatedRadar) -> Self {
        self.shared.lock().simulator = Some(radar);
        self
    }

    /// Fail the next establish call with `error`
    pub fn fail_next_establish(&self, error: Error) {
        self.shared.lock().establish_failures.push_back(error);
    }

    /// Fail the next write with `error`
    pub fn fail_next_write(&self, error: Error) {
        self.shared.lock().write_failures.push_back(error);
    }

    /// Every successful write so far, one entry per write
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.shared.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.shared.lock().writes.clear();
    }

    /// Number of establish calls, failed ones included
    pub fn establish_calls(&self) -> u32 {
        self.shared.lock().establish_calls
    }

    pub fn is_connected(&self) -> bool {
        self.shared.lock().connected
    }

    /// Snapshot of the simulated module
    pub fn simulator(&self) -> Option<SimulatedRadar> {
        self.shared.lock().simulator.clone()
    }

    /// Deliver a notification as if the module sent it
    ///
    /// Returns false when nobody is subscribed.
    pub fn emit(&self, data: &[u8]) -> bool {
        let handler = self.shared.lock().handler.clone();
        match handler {
            Some(handler) => {
                handler(data);
                true
            }
            None => false,
        }
    }

    /// Drop the link without being asked to (out of range, power loss)
    pub fn drop_link(&self) {
        let callback = self.shared.lock().drop_link();
        if let Some(callback) = callback {
            debug!("Memory link dropped");
            callback();
        }
    }
}

#[async_trait]
impl ConnectionProvider for MemoryProvider {
    async fn establish(
        &self,
        identity: &DeviceIdentity,
        on_disconnect: DisconnectCallback,
    ) -> Result<Arc<dyn Link>> {
        let mut shared = self.shared.lock();
        shared.establish_calls += 1;

        if let Some(error) = shared.establish_failures.pop_front() {
            debug!("Scripted establish failure for {}: {}", identity, error);
            return Err(error);
        }

        shared.generation += 1;
        shared.connected = true;
        shared.handler = None;
        shared.on_disconnect = Some(on_disconnect);
        if let Some(radar) = shared.simulator.as_mut() {
            radar.config_mode = false;
        }

        debug!("Memory link {} established to {}", shared.generation, identity);

        Ok(Arc::new(MemoryLink {
            shared: Arc::clone(&self.shared),
            generation: shared.generation,
        }))
    }
}

/// Link handed out by [`MemoryProvider`]
///
/// A link stays dead once a newer one has been established.
pub struct MemoryLink {
    shared: Arc<Mutex<Shared>>,
    generation: u64,
}

impl MemoryLink {
    fn is_current(&self, shared: &Shared) -> bool {
        shared.connected && shared.generation == self.generation
    }
}

#[async_trait]
impl Link for MemoryLink {
    async fn write(&self, characteristic: &str, data: &[u8]) -> Result<()> {
        let (handler, response) = {
            let mut shared = self.shared.lock();

            if !self.is_current(&shared) {
                return Err(Error::NotConnected);
            }
            if characteristic != CHARACTERISTIC_WRITE {
                return Err(Error::MissingCharacteristic(characteristic.to_string()));
            }
            if let Some(error) = shared.write_failures.pop_front() {
                return Err(error);
            }

            trace!("Memory write {} bytes: {:02X?}", data.len(), data);
            shared.writes.push(data.to_vec());

            let response = shared.simulator.as_mut().and_then(|radar| radar.respond(data));
            (shared.handler.clone(), response)
        };

        if let (Some(handler), Some(response)) = (handler, response) {
            handler(&response);
        }

        Ok(())
    }

    async fn start_notify(&self, characteristic: &str, handler: NotifyHandler) -> Result<()> {
        let mut shared = self.shared.lock();

        if !self.is_current(&shared) {
            return Err(Error::NotConnected);
        }
        if characteristic != CHARACTERISTIC_NOTIFY {
            return Err(Error::MissingCharacteristic(characteristic.to_string()));
        }

        shared.handler = Some(handler);
        Ok(())
    }

    async fn stop_notify(&self, _characteristic: &str) -> Result<()> {
        let mut shared = self.shared.lock();

        if self.is_current(&shared) {
            shared.handler = None;
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let callback = {
            let mut shared = self.shared.lock();
            if !self.is_current(&shared) {
                return Ok(());
            }
            shared.drop_link()
        };

        if let Some(callback) = callback {
            callback();
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.is_current(&self.shared.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ld2450_core::{Decoded, FrameDecoder};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("AA:BB:CC:DD:EE:FF")
    }

    fn noop() -> DisconnectCallback {
        Arc::new(|| {})
    }

    #[tokio::test]
    async fn test_establish_and_write() {
        let provider = MemoryProvider::new();
        let link = provider.establish(&identity(), noop()).await.unwrap();

        assert!(link.is_connected());
        link.write(CHARACTERISTIC_WRITE, &[1, 2, 3]).await.unwrap();

        assert_eq!(provider.writes(), vec![vec![1, 2, 3]]);
        assert_eq!(provider.establish_calls(), 1);
    }

    #[tokio::test]
    async fn test_wrong_characteristic() {
        let provider = MemoryProvider::new();
        let link = provider.establish(&identity(), noop()).await.unwrap();

        let result = link.write("0000ffff-0000-1000-8000-00805f9b34fb", &[1]).await;
        assert!(matches!(result, Err(Error::MissingCharacteristic(_))));
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let provider = MemoryProvider::new();
        provider.fail_next_establish(Error::NotFound("AA:BB:CC:DD:EE:FF".into()));

        let result = provider.establish(&identity(), noop()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        let link = provider.establish(&identity(), noop()).await.unwrap();
        provider.fail_next_write(Error::Transient("org.bluez.Error.InProgress".into()));

        let result = link.write(CHARACTERISTIC_WRITE, &[1]).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Transient);
        assert!(provider.writes().is_empty());
        assert_eq!(provider.establish_calls(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_fires_callback_once() {
        let provider = MemoryProvider::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let link = provider
            .establish(&identity(), Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .await
            .unwrap();

        link.disconnect().await.unwrap();
        link.disconnect().await.unwrap();
        provider.drop_link();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!link.is_connected());
        assert!(matches!(link.write(CHARACTERISTIC_WRITE, &[1]).await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_stale_link_stays_dead() {
        let provider = MemoryProvider::new();
        let old = provider.establish(&identity(), noop()).await.unwrap();
        provider.drop_link();

        let new = provider.establish(&identity(), noop()).await.unwrap();

        assert!(!old.is_connected());
        assert!(new.is_connected());
    }

    #[tokio::test]
    async fn test_simulator_answers_through_handler() {
        let provider = MemoryProvider::new().with_simulator(SimulatedRadar::new());
        let link = provider.establish(&identity(), noop()).await.unwrap();

        let received = Arc::new(Mutex::new(FrameDecoder::new()));
        let decoded = Arc::new(Mutex::new(Vec::new()));
        {
            let received = Arc::clone(&received);
            let decoded = Arc::clone(&decoded);
            link.start_notify(
                CHARACTERISTIC_NOTIFY,
                Arc::new(move |data: &[u8]| {
                    let frames = received.lock().decode(data);
                    decoded.lock().extend(frames);
                }),
            )
            .await
            .unwrap();
        }

        // outside a config bracket the module rejects reads
        link.write(CHARACTERISTIC_WRITE, &Command::QueryTargetMode.encode()).await.unwrap();
        for command in [Command::EnableConfig, Command::QueryTargetMode, Command::DisableConfig] {
            link.write(CHARACTERISTIC_WRITE, &command.encode()).await.unwrap();
        }

        assert_eq!(
            *decoded.lock(),
            vec![
                Decoded::Ack(Ack::TargetMode { result: 1, mode: 2 }),
                Decoded::Ack(Ack::EnableConfig { result: 0, protocol_version: 1, buffer_size: 0x40 }),
                Decoded::Ack(Ack::TargetMode { result: 0, mode: 2 }),
                Decoded::Ack(Ack::DisableConfig { result: 0 }),
            ]
        );
    }

    #[test]
    fn test_simulator_set_area() {
        let mut radar = SimulatedRadar::new();
        let areas = [Area::new(-1000, 0, 1000, 2000), Area::default(), Area::default()];

        radar.respond(&Command::EnableConfig.encode());
        let ack = radar
            .respond(&Command::SetArea { mode: AreaMode::MonitorInside, areas }.encode())
            .unwrap();

        assert_eq!(&ack[..], &Ack::SetArea { result: 0 }.encode()[..]);
        assert_eq!(radar.area_mode(), AreaMode::MonitorInside);
        assert_eq!(radar.areas(), areas);
        assert!(radar.in_config_mode());
    }
}
