//! Notification pump
//!
//! Turns raw notification chunks into state updates. Runs on the transport's
//! callback, so it never awaits and never writes to the link: reads the
//! device should make next are returned as [`FollowUp`]s.
//!
//! Each chunk is decoded and applied under one lock, so deliveries from
//! different threads update state in the order they were taken. Observers run
//! under that lock and must not feed bytes back into the pump.

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use ld2450_core::{
    ack::{format_firmware_version, format_mac_address},
    Ack, Decoded, FrameDecoder,
};
use ld2450_types::{AreaMode, TargetMode};

use crate::{callbacks::CallbackRegistry, state::StateStore};

/// Read to issue after a successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    QueryTargetMode,
    QueryArea,
}

#[derive(Debug, Default)]
pub(crate) struct NotificationPump {
    decoder: Mutex<FrameDecoder>,
}

impl NotificationPump {
    pub(crate) fn new() -> Self {
        Self {
            decoder: Mutex::new(FrameDecoder::new()),
        }
    }

    /// Forget any partial frame left by a previous link
    pub(crate) fn reset(&self) {
        self.decoder.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn buffered_len(&self) -> usize {
        self.decoder.lock().buffered_len()
    }

    pub(crate) fn on_bytes(
        &self,
        chunk: &[u8],
        store: &StateStore,
        callbacks: &CallbackRegistry,
    ) -> Vec<FollowUp> {
        let mut decoder = self.decoder.lock();
        let frames = decoder.decode(chunk);

        frames
            .into_iter()
            .filter_map(|frame| match frame {
                Decoded::Ack(ack) => apply_ack(ack, store),
                Decoded::Telemetry(targets) => {
                    store.replace_targets(targets);
                    let config = store.config();
                    callbacks.notify_state(&targets, &config);
                    None
                }
            })
            .collect()
    }
}

fn apply_ack(ack: Ack, store: &StateStore) -> Option<FollowUp> {
    if !ack.is_success() {
        error!("{} rejected by device (result {})", ack.opcode(), ack.result());
        return None;
    }

    match ack {
        Ack::EnableConfig { protocol_version, buffer_size, .. } => {
            debug!(
                "Config mode enabled (protocol {}, buffer {})",
                protocol_version, buffer_size
            );
            None
        }
        Ack::DisableConfig { .. } => {
            debug!("Config mode disabled");
            None
        }
        Ack::Reboot { .. } => {
            info!("Device rebooting");
            None
        }
        Ack::SingleTarget { .. } | Ack::MultiTarget { .. } => Some(FollowUp::QueryTargetMode),
        Ack::SetArea { .. } => Some(FollowUp::QueryArea),
        Ack::TargetMode { mode, .. } => {
            match TargetMode::try_from(mode) {
                Ok(mode) => {
                    debug!("Target mode: {:?}", mode);
                    store.update_config(|c| c.with_target_mode(mode));
                }
                Err(_) => warn!("Unknown target mode {}, keeping previous", mode),
            }
            None
        }
        Ack::FirmwareVersion { firmware_type, version, .. } => {
            let version = format_firmware_version(&version);
            debug!("Firmware {} (type {})", version, firmware_type);
            store.update_config(|c| c.with_firmware_version(version));
            None
        }
        Ack::MacAddress { mac, .. } => {
            let mac = format_mac_address(&mac);
            debug!("MAC address {}", mac);
            store.update_config(|c| c.with_mac_address(mac));
            None
        }
        Ack::Area { mode, areas, .. } => {
            store.update_config(|c| {
                let mode = AreaMode::try_from(mode).unwrap_or_else(|_| {
                    warn!("Unknown area mode {}, keeping previous", mode);
                    c.area_mode
                });
                c.with_areas(mode, areas)
            });
            None
        }
    }
}
