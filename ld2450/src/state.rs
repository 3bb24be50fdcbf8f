//! Latest known radar state
//!
//! Readers get cheap snapshots. Config updates are read-modify-write under the
//! write lock so two ACKs landing together never lose a field.

use std::sync::Arc;

use parking_lot::RwLock;

use ld2450_types::{DeviceConfig, TargetState};

#[derive(Debug, Default)]
pub(crate) struct StateStore {
    targets: RwLock<TargetState>,
    config: RwLock<Arc<DeviceConfig>>,
}

impl StateStore {
    pub(crate) fn targets(&self) -> TargetState {
        *self.targets.read()
    }

    pub(crate) fn config(&self) -> Arc<DeviceConfig> {
        Arc::clone(&self.config.read())
    }

    pub(crate) fn replace_targets(&self, targets: TargetState) {
        *self.targets.write() = targets;
    }

    /// Derive a new config from the current one and publish it
    pub(crate) fn update_config<F>(&self, f: F) -> Arc<DeviceConfig>
    where
        F: FnOnce(&DeviceConfig) -> DeviceConfig,
    {
        let mut config = self.config.write();
        let updated = Arc::new(f(&config));
        *config = Arc::clone(&updated);
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ld2450_types::{Target, TargetMode};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_keeps_other_fields() {
        let store = StateStore::default();
        store.update_config(|c| c.with_firmware_version("2.04.23101915"));
        store.update_config(|c| c.with_target_mode(TargetMode::Single));

        let config = store.config();
        assert_eq!(config.firmware_version, "2.04.23101915");
        assert_eq!(config.target_mode, TargetMode::Single);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let store = StateStore::default();
        let before = store.config();
        store.update_config(|c| c.with_mac_address("11:22:33:44:55:66"));

        assert_eq!(before.mac_address, "");
        assert_eq!(store.config().mac_address, "11:22:33:44:55:66");
    }

    #[test]
    fn test_replace_targets() {
        let store = StateStore::default();
        let state = TargetState::new([
            Target { x: 100, y: 200, speed: 0, resolution: 320 },
            Target::default(),
            Target::default(),
        ]);
        store.replace_targets(state);
        assert_eq!(store.targets(), state);
    }
}
