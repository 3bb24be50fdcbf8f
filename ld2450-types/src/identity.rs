//! Device identity as seen by the wireless stack

use std::fmt;

/// Identity of the radar module on the link
///
/// The address is whatever the connection provider uses to find the device
/// (a BLE MAC on Linux/Windows, a platform UUID on macOS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Link address
    pub address: String,

    /// Advertised name
    pub name: Option<String>,

    /// Signal strength from the last advertisement
    pub rssi: Option<i16>,
}

impl DeviceIdentity {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            rssi: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// Advertised name, falling back to the address
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_address() {
        let identity = DeviceIdentity::new("AA:BB:CC:DD:EE:FF");
        assert_eq!(identity.display_name(), "AA:BB:CC:DD:EE:FF");

        let named = identity.with_name("HLK-LD2450_1A2B");
        assert_eq!(named.display_name(), "HLK-LD2450_1A2B");
        assert_eq!(named.to_string(), "HLK-LD2450_1A2B (AA:BB:CC:DD:EE:FF)");
    }
}
