//! Device configuration snapshot

use std::fmt;

use crate::error::{Error, Result};

/// Tracking mode reported by the module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TargetMode {
    /// Not queried yet
    #[default]
    Unset = 0,
    Single = 1,
    Multi = 2,
}

impl From<TargetMode> for u8 {
    fn from(mode: TargetMode) -> u8 {
        mode as u8
    }
}

impl TryFrom<u8> for TargetMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Unset),
            1 => Ok(Self::Single),
            2 => Ok(Self::Multi),
            _ => Err(Error::Validation(format!("Unknown target mode: {}", value))),
        }
    }
}

/// How the detection areas filter targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum AreaMode {
    #[default]
    Disabled = 0,
    /// Only report targets inside the areas
    MonitorInside = 1,
    /// Report targets outside the areas
    IgnoreInside = 2,
}

impl From<AreaMode> for u16 {
    fn from(mode: AreaMode) -> u16 {
        mode as u16
    }
}

impl TryFrom<u16> for AreaMode {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::MonitorInside),
            2 => Ok(Self::IgnoreInside),
            _ => Err(Error::Validation(format!("Unknown area mode: {}", value))),
        }
    }
}

/// Rectangular detection area given by two opposite corners (mm)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Area {
    pub first_vertex_x: i16,
    pub first_vertex_y: i16,
    pub second_vertex_x: i16,
    pub second_vertex_y: i16,
}

impl Area {
    pub fn new(first_vertex_x: i16, first_vertex_y: i16, second_vertex_x: i16, second_vertex_y: i16) -> Self {
        Self {
            first_vertex_x,
            first_vertex_y,
            second_vertex_x,
            second_vertex_y,
        }
    }

    pub fn value(&self, field: AreaField) -> i16 {
        match field {
            AreaField::FirstVertexX => self.first_vertex_x,
            AreaField::FirstVertexY => self.first_vertex_y,
            AreaField::SecondVertexX => self.second_vertex_x,
            AreaField::SecondVertexY => self.second_vertex_y,
        }
    }

    /// Copy of this area with one coordinate replaced
    pub fn with_value(mut self, field: AreaField, value: i16) -> Self {
        match field {
            AreaField::FirstVertexX => self.first_vertex_x = value,
            AreaField::FirstVertexY => self.first_vertex_y = value,
            AreaField::SecondVertexX => self.second_vertex_x = value,
            AreaField::SecondVertexY => self.second_vertex_y = value,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaSlot {
    One,
    Two,
    Three,
}

impl AreaSlot {
    pub const ALL: [AreaSlot; 3] = [Self::One, Self::Two, Self::Three];

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Three => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaField {
    FirstVertexX,
    FirstVertexY,
    SecondVertexX,
    SecondVertexY,
}

/// Configuration as last reported by the module
///
/// Fields are learnt one acknowledgement at a time. Each `with_*` method
/// returns a new snapshot that keeps every other field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    pub target_mode: TargetMode,

    /// Firmware version, e.g. "2.04.23101915"
    pub firmware_version: String,

    /// MAC address as colon separated upper-case hex
    pub mac_address: String,

    pub area_mode: AreaMode,

    pub areas: [Area; 3],
}

impl DeviceConfig {
    pub fn with_target_mode(&self, target_mode: TargetMode) -> Self {
        Self {
            target_mode,
            ..self.clone()
        }
    }

    pub fn with_firmware_version(&self, firmware_version: impl Into<String>) -> Self {
        Self {
            firmware_version: firmware_version.into(),
            ..self.clone()
        }
    }

    pub fn with_mac_address(&self, mac_address: impl Into<String>) -> Self {
        Self {
            mac_address: mac_address.into(),
            ..self.clone()
        }
    }

    pub fn with_areas(&self, area_mode: AreaMode, areas: [Area; 3]) -> Self {
        Self {
            area_mode,
            areas,
            ..self.clone()
        }
    }

    pub fn area(&self, slot: AreaSlot) -> &Area {
        &self.areas[slot.index()]
    }

    pub fn area_value(&self, slot: AreaSlot, field: AreaField) -> i16 {
        self.area(slot).value(field)
    }
}

impl fmt::Display for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config[mode: {:?}, FW: {}, MAC: {}, areas: {:?}]",
            self.target_mode, self.firmware_version, self.mac_address, self.area_mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mode_conversion() {
        assert_eq!(TargetMode::try_from(2).unwrap(), TargetMode::Multi);
        assert_eq!(u8::from(TargetMode::Single), 1);
        assert!(TargetMode::try_from(3).is_err());

        assert_eq!(AreaMode::try_from(1).unwrap(), AreaMode::MonitorInside);
        assert_eq!(u16::from(AreaMode::IgnoreInside), 2);
        assert!(AreaMode::try_from(7).is_err());
    }

    #[test]
    fn test_updates_preserve_other_fields() {
        let areas = [Area::new(-1000, 0, 1000, 2000), Area::default(), Area::default()];

        let config = DeviceConfig::default()
            .with_firmware_version("2.01.03CCBBAA")
            .with_mac_address("11:22:33:44:55:66")
            .with_areas(AreaMode::MonitorInside, areas)
            .with_target_mode(TargetMode::Multi);

        assert_eq!(config.target_mode, TargetMode::Multi);
        assert_eq!(config.firmware_version, "2.01.03CCBBAA");
        assert_eq!(config.mac_address, "11:22:33:44:55:66");
        assert_eq!(config.area_mode, AreaMode::MonitorInside);
        assert_eq!(config.area_value(AreaSlot::One, AreaField::FirstVertexX), -1000);
        assert_eq!(config.area_value(AreaSlot::One, AreaField::SecondVertexY), 2000);
    }

    #[test]
    fn test_area_with_value() {
        let area = Area::default()
            .with_value(AreaField::FirstVertexX, -500)
            .with_value(AreaField::SecondVertexY, 7300);

        assert_eq!(area, Area::new(-500, 0, 0, 7300));
    }
}
