//! Command acknowledgements
//!
//! The module answers every command with an ACK carrying a 2-byte result code
//! (0 = success) and, for queries, a fixed-size value. A rejected command is
//! still acknowledged, so the result code is the only failure signal.

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, BytesMut};

use ld2450_types::Area;

use crate::{
    command::{AREA_BLOCK_SIZE, Opcode, put_areas, read_areas},
    error::{Error, Result},
    frame::{Direction, Frame},
};

/// Result code reported for a successful command
pub const RESULT_SUCCESS: u16 = 0;

/// Result code the simulator uses for a rejected command
pub const RESULT_FAILURE: u16 = 1;

/// Decoded acknowledgement
///
/// Values are kept as reported on the wire; mapping to domain types happens
/// where the snapshot is updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    EnableConfig {
        result: u16,
        protocol_version: u16,
        buffer_size: u16,
    },
    DisableConfig {
        result: u16,
    },
    Reboot {
        result: u16,
    },
    SingleTarget {
        result: u16,
    },
    MultiTarget {
        result: u16,
    },
    SetArea {
        result: u16,
    },
    TargetMode {
        result: u16,
        mode: u8,
    },
    FirmwareVersion {
        result: u16,
        firmware_type: u16,
        version: [u8; 6],
    },
    MacAddress {
        result: u16,
        mac: [u8; 6],
    },
    Area {
        result: u16,
        mode: u16,
        areas: [Area; 3],
    },
}

impl Ack {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::EnableConfig { .. } => Opcode::EnableConfig,
            Self::DisableConfig { .. } => Opcode::DisableConfig,
            Self::Reboot { .. } => Opcode::Reboot,
            Self::SingleTarget { .. } => Opcode::EnableSingleTarget,
            Self::MultiTarget { .. } => Opcode::EnableMultiTarget,
            Self::SetArea { .. } => Opcode::SetArea,
            Self::TargetMode { .. } => Opcode::QueryTargetMode,
            Self::FirmwareVersion { .. } => Opcode::ReadFirmwareVersion,
            Self::MacAddress { .. } => Opcode::ReadMacAddress,
            Self::Area { .. } => Opcode::QueryArea,
        }
    }

    /// Result code reported by the module
    pub fn result(&self) -> u16 {
        match self {
            Self::EnableConfig { result, .. }
            | Self::DisableConfig { result }
            | Self::Reboot { result }
            | Self::SingleTarget { result }
            | Self::MultiTarget { result }
            | Self::SetArea { result }
            | Self::TargetMode { result, .. }
            | Self::FirmwareVersion { result, .. }
            | Self::MacAddress { result, .. }
            | Self::Area { result, .. } => *result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result() == RESULT_SUCCESS
    }

    /// Payload size the module sends for `opcode`
    pub fn payload_size(opcode: Opcode) -> usize {
        match opcode {
            Opcode::EnableConfig => 6,
            Opcode::QueryTargetMode => 4,
            Opcode::ReadFirmwareVersion => 10,
            Opcode::ReadMacAddress => 8,
            Opcode::QueryArea => 4 + 3 * AREA_BLOCK_SIZE,
            Opcode::DisableConfig
            | Opcode::Reboot
            | Opcode::EnableSingleTarget
            | Opcode::EnableMultiTarget
            | Opcode::SetArea => 2,
        }
    }

    /// Decode an ACK from a complete frame
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        if frame.direction != Direction::Ack {
            return Err(Error::InvalidDirection(frame.direction.into()));
        }

        let expected = Self::payload_size(frame.opcode);
        let p = &frame.payload[..];
        if p.len() != expected {
            return Err(Error::UnexpectedPayload {
                opcode: frame.opcode,
                expected,
                actual: p.len(),
            });
        }

        let result = LittleEndian::read_u16(&p[0..2]);

        let ack = match frame.opcode {
            Opcode::EnableConfig => Self::EnableConfig {
                result,
                protocol_version: LittleEndian::read_u16(&p[2..4]),
                buffer_size: LittleEndian::read_u16(&p[4..6]),
            },
            Opcode::DisableConfig => Self::DisableConfig { result },
            Opcode::Reboot => Self::Reboot { result },
            Opcode::EnableSingleTarget => Self::SingleTarget { result },
            Opcode::EnableMultiTarget => Self::MultiTarget { result },
            Opcode::SetArea => Self::SetArea { result },
            // Mode travels as a u16; only the low byte carries a value
            Opcode::QueryTargetMode => Self::TargetMode { result, mode: p[2] },
            Opcode::ReadFirmwareVersion => {
                let mut version = [0u8; 6];
                version.copy_from_slice(&p[4..10]);
                Self::FirmwareVersion {
                    result,
                    firmware_type: LittleEndian::read_u16(&p[2..4]),
                    version,
                }
            }
            Opcode::ReadMacAddress => {
                let mut mac = [0u8; 6];
                mac.copy_from_slice(&p[2..8]);
                Self::MacAddress { result, mac }
            }
            Opcode::QueryArea => Self::Area {
                result,
                mode: LittleEndian::read_u16(&p[2..4]),
                areas: read_areas(&p[4..]),
            },
        };

        Ok(ack)
    }

    /// Build the frame a module sends for this ACK
    pub fn to_frame(&self) -> Frame {
        let mut buf = BytesMut::with_capacity(Self::payload_size(self.opcode()));
        buf.put_u16_le(self.result());

        match self {
            Self::EnableConfig {
                protocol_version,
                buffer_size,
                ..
            } => {
                buf.put_u16_le(*protocol_version);
                buf.put_u16_le(*buffer_size);
            }
            Self::TargetMode { mode, .. } => buf.put_u16_le(u16::from(*mode)),
            Self::FirmwareVersion {
                firmware_type,
                version,
                ..
            } => {
                buf.put_u16_le(*firmware_type);
                buf.put_slice(version);
            }
            Self::MacAddress { mac, .. } => buf.put_slice(mac),
            Self::Area { mode, areas, .. } => {
                buf.put_u16_le(*mode);
                put_areas(&mut buf, areas);
            }
            _ => {}
        }

        Frame::ack(self.opcode(), buf.freeze())
    }

    pub fn encode(&self) -> BytesMut {
        self.to_frame().encode()
    }
}

/// Format the 6 version bytes as the module's firmware string
///
/// Layout is `major.minor.build` where the build number is stored
/// little-endian in bytes 2..6:
///
/// ```
/// use ld2450_core::ack::format_firmware_version;
///
/// let version = format_firmware_version(&[0x01, 0x02, 0xAA, 0xBB, 0xCC, 0x03]);
/// assert_eq!(version, "2.01.03CCBBAA");
/// ```
pub fn format_firmware_version(v: &[u8; 6]) -> String {
    format!(
        "{:X}.{:02X}.{:02X}{:02X}{:02X}{:02X}",
        v[1], v[0], v[5], v[4], v[3], v[2]
    )
}

/// Format a MAC address in wire order as `AA:BB:CC:DD:EE:FF`
pub fn format_mac_address(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn all_shapes() -> Vec<Ack> {
        vec![
            Ack::EnableConfig { result: 0, protocol_version: 1, buffer_size: 0x40 },
            Ack::DisableConfig { result: 0 },
            Ack::Reboot { result: 1 },
            Ack::SingleTarget { result: 0 },
            Ack::MultiTarget { result: 0 },
            Ack::SetArea { result: 0 },
            Ack::TargetMode { result: 0, mode: 2 },
            Ack::FirmwareVersion {
                result: 0,
                firmware_type: 0,
                version: [0x01, 0x02, 0xAA, 0xBB, 0xCC, 0x03],
            },
            Ack::MacAddress { result: 0, mac: [0x11, 0x22, 0x33, 0x44, 0x55, 0x66] },
            Ack::Area {
                result: 0,
                mode: 1,
                areas: [
                    Area::new(-1000, 0, 1000, 2000),
                    Area::new(-5000, 7300, 5000, 1),
                    Area::default(),
                ],
            },
        ]
    }

    #[test]
    fn test_every_ack_shape_round_trips() {
        for ack in all_shapes() {
            let encoded = ack.encode();
            let frame = Frame::decode(&encoded).unwrap();
            assert_eq!(Ack::from_frame(&frame).unwrap(), ack);
        }
    }

    #[test]
    fn test_enable_config_ack_bytes() {
        let ack = Ack::EnableConfig { result: 0, protocol_version: 1, buffer_size: 0x40 };
        assert_eq!(
            &ack.encode()[..],
            &[
                0xFD, 0xFC, 0xFB, 0xFA, 0x08, 0x00, 0xFF, 0x01, 0x00, 0x00, 0x01, 0x00, 0x40, 0x00,
                0x04, 0x03, 0x02, 0x01
            ]
        );
    }

    #[test]
    fn test_length_fields_match_module() {
        let len = |ack: Ack| ack.encode()[4];

        assert_eq!(len(Ack::DisableConfig { result: 0 }), 0x04);
        assert_eq!(len(Ack::TargetMode { result: 0, mode: 1 }), 0x06);
        assert_eq!(
            len(Ack::FirmwareVersion { result: 0, firmware_type: 0, version: [0; 6] }),
            0x0C
        );
        assert_eq!(len(Ack::MacAddress { result: 0, mac: [0; 6] }), 0x0A);
        assert_eq!(len(Ack::Area { result: 0, mode: 0, areas: [Area::default(); 3] }), 0x1E);
    }

    #[test]
    fn test_result_code() {
        assert!(Ack::SetArea { result: 0 }.is_success());
        assert!(!Ack::SetArea { result: 1 }.is_success());
        assert_eq!(Ack::Reboot { result: 0x0102 }.result(), 0x0102);
    }

    #[test]
    fn test_firmware_version_format() {
        assert_eq!(
            format_firmware_version(&[0x01, 0x02, 0xAA, 0xBB, 0xCC, 0x03]),
            "2.01.03CCBBAA"
        );
        assert_eq!(
            format_firmware_version(&[0x04, 0x02, 0x15, 0x19, 0x10, 0x23]),
            "2.04.23101915"
        );
    }

    #[test]
    fn test_mac_address_format() {
        assert_eq!(
            format_mac_address(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]),
            "11:22:33:44:55:66"
        );
        assert_eq!(
            format_mac_address(&[0xab, 0xcd, 0x0e, 0xf0, 0x01, 0x9a]),
            "AB:CD:0E:F0:01:9A"
        );
    }

    #[test]
    fn test_wrong_payload_size() {
        let frame = Frame::ack(Opcode::ReadMacAddress, vec![0u8, 0, 1, 2]);
        assert!(matches!(
            Ack::from_frame(&frame),
            Err(Error::UnexpectedPayload { expected: 8, actual: 4, .. })
        ));
    }
}
