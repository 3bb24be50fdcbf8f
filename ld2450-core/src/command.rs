//! LD2450 command definitions

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};

use ld2450_types::{Area, AreaMode};

use crate::{
    constants::COMMAND_VALUE_ONE,
    error::{Error, Result},
    frame::{Direction, Frame},
};

/// Protocol opcodes
///
/// The opcode is echoed back in the ACK, followed by the ACK direction byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // Config mode bracket
    EnableConfig = 0xFF,
    DisableConfig = 0xFE,

    // Tracking mode
    EnableSingleTarget = 0x80,
    EnableMultiTarget = 0x90,
    QueryTargetMode = 0x91,

    // Device information
    ReadFirmwareVersion = 0xA0,
    Reboot = 0xA3,
    ReadMacAddress = 0xA5,

    // Detection areas
    QueryArea = 0xC1,
    SetArea = 0xC2,
}

impl Opcode {
    /// Get opcode name
    pub fn name(self) -> &'static str {
        match self {
            Self::EnableConfig => "CMD_ENABLE_CONFIG",
            Self::DisableConfig => "CMD_DISABLE_CONFIG",
            Self::EnableSingleTarget => "CMD_SINGLE_TARGET",
            Self::EnableMultiTarget => "CMD_MULTI_TARGET",
            Self::QueryTargetMode => "CMD_QUERY_TARGET_MODE",
            Self::ReadFirmwareVersion => "CMD_READ_FW_VERSION",
            Self::Reboot => "CMD_REBOOT",
            Self::ReadMacAddress => "CMD_READ_MAC",
            Self::QueryArea => "CMD_QUERY_AREA",
            Self::SetArea => "CMD_SET_AREA",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        opcode as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0xFF => Ok(Self::EnableConfig),
            0xFE => Ok(Self::DisableConfig),
            0x80 => Ok(Self::EnableSingleTarget),
            0x90 => Ok(Self::EnableMultiTarget),
            0x91 => Ok(Self::QueryTargetMode),
            0xA0 => Ok(Self::ReadFirmwareVersion),
            0xA3 => Ok(Self::Reboot),
            0xA5 => Ok(Self::ReadMacAddress),
            0xC1 => Ok(Self::QueryArea),
            0xC2 => Ok(Self::SetArea),
            _ => Err(Error::UnknownOpcode(value)),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// Command sent to the module
///
/// Every read or write other than the bracket itself is only valid between
/// `EnableConfig` and `DisableConfig`.
///
/// # Examples
///
/// ```
/// use ld2450_core::Command;
///
/// let bytes = Command::EnableConfig.encode();
/// assert_eq!(
///     &bytes[..],
///     &[0xFD, 0xFC, 0xFB, 0xFA, 0x04, 0x00, 0xFF, 0x00, 0x01, 0x00, 0x04, 0x03, 0x02, 0x01]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    EnableConfig,
    DisableConfig,
    EnableSingleTarget,
    EnableMultiTarget,
    QueryTargetMode,
    ReadFirmwareVersion,
    ReadMacAddress,
    QueryArea,
    SetArea { mode: AreaMode, areas: [Area; 3] },
    Reboot,
}

impl Command {
    /// Size of the set-area payload: mode + 3 area blocks
    pub const SET_AREA_PAYLOAD_SIZE: usize = 2 + 3 * AREA_BLOCK_SIZE;

    pub fn opcode(&self) -> Opcode {
        match self {
            Self::EnableConfig => Opcode::EnableConfig,
            Self::DisableConfig => Opcode::DisableConfig,
            Self::EnableSingleTarget => Opcode::EnableSingleTarget,
            Self::EnableMultiTarget => Opcode::EnableMultiTarget,
            Self::QueryTargetMode => Opcode::QueryTargetMode,
            Self::ReadFirmwareVersion => Opcode::ReadFirmwareVersion,
            Self::ReadMacAddress => Opcode::ReadMacAddress,
            Self::QueryArea => Opcode::QueryArea,
            Self::SetArea { .. } => Opcode::SetArea,
            Self::Reboot => Opcode::Reboot,
        }
    }

    /// Command payload (everything between opcode and trailer)
    pub fn payload(&self) -> Bytes {
        match self {
            Self::EnableConfig | Self::ReadMacAddress => {
                Bytes::copy_from_slice(&COMMAND_VALUE_ONE.to_le_bytes())
            }
            Self::SetArea { mode, areas } => {
                let mut buf = BytesMut::with_capacity(Self::SET_AREA_PAYLOAD_SIZE);
                buf.put_u16_le((*mode).into());
                put_areas(&mut buf, areas);
                buf.freeze()
            }
            _ => Bytes::new(),
        }
    }

    pub fn to_frame(&self) -> Frame {
        Frame::command(self.opcode(), self.payload())
    }

    /// Encode the complete command frame
    pub fn encode(&self) -> BytesMut {
        self.to_frame().encode()
    }

    /// Parse a complete command frame (device side of the protocol)
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let frame = Frame::decode(buf)?;

        if frame.direction != Direction::Command {
            return Err(Error::InvalidDirection(frame.direction.into()));
        }

        let expected = match frame.opcode {
            Opcode::EnableConfig | Opcode::ReadMacAddress => 2,
            Opcode::SetArea => Self::SET_AREA_PAYLOAD_SIZE,
            _ => 0,
        };
        if frame.payload.len() != expected {
            return Err(Error::UnexpectedPayload {
                opcode: frame.opcode,
                expected,
                actual: frame.payload.len(),
            });
        }

        let command = match frame.opcode {
            Opcode::EnableConfig => Self::EnableConfig,
            Opcode::DisableConfig => Self::DisableConfig,
            Opcode::EnableSingleTarget => Self::EnableSingleTarget,
            Opcode::EnableMultiTarget => Self::EnableMultiTarget,
            Opcode::QueryTargetMode => Self::QueryTargetMode,
            Opcode::ReadFirmwareVersion => Self::ReadFirmwareVersion,
            Opcode::ReadMacAddress => Self::ReadMacAddress,
            Opcode::QueryArea => Self::QueryArea,
            Opcode::Reboot => Self::Reboot,
            Opcode::SetArea => {
                let mode = AreaMode::try_from(LittleEndian::read_u16(&frame.payload[0..2]))?;
                Self::SetArea {
                    mode,
                    areas: read_areas(&frame.payload[2..]),
                }
            }
        };

        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.opcode(), f)
    }
}

/// Bytes per area block (4 x i16)
pub const AREA_BLOCK_SIZE: usize = 8;

/// Write three area blocks as little-endian two's-complement i16
pub(crate) fn put_areas(buf: &mut BytesMut, areas: &[Area; 3]) {
    for area in areas {
        buf.put_i16_le(area.first_vertex_x);
        buf.put_i16_le(area.first_vertex_y);
        buf.put_i16_le(area.second_vertex_x);
        buf.put_i16_le(area.second_vertex_y);
    }
}

/// Read three area blocks. `buf` must hold at least 24 bytes.
pub(crate) fn read_areas(buf: &[u8]) -> [Area; 3] {
    let mut areas = [Area::default(); 3];
    for (area, block) in areas.iter_mut().zip(buf.chunks_exact(AREA_BLOCK_SIZE)) {
        *area = Area::new(
            LittleEndian::read_i16(&block[0..2]),
            LittleEndian::read_i16(&block[2..4]),
            LittleEndian::read_i16(&block[4..6]),
            LittleEndian::read_i16(&block[6..8]),
        );
    }
    areas
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_opcode_conversion() {
        assert_eq!(u8::from(Opcode::QueryArea), 0xC1);
        assert_eq!(Opcode::try_from(0xA5).unwrap(), Opcode::ReadMacAddress);
        assert!(matches!(Opcode::try_from(0x42), Err(Error::UnknownOpcode(0x42))));
    }

    #[test]
    fn test_fixed_command_templates() {
        assert_eq!(
            &Command::DisableConfig.encode()[..],
            &[0xFD, 0xFC, 0xFB, 0xFA, 0x02, 0x00, 0xFE, 0x00, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(
            &Command::ReadMacAddress.encode()[..],
            &[0xFD, 0xFC, 0xFB, 0xFA, 0x04, 0x00, 0xA5, 0x00, 0x01, 0x00, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(
            &Command::QueryTargetMode.encode()[..],
            &[0xFD, 0xFC, 0xFB, 0xFA, 0x02, 0x00, 0x91, 0x00, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(
            &Command::Reboot.encode()[..],
            &[0xFD, 0xFC, 0xFB, 0xFA, 0x02, 0x00, 0xA3, 0x00, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_set_area_encoding() {
        let command = Command::SetArea {
            mode: AreaMode::MonitorInside,
            areas: [Area::new(-1000, 0, 1000, 2000), Area::default(), Area::default()],
        };
        let bytes = command.encode();

        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[..8], &[0xFD, 0xFC, 0xFB, 0xFA, 0x1C, 0x00, 0xC2, 0x00]);
        // mode
        assert_eq!(&bytes[8..10], &[0x01, 0x00]);
        // -1000, 0, 1000, 2000
        assert_eq!(&bytes[10..18], &[0x18, 0xFC, 0x00, 0x00, 0xE8, 0x03, 0xD0, 0x07]);
        assert_eq!(&bytes[18..36], &[0u8; 18][..]);
        assert_eq!(&bytes[36..], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_command_decode() {
        let command = Command::SetArea {
            mode: AreaMode::IgnoreInside,
            areas: [
                Area::new(-5000, 100, 5000, 7300),
                Area::new(-1, -2, 3, 4),
                Area::default(),
            ],
        };

        assert_eq!(Command::decode(&command.encode()).unwrap(), command);
        assert_eq!(
            Command::decode(&Command::EnableConfig.encode()).unwrap(),
            Command::EnableConfig
        );
    }

    #[test]
    fn test_command_decode_rejects_ack() {
        let ack = Frame::ack(Opcode::Reboot, vec![0u8, 0]).encode();
        assert!(matches!(Command::decode(&ack), Err(Error::InvalidDirection(1))));
    }
}
