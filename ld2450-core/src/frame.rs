//! LD2450 command/ACK frame structure and encoding/decoding

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    command::Opcode,
    constants::{DIRECTION_ACK, DIRECTION_COMMAND, FRAME_HEADER, FRAME_TRAILER},
    error::{Error, Result},
};

/// Whether a frame travels host -> module or module -> host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Command,
    Ack,
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> u8 {
        match direction {
            Direction::Command => DIRECTION_COMMAND,
            Direction::Ack => DIRECTION_ACK,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            DIRECTION_COMMAND => Ok(Self::Command),
            DIRECTION_ACK => Ok(Self::Ack),
            _ => Err(Error::InvalidDirection(value)),
        }
    }
}

/// LD2450 command or ACK frame
///
/// # Frame Structure
///
/// ```text
/// ┌─────────────┬─────────────┬────────┬───────────┬─────────────┬─────────────┐
/// │   Header    │   Length    │ Opcode │ Direction │   Payload   │   Trailer   │
/// │ FD FC FB FA │  (LE u16)   │ 1 byte │  00 / 01  │   N bytes   │ 04 03 02 01 │
/// └─────────────┴─────────────┴────────┴───────────┴─────────────┴─────────────┘
/// ```
///
/// Length counts opcode, direction and payload.
///
/// # Examples
///
/// ```
/// use ld2450_core::{Frame, Opcode};
///
/// let frame = Frame::command(Opcode::QueryArea, Vec::<u8>::new());
/// let encoded = frame.encode();
///
/// let decoded = Frame::decode(&encoded).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: Opcode,

    pub direction: Direction,

    pub payload: Bytes,
}

impl Frame {
    /// Header plus length field
    pub const PREFIX_SIZE: usize = FRAME_HEADER.len() + 2;

    /// Opcode plus direction byte
    pub const OPCODE_SIZE: usize = 2;

    /// Smallest possible frame (no payload)
    pub const MIN_SIZE: usize = Self::PREFIX_SIZE + Self::OPCODE_SIZE + FRAME_TRAILER.len();

    /// Create a host -> module frame
    pub fn command(opcode: Opcode, payload: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            direction: Direction::Command,
            payload: payload.into(),
        }
    }

    /// Create a module -> host frame
    pub fn ack(opcode: Opcode, payload: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            direction: Direction::Ack,
            payload: payload.into(),
        }
    }

    /// Value of the length field
    pub fn data_len(&self) -> usize {
        Self::OPCODE_SIZE + self.payload.len()
    }

    /// Get total frame size
    pub fn size(&self) -> usize {
        Self::MIN_SIZE + self.payload.len()
    }

    /// Encode frame to bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_slice(&FRAME_HEADER);
        buf.put_u16_le(self.data_len() as u16);
        buf.put_u8(self.opcode.into());
        buf.put_u8(self.direction.into());
        buf.put_slice(&self.payload);
        buf.put_slice(&FRAME_TRAILER);

        buf
    }

    /// Total frame size declared by the length field at the start of `buf`
    ///
    /// Returns `None` until the header and length field are available.
    pub fn declared_size(buf: &[u8]) -> Option<usize> {
        if buf.len() < Self::PREFIX_SIZE {
            return None;
        }
        let len = LittleEndian::read_u16(&buf[FRAME_HEADER.len()..Self::PREFIX_SIZE]) as usize;
        Some(Self::PREFIX_SIZE + len + FRAME_TRAILER.len())
    }

    /// Decode exactly one frame from `buf`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is shorter than an empty frame
    /// - Header or trailer bytes do not match
    /// - Length field disagrees with the buffer size
    /// - Opcode or direction byte is unknown
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::MIN_SIZE {
            return Err(Error::FrameTooShort {
                expected: Self::MIN_SIZE,
                actual: buf.len(),
            });
        }

        if buf[..FRAME_HEADER.len()] != FRAME_HEADER {
            return Err(Error::InvalidHeader(buf[..FRAME_HEADER.len()].to_vec()));
        }

        let trailer_start = buf.len() - FRAME_TRAILER.len();
        if buf[trailer_start..] != FRAME_TRAILER {
            return Err(Error::InvalidTrailer(buf[trailer_start..].to_vec()));
        }

        let declared = Self::declared_size(buf).unwrap_or_default();
        if declared != buf.len() {
            return Err(Error::LengthMismatch {
                declared,
                actual: buf.len(),
            });
        }

        let opcode = Opcode::try_from(buf[Self::PREFIX_SIZE])?;
        let direction = Direction::try_from(buf[Self::PREFIX_SIZE + 1])?;
        let payload = Bytes::copy_from_slice(&buf[Self::PREFIX_SIZE + Self::OPCODE_SIZE..trailer_start]);

        Ok(Self {
            opcode,
            direction,
            payload,
        })
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("opcode", &self.opcode)
            .field("direction", &self.direction)
            .field("payload", &format!("{:02X?}", &self.payload[..]))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[{}]({:?}, len={})",
            self.opcode,
            self.direction,
            self.payload.len()
        )
    }
}
