//! Target telemetry frames
//!
//! ```text
//! AA FF 03 00 | x y speed res (target 1) | ... (target 2) | ... (target 3) | 55 CC
//! ```
//!
//! x, y and speed do NOT use two's complement: bit 15 set means positive and
//! the low 15 bits are the magnitude. Resolution is a plain u16.

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, BytesMut};

use ld2450_types::{Target, TargetState};

use crate::{
    constants::{
        SIGN_FLAG, TARGET_BLOCK_SIZE, TELEMETRY_FRAME_SIZE, TELEMETRY_HEADER, TELEMETRY_TRAILER,
    },
    error::{Error, Result},
};

/// Decode a sign-flag coordinate
///
/// ```
/// use ld2450_core::telemetry::decode_coordinate;
///
/// assert_eq!(decode_coordinate(34916), 2148);
/// assert_eq!(decode_coordinate(50), -50);
/// assert_eq!(decode_coordinate(0x8000), 0);
/// ```
pub fn decode_coordinate(raw: u16) -> i16 {
    if raw >= SIGN_FLAG {
        (raw - SIGN_FLAG) as i16
    } else {
        // raw < 0x8000 so the magnitude fits
        -(raw as i16)
    }
}

/// Inverse of [`decode_coordinate`]
///
/// The format has no room for `i16::MIN`; it is clamped to -32767.
pub fn encode_coordinate(value: i16) -> u16 {
    let value = value.max(-i16::MAX);
    if value > 0 {
        value as u16 | SIGN_FLAG
    } else {
        value.unsigned_abs()
    }
}

/// Decode a complete telemetry frame
pub fn decode(buf: &[u8]) -> Result<TargetState> {
    if buf.len() != TELEMETRY_FRAME_SIZE {
        return Err(Error::LengthMismatch {
            declared: TELEMETRY_FRAME_SIZE,
            actual: buf.len(),
        });
    }
    if buf[..TELEMETRY_HEADER.len()] != TELEMETRY_HEADER {
        return Err(Error::InvalidHeader(buf[..TELEMETRY_HEADER.len()].to_vec()));
    }
    let trailer_start = TELEMETRY_FRAME_SIZE - TELEMETRY_TRAILER.len();
    if buf[trailer_start..] != TELEMETRY_TRAILER {
        return Err(Error::InvalidTrailer(buf[trailer_start..].to_vec()));
    }

    let mut targets = [Target::default(); 3];
    let blocks = buf[TELEMETRY_HEADER.len()..trailer_start].chunks_exact(TARGET_BLOCK_SIZE);
    for (target, block) in targets.iter_mut().zip(blocks) {
        *target = Target {
            x: decode_coordinate(LittleEndian::read_u16(&block[0..2])),
            y: decode_coordinate(LittleEndian::read_u16(&block[2..4])),
            speed: decode_coordinate(LittleEndian::read_u16(&block[4..6])),
            resolution: LittleEndian::read_u16(&block[6..8]),
        };
    }

    Ok(TargetState::new(targets))
}

/// Encode a telemetry frame the way the module sends it
pub fn encode(state: &TargetState) -> BytesMut {
    let mut buf = BytesMut::with_capacity(TELEMETRY_FRAME_SIZE);

    buf.put_slice(&TELEMETRY_HEADER);
    for target in &state.targets {
        buf.put_u16_le(encode_coordinate(target.x));
        buf.put_u16_le(encode_coordinate(target.y));
        buf.put_u16_le(encode_coordinate(target.speed));
        buf.put_u16_le(target.resolution);
    }
    buf.put_slice(&TELEMETRY_TRAILER);

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_sign_flag_convention() {
        assert_eq!(decode_coordinate(34916), 2148);
        assert_eq!(decode_coordinate(0x0032), -50);
        assert_eq!(decode_coordinate(0x8000), 0);
        assert_eq!(decode_coordinate(0), 0);
        assert_eq!(decode_coordinate(0xFFFF), 32767);
        assert_eq!(decode_coordinate(0x7FFF), -32767);
    }

    #[test]
    fn test_decode_module_frame() {
        // Single target at x=-782, y=1713, speed=-16 cm/s, resolution=360
        let frame = [
            0xAA, 0xFF, 0x03, 0x00, 0x0E, 0x03, 0xB1, 0x86, 0x10, 0x00, 0x68, 0x01, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x55, 0xCC,
        ];

        let state = decode(&frame).unwrap();
        assert_eq!(
            state.targets[0],
            Target { x: -782, y: 1713, speed: -16, resolution: 360 }
        );
        assert_eq!(state.targets[1], Target::default());
        assert_eq!(state.present_count(), 1);
    }

    #[test]
    fn test_decode_rejects_bad_trailer() {
        let mut frame = encode(&TargetState::default());
        frame[29] = 0x00;

        assert!(matches!(decode(&frame), Err(Error::InvalidTrailer(_))));
    }

    #[test]
    fn test_most_negative_is_clamped() {
        assert_eq!(encode_coordinate(i16::MIN), 0x7FFF);
        assert_eq!(decode_coordinate(encode_coordinate(i16::MIN)), -32767);
    }

    proptest! {
        #[test]
        fn prop_coordinate_round_trip(value in -32767i16..=32767) {
            prop_assert_eq!(decode_coordinate(encode_coordinate(value)), value);
        }

        #[test]
        fn prop_positive_raw_subtracts_flag(raw in 0x8000u16..=0xFFFF) {
            prop_assert_eq!(i32::from(decode_coordinate(raw)), i32::from(raw) - 0x8000);
        }
    }
}
