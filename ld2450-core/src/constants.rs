//! Protocol constants

use std::time::Duration;

/// Notify characteristic (module -> host)
pub const CHARACTERISTIC_NOTIFY: &str = "0000fff1-0000-1000-8000-00805f9b34fb";

/// Write characteristic (host -> module)
pub const CHARACTERISTIC_WRITE: &str = "0000fff2-0000-1000-8000-00805f9b34fb";

/// Command and ACK frame header
pub const FRAME_HEADER: [u8; 4] = [0xFD, 0xFC, 0xFB, 0xFA];

/// Command and ACK frame trailer
pub const FRAME_TRAILER: [u8; 4] = [0x04, 0x03, 0x02, 0x01];

/// Direction byte following the opcode in a command frame
pub const DIRECTION_COMMAND: u8 = 0x00;

/// Direction byte following the opcode in an ACK frame
pub const DIRECTION_ACK: u8 = 0x01;

/// Largest length field accepted in an ACK (area query ACK is 0x1E)
pub const MAX_ACK_LEN: u16 = 0x40;

/// Telemetry frame start marker
pub const TELEMETRY_HEADER: [u8; 4] = [0xAA, 0xFF, 0x03, 0x00];

/// Telemetry frame end marker
pub const TELEMETRY_TRAILER: [u8; 2] = [0x55, 0xCC];

/// Target blocks per telemetry frame
pub const TARGET_COUNT: usize = 3;

/// Bytes per target block (x, y, speed, resolution)
pub const TARGET_BLOCK_SIZE: usize = 8;

/// Total telemetry frame size
pub const TELEMETRY_FRAME_SIZE: usize =
    TELEMETRY_HEADER.len() + TARGET_COUNT * TARGET_BLOCK_SIZE + TELEMETRY_TRAILER.len();

/// Bit 15 of a telemetry coordinate marks a positive value
pub const SIGN_FLAG: u16 = 0x8000;

/// Value sent with the enable-config and read-MAC commands
pub const COMMAND_VALUE_ONE: u16 = 0x0001;

/// Backoff before disconnecting after a transient link error
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);

/// Backoff between reconnect attempts when the device is not found
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_millis(250);

/// Attempts per command bracket before giving up
pub const DEFAULT_COMMAND_ATTEMPTS: u32 = 3;
