//! Error types for ld2450-core



/// Result type alias for ld2450 codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame is too short to be valid
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// Header bytes do not match
    #[error("Invalid frame header: {0:02X?}")]
    InvalidHeader(Vec<u8>),

    /// Trailer bytes do not match
    #[error("Invalid frame trailer: {0:02X?}")]
    InvalidTrailer(Vec<u8>),

    /// Length field disagrees with the frame size
    #[error("Length mismatch: header says {declared} bytes, frame carries {actual} bytes")]
    LengthMismatch {
        declared: usize,
        actual: usize,
    },

    /// Unknown opcode
    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Direction byte is neither command nor ACK
    #[error("Invalid direction byte: 0x{0:02X}")]
    InvalidDirection(u8),

    /// ACK payload has the wrong size for its opcode
    #[error("Unexpected payload for {opcode}: expected {expected} bytes, got {actual} bytes")]
    UnexpectedPayload {
        opcode: crate::command::Opcode,
        expected: usize,
        actual: usize,
    },

    /// Field value outside its protocol range
    #[error(transparent)]
    Types(#[from] ld2450_types::Error),

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}
