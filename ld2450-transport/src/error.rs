//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Device {0} not found")]
    NotFound(String),

    #[error("Transient link error: {0}")]
    Transient(String),

    #[error("Link error: {0}")]
    Link(String),

    #[error("Characteristic {0} missing")]
    MissingCharacteristic(String),

    #[error("Not connected")]
    NotConnected,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// How the session layer should react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Device is out of range or gone; retry is up to the caller
    NotFound,

    /// Back off, drop the link and let the caller retry
    Transient,

    /// Drop the link and surface
    Fatal,

    /// Wrong or incompatible device; the link itself is fine
    MissingCharacteristic,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transient(_) => ErrorKind::Transient,
            Self::MissingCharacteristic(_) => ErrorKind::MissingCharacteristic,
            Self::Link(_) | Self::NotConnected | Self::Io(_) => ErrorKind::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::NotFound("AA".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Transient("busy".into()).kind(), ErrorKind::Transient);
        assert_eq!(Error::NotConnected.kind(), ErrorKind::Fatal);
        assert_eq!(
            Error::MissingCharacteristic("fff2".into()).kind(),
            ErrorKind::MissingCharacteristic
        );
        assert_eq!(
            Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")).kind(),
            ErrorKind::Fatal
        );
    }
}
