//! High-level error types

use ld2450_transport::ErrorKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] ld2450_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] ld2450_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] ld2450_types::Error),

    #[error("Device not connected")]
    NotConnected,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Transport classification, if this came from the link
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Transport(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Device out of range or not advertising
    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }

    /// Worth re-establishing the link and sending again
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), Some(ErrorKind::Transient | ErrorKind::Fatal))
    }
}
