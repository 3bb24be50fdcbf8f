//! Link session state
//!
//! A session tracks where the link is in its lifecycle:
//! - Disconnected -> Connecting -> Connected
//! - Connected -> Disconnected on any link loss
//! - Number of successful connections

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No link
    Disconnected,

    /// Establishment in flight
    Connecting,

    /// Link up
    Connected,
}

/// Session state tracker
///
/// Thread-safe and can be cloned cheaply (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Successful connections since creation
    connections: AtomicU32,

    /// Current link state
    state: parking_lot::RwLock<LinkState>,
}

impl Session {
    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                connections: AtomicU32::new(0),
                state: parking_lot::RwLock::new(LinkState::Disconnected),
            }),
        }
    }

    /// Get current state
    pub fn state(&self) -> LinkState {
        *self.inner.state.read()
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        matches!(self.state(), LinkState::Connected)
    }

    /// Number of successful connections
    pub fn connections(&self) -> u32 {
        self.inner.connections.load(Ordering::Acquire)
    }

    /// Start establishing a link
    ///
    /// A stale `Connected` state (link lost without notice) is allowed; a
    /// second concurrent attempt is not.
    pub fn begin_connect(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state == LinkState::Connecting {
            return Err(Error::InvalidSessionState(
                "Connection attempt already in progress".into()
            ));
        }

        *state = LinkState::Connecting;
        Ok(())
    }

    /// Mark the link as established
    pub fn mark_connected(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != LinkState::Connecting {
            return Err(Error::InvalidSessionState(
                format!("Cannot complete connection from state: {:?}", *state)
            ));
        }

        self.inner.connections.fetch_add(1, Ordering::AcqRel);
        *state = LinkState::Connected;
        Ok(())
    }

    /// Mark the link as gone
    pub fn close(&self) {
        *self.inner.state.write() = LinkState::Disconnected;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_new() {
        let session = Session::new();
        assert_eq!(session.state(), LinkState::Disconnected);
        assert!(!session.is_connected());
        assert_eq!(session.connections(), 0);
    }

    #[test]
    fn test_session_connect() {
        let session = Session::new();
        session.begin_connect().unwrap();
        assert_eq!(session.state(), LinkState::Connecting);
        assert!(!session.is_connected());

        session.mark_connected().unwrap();
        assert!(session.is_connected());
        assert_eq!(session.connections(), 1);
    }

    #[test]
    fn test_session_close() {
        let session = Session::new();
        session.begin_connect().unwrap();
        session.mark_connected().unwrap();

        session.close();

        assert_eq!(session.state(), LinkState::Disconnected);
        assert_eq!(session.connections(), 1);
    }

    #[test]
    fn test_invalid_state_transitions() {
        let session = Session::new();

        // Cannot complete without starting
        assert!(session.mark_connected().is_err());

        // Cannot start twice
        session.begin_connect().unwrap();
        assert!(session.begin_connect().is_err());
    }

    #[test]
    fn test_reconnect_counts() {
        let session = Session::new();
        for _ in 0..3 {
            session.begin_connect().unwrap();
            session.mark_connected().unwrap();
            session.close();
        }
        assert_eq!(session.connections(), 3);
    }

    #[test]
    fn test_session_clone() {
        let session1 = Session::new();
        let session2 = session1.clone();

        session1.begin_connect().unwrap();
        session1.mark_connected().unwrap();

        // Both share same state
        assert!(session2.is_connected());
    }
}
