//! Persistent connection lifecycle.
//!
//! Pure state machine: the driver performs the actual discovery request and
//! socket I/O and reports the outcome here. The connection decides which URL
//! to open, whether a send may go out, and what a close means for the session.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ begin_discovery ┌─────────────┐ endpoint_resolved ┌────────────┐
//! │ Idle │────────────────>│ Discovering │──────────────────>│ Connecting │
//! └──────┘                 └─────────────┘                   └────────────┘
//!                                                                  │ opened
//!                                                                  v
//!                         ┌─────────────────┐     closed      ┌──────┐
//!                         │ Closed { clean }│<────────────────│ Open │
//!                         └─────────────────┘                 └──────┘
//! ```
//!
//! `closed` is accepted from every state. There is no edge out of `Closed`:
//! the client stays inert until restarted.

use murmur_proto::{
    Envelope,
    http::{DEFAULT_WS_PATH, DEFAULT_WS_PORT, websocket_url},
};

use crate::error::ClientError;

/// Connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing started.
    Idle,
    /// Waiting for the endpoint discovery response.
    Discovering,
    /// Socket being opened.
    Connecting {
        /// URL being opened.
        url: String,
    },
    /// Socket open; sends are released.
    Open,
    /// Socket closed. Terminal.
    Closed {
        /// Whether the close handshake completed normally.
        clean: bool,
    },
}

/// What a close means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Normal end of session. No navigation.
    SessionEnded,
    /// Unclean close: the session was terminated and the user must log in
    /// again.
    ForcedLogout,
}

/// Connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Port of the persistent connection.
    pub ws_port: u16,
    /// Path of the persistent connection.
    pub ws_path: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { ws_port: DEFAULT_WS_PORT, ws_path: DEFAULT_WS_PATH.to_string() }
    }
}

/// Connection state machine.
#[derive(Debug, Clone)]
pub struct Connection {
    state: ConnectionState,
    config: ConnectionConfig,
}

impl Connection {
    /// Create a connection in [`ConnectionState::Idle`].
    pub fn new(config: ConnectionConfig) -> Self {
        Self { state: ConnectionState::Idle, config }
    }

    /// Current state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether sends are currently released.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Whether the connection reached its terminal state.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, ConnectionState::Closed { .. })
    }

    /// Start endpoint discovery.
    pub fn begin_discovery(&mut self) -> Result<(), ClientError> {
        self.expect_state(&ConnectionState::Idle, "begin discovery")?;
        self.state = ConnectionState::Discovering;
        Ok(())
    }

    /// Discovery returned `ip`. Returns the URL to open.
    pub fn endpoint_resolved(&mut self, ip: &str) -> Result<String, ClientError> {
        self.expect_state(&ConnectionState::Discovering, "resolve endpoint")?;

        let url = websocket_url(ip, self.config.ws_port, &self.config.ws_path);
        tracing::debug!(%url, "endpoint resolved");
        self.state = ConnectionState::Connecting { url: url.clone() };
        Ok(url)
    }

    /// The socket opened.
    pub fn opened(&mut self) -> Result<(), ClientError> {
        let ConnectionState::Connecting { url } = &self.state else {
            return Err(ClientError::InvalidTransition {
                state: self.state.clone(),
                operation: "open",
            });
        };

        tracing::info!(%url, "connection open");
        self.state = ConnectionState::Open;
        Ok(())
    }

    /// Encode an envelope for transmission.
    ///
    /// Only released while open. Otherwise the frame is refused with
    /// [`ClientError::TransportNotReady`]; nothing is queued.
    pub fn send(&self, envelope: &Envelope) -> Result<String, ClientError> {
        if !self.is_open() {
            return Err(ClientError::TransportNotReady { state: self.state.clone() });
        }
        Ok(envelope.encode()?)
    }

    /// The socket closed.
    ///
    /// Returns `None` if already closed; the first close decides the outcome.
    pub fn closed(&mut self, clean: bool) -> Option<CloseOutcome> {
        if self.is_closed() {
            return None;
        }

        self.state = ConnectionState::Closed { clean };
        if clean {
            tracing::info!("connection closed");
            Some(CloseOutcome::SessionEnded)
        } else {
            tracing::warn!("connection lost, session terminated");
            Some(CloseOutcome::ForcedLogout)
        }
    }

    fn expect_state(
        &self,
        expected: &ConnectionState,
        operation: &'static str,
    ) -> Result<(), ClientError> {
        if &self.state == expected {
            Ok(())
        } else {
            Err(ClientError::InvalidTransition { state: self.state.clone(), operation })
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new(ConnectionConfig::default())
    }
}
