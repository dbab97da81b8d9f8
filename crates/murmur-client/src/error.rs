//! Client error types.

use murmur_proto::{ProtocolError, VariantKind};
use thiserror::Error;

use crate::ConnectionState;

/// Errors produced by the client state machines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Inbound frame could not be decoded into a known variant.
    #[error("unknown message type: {0}")]
    UnknownMessageType(#[source] ProtocolError),

    /// A frame arrived before the session was initialized.
    #[error("{variant} frame received before Initialization")]
    NoSession {
        /// Variant of the dropped frame.
        variant: VariantKind,
    },

    /// Local operation requires an initialized session.
    #[error("cannot {operation} before the session is initialized")]
    NotInitialized {
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// Message content is empty after trimming.
    #[error("message is empty")]
    EmptyMessage,

    /// Send attempted while the connection is not open.
    #[error("transport not ready: connection is {state:?}")]
    TransportNotReady {
        /// Connection state at the time of the send.
        state: ConnectionState,
    },

    /// Invalid connection lifecycle transition.
    #[error("invalid connection transition: cannot {operation} from {state:?}")]
    InvalidTransition {
        /// Connection state when the error occurred.
        state: ConnectionState,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// Outbound envelope failed to encode.
    #[error("encode failed: {0}")]
    Encode(#[from] ProtocolError),
}

impl ClientError {
    /// Returns true for protocol-level errors that are logged and absorbed.
    ///
    /// These never reach the user: the offending frame or send is dropped and
    /// the session continues.
    pub fn is_absorbed(&self) -> bool {
        matches!(
            self,
            Self::UnknownMessageType(_) | Self::NoSession { .. } | Self::TransportNotReady { .. }
        )
    }
}
