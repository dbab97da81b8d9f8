//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - User interactions (keyboard) and clock ticks.
//! - Protocol and HTTP notifications translated by the runtime.

use std::time::Instant;

use murmur_client::TranscriptOp;

use crate::KeyInput;

/// Result of an HTTP collaborator request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// 2xx response.
    Succeeded,
    /// Non-2xx response or transport failure.
    Failed {
        /// Human-readable reason, from the error body when present.
        reason: String,
    },
}

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick. Drives notice expiry.
    Tick {
        /// Current time from the driver.
        now: Instant,
    },

    /// Endpoint discovery in progress.
    Connecting,

    /// Socket open, waiting for Initialization.
    Connected,

    /// Session initialized.
    SessionStarted {
        /// Our account id.
        user_id: String,
        /// Our display name.
        display_name: String,
    },

    /// Our display name changed.
    DisplayNameChanged {
        /// New display name.
        display_name: String,
    },

    /// Transcript mutation from the client.
    Transcript(TranscriptOp),

    /// Connection closed.
    ConnectionClosed {
        /// Whether the close was clean.
        clean: bool,
    },

    /// Username change request finished.
    UsernameChangeFinished(RequestOutcome),

    /// Upload request finished.
    UploadFinished(RequestOutcome),

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}
