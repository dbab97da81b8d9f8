//! Observable application state types.
//!
//! These structures are the view model: the subset of session state the UI
//! needs, without the reconciliation machinery of the client.

use std::time::Instant;

/// Connection state as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to server.
    Disconnected,
    /// Discovery or socket open in progress, or waiting for Initialization.
    Connecting,
    /// Session initialized.
    Connected {
        /// Our account id.
        user_id: String,
    },
    /// Connection closed. Terminal.
    Closed {
        /// Whether the close was clean.
        clean: bool,
    },
}

/// Top-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Chat transcript and composer.
    Chat,
    /// Login page, shown after a forced logout.
    Login,
}

/// Notice styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Request succeeded.
    Success,
    /// Request or protocol error.
    Error,
}

/// Notice display phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticePhase {
    /// Fully visible.
    Visible,
    /// Fading out before removal.
    Fading,
}

/// Transient status notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message text.
    pub text: String,
    /// Styling.
    pub kind: NoticeKind,
    /// Display phase.
    pub phase: NoticePhase,
    /// First tick at which the notice was on screen. `None` until the next
    /// tick after it was raised.
    pub shown_at: Option<Instant>,
}

impl Notice {
    /// A fresh, visible notice.
    pub fn new(text: impl Into<String>, kind: NoticeKind) -> Self {
        Self { text: text.into(), kind, phase: NoticePhase::Visible, shown_at: None }
    }
}
