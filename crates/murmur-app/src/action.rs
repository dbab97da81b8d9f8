//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use crate::View;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Send a chat message.
    SendMessage {
        /// Message text as typed.
        content: String,
    },

    /// Delete rendered messages.
    DeleteMessages {
        /// Durable ids of the selected messages.
        message_ids: Vec<String>,
    },

    /// Request a display name change over HTTP.
    ChangeUsername {
        /// Requested display name, trimmed.
        new_username: String,
    },

    /// Upload a file over HTTP.
    Upload {
        /// Original file name.
        filename: String,
        /// File contents.
        bytes: Vec<u8>,
    },

    /// Navigate to another view.
    Navigate(View),
}
