//! Client events and actions.

use murmur_proto::Envelope;

use crate::transcript::TranscriptOp;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Receiving text frames from the persistent connection
/// - Forwarding user intents (send message, delete messages)
/// - Supplying wall-clock timestamps for outbound messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Text frame received from the server.
    FrameReceived(String),

    /// User wants to send a chat message.
    SendMessage {
        /// Message text, trimmed before sending.
        content: String,
        /// Milliseconds since the Unix epoch.
        timestamp: u64,
    },

    /// User wants to delete rendered messages.
    DeleteMessages {
        /// Durable ids of the messages to delete.
        message_ids: Vec<String>,
    },
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Send an envelope to the server.
    Send(Envelope),

    /// Apply a transcript mutation to the rendered view.
    Transcript(TranscriptOp),

    /// Initialization received; the session is live.
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
}
