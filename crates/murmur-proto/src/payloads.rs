//! Variant payloads.
//!
//! Field names match the wire format exactly. Only the first group
//! (initialization, basic messages, directory updates, deletions) carries
//! reconciliation behaviour on the client; the rest are accepted so the
//! protocol surface is complete.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Authoritative session snapshot sent once per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializationPayload {
    /// Stable account id of this client.
    pub user_id: String,
    /// Id of this specific connection. Changes on every reconnect.
    pub ws_id: String,
    /// Current display name of this client.
    pub username: String,
    /// Full user directory. `None` marks a deleted account.
    #[serde(default)]
    pub user_map: HashMap<String, Option<String>>,
}

/// A chat message.
///
/// Outbound messages carry an empty `message_id`; the server assigns the
/// durable id and redelivers the message to every connection, including the
/// one that sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicMessage {
    /// Message text.
    pub content: String,
    /// Author account id.
    pub sender_id: String,
    /// Durable id, empty until assigned by the server.
    #[serde(default)]
    pub message_id: String,
    /// Room the message belongs to.
    #[serde(default)]
    pub room_id: String,
    /// Originating connection id, used only for echo suppression.
    pub ws_id: String,
    /// Milliseconds since the Unix epoch, set by the sender.
    #[serde(default)]
    pub timestamp: u64,
    /// Client-generated token, echoed back verbatim by servers that support
    /// it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl BasicMessage {
    /// Server-assigned id. `None` while the message is unconfirmed.
    pub fn durable_id(&self) -> Option<&str> {
        if self.message_id.is_empty() { None } else { Some(&self.message_id) }
    }
}

/// Image message. Not rendered by the core client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Location of the uploaded image.
    pub image_url: String,
    /// Author account id.
    pub sender_id: String,
}

/// Generic notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Originating account id.
    pub sender_id: String,
}

/// Typing indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPayload {
    /// Account that is typing.
    pub sender_id: String,
}

/// A new account joined the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserPayload {
    /// New account id.
    pub user_id: String,
    /// Display name of the new account.
    pub username: String,
}

/// A user was added to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAdditionPayload {
    /// Added account id.
    pub user_id: String,
    /// Display name of the added account.
    pub username: String,
}

/// A user was removed from a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRemovalPayload {
    /// Removed account id.
    pub removed_user: String,
    /// Account that performed the removal.
    pub sender_id: String,
}

/// A user switched rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRoomPayload {
    /// Destination room id.
    pub room_id: String,
    /// Account that switched.
    pub sender_id: String,
}

/// A user changed their display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameChangePayload {
    /// New display name.
    pub new_username: String,
    /// Account that was renamed.
    pub sender_id: String,
}

/// A room was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomChangePayload {
    /// Name of the new room.
    pub room_name: String,
    /// Account that created it.
    pub sender_id: String,
}

/// Deletion request (outbound) or confirmation (inbound) for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionPayload {
    /// Account requesting the deletion.
    pub sender_id: String,
    /// Durable id of the message to delete.
    pub message_id: String,
}
