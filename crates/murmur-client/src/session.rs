//! Session identity.

use murmur_proto::InitializationPayload;

/// Identity of this client for the lifetime of one connection.
///
/// Created from the Initialization frame. `connection_id` identifies this
/// particular socket and is used only for echo suppression, never as a user
/// identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Stable account id.
    pub self_user_id: String,
    /// Id of this connection.
    pub connection_id: String,
    /// Current display name, used to label locally sent messages.
    pub display_name: String,
    /// Room outbound messages are addressed to.
    pub current_room_id: String,
}

impl Session {
    /// Build a session from the server's Initialization snapshot.
    pub fn from_initialization(init: &InitializationPayload) -> Self {
        Self {
            self_user_id: init.user_id.clone(),
            connection_id: init.ws_id.clone(),
            display_name: init.username.clone(),
            current_room_id: String::new(),
        }
    }

    /// Whether `ws_id` names this connection.
    pub fn is_own_connection(&self, ws_id: &str) -> bool {
        self.connection_id == ws_id
    }

    /// Whether `user_id` is this account.
    pub fn is_self(&self, user_id: &str) -> bool {
        self.self_user_id == user_id
    }
}
