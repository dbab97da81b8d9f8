//! Reference model for model-based testing.
//!
//! Operations are applied to both the [`ModelWorld`] and the real clients.
//! Once every queued frame is delivered, each client's confirmed transcript
//! must equal [`ModelWorld::observable`].

use std::collections::BTreeMap;

/// Client identifier (index into the simulated client list).
pub type ClientId = u8;

/// Operations that can be applied to the system.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Compose and send a message.
    Send {
        /// Sending client.
        client_id: ClientId,
        /// Non-blank message text.
        content: String,
    },
    /// Request a display name change to `name{name}`.
    Rename {
        /// Renaming client.
        client_id: ClientId,
        /// Index of the requested name.
        name: u8,
    },
    /// Delete one of the client's own confirmed messages.
    DeleteOwn {
        /// Deleting client.
        client_id: ClientId,
        /// Which own confirmed message, modulo the number available.
        nth: u8,
    },
    /// Deliver up to `count` queued frames to one client.
    Deliver {
        /// Receiving client.
        client_id: ClientId,
        /// Maximum number of frames.
        count: u8,
    },
}

impl Operation {
    /// Display name requested by a rename.
    pub fn requested_name(name: u8) -> String {
        format!("name{name}")
    }
}

/// A message as the model knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMessage {
    /// Server-assigned id.
    pub message_id: String,
    /// Author account id.
    pub sender_id: String,
    /// Message text.
    pub content: String,
}

/// What a fully synchronised client shows for one message.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObservableMessage {
    /// Server-assigned id.
    pub message_id: String,
    /// Author account id.
    pub sender_id: String,
    /// Current author label.
    pub author_label: String,
    /// Message text.
    pub content: String,
}

/// Reference implementation of the server-visible state.
#[derive(Debug, Clone, Default)]
pub struct ModelWorld {
    names: BTreeMap<String, String>,
    messages: BTreeMap<u64, ModelMessage>,
    next_message: u64,
}

impl ModelWorld {
    /// Create a world with the given accounts.
    pub fn new<'a>(users: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            names: users.into_iter().map(|(id, name)| (id.to_string(), name.to_string())).collect(),
            messages: BTreeMap::new(),
            next_message: 1,
        }
    }

    /// Record a sent message. Returns the id the server will assign.
    pub fn send(&mut self, sender_id: &str, content: &str) -> String {
        let seq = self.next_message;
        self.next_message += 1;
        let message_id = format!("m{seq}");
        self.messages.insert(seq, ModelMessage {
            message_id: message_id.clone(),
            sender_id: sender_id.to_string(),
            content: content.trim().to_string(),
        });
        message_id
    }

    /// Apply a rename. Returns whether the server accepts it.
    pub fn rename(&mut self, user_id: &str, new_name: &str) -> bool {
        let taken = self.names.iter().any(|(id, name)| id != user_id && name == new_name);
        if taken || new_name.trim().is_empty() {
            return false;
        }
        self.names.insert(user_id.to_string(), new_name.to_string());
        true
    }

    /// Apply a deletion. Returns whether a message was removed.
    pub fn delete(&mut self, sender_id: &str, message_id: &str) -> bool {
        let seq = self
            .messages
            .iter()
            .find(|(_, m)| m.message_id == message_id && m.sender_id == sender_id)
            .map(|(seq, _)| *seq);
        seq.and_then(|seq| self.messages.remove(&seq)).is_some()
    }

    /// Current display name of an account.
    pub fn name_of(&self, user_id: &str) -> Option<&str> {
        self.names.get(user_id).map(String::as_str)
    }

    /// Live messages in server order.
    pub fn messages(&self) -> impl Iterator<Item = &ModelMessage> {
        self.messages.values()
    }

    /// Expected transcript of any fully synchronised client, sorted.
    pub fn observable(&self) -> Vec<ObservableMessage> {
        let mut out: Vec<_> = self
            .messages
            .values()
            .map(|m| ObservableMessage {
                message_id: m.message_id.clone(),
                sender_id: m.sender_id.clone(),
                author_label: self.name_of(&m.sender_id).unwrap_or_default().to_string(),
                content: m.content.clone(),
            })
            .collect();
        out.sort();
        out
    }
}
