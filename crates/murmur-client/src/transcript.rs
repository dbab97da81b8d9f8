//! Rendered transcript.
//!
//! The transcript is the ordered view index of rendered messages. It is only
//! ever mutated through [`TranscriptOp`]s, which the client also emits as
//! actions, so any mirror that applies the same ops in the same order holds
//! an identical copy.
//!
//! Entries are keyed by a client-assigned [`LocalId`] from the moment they are
//! rendered; the durable `message_id` is attached later for optimistic sends.

/// Client-assigned monotonic transcript key.
pub type LocalId = u64;

/// Rendering direction of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Authored by this account (on this or another connection).
    Sent,
    /// Authored by another account.
    Received,
}

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    /// Client-assigned key, stable for the lifetime of the entry.
    pub local_id: LocalId,
    /// Durable server id. `None` while an optimistic send is unconfirmed.
    pub message_id: Option<String>,
    /// Correlation token of an optimistic send.
    pub correlation_id: Option<String>,
    /// Author account id.
    pub sender_id: String,
    /// Room the message belongs to.
    pub room_id: String,
    /// Display name the entry is rendered under.
    pub author_label: String,
    /// Message text.
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Sent or received styling.
    pub direction: Direction,
    /// Optimistic send still waiting for its echo.
    pub pending: bool,
}

impl MessageView {
    /// Whether this entry was sent by us and has a durable id.
    pub fn is_confirmed_own(&self) -> bool {
        self.direction == Direction::Sent && !self.pending && self.message_id.is_some()
    }
}

/// A transcript mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOp {
    /// Render a new entry at the end of the transcript.
    Append(MessageView),
    /// Confirm an optimistic entry with its durable id.
    AssignId {
        /// Entry to confirm.
        local_id: LocalId,
        /// Server-assigned id.
        message_id: String,
    },
    /// Rewrite the author label of several entries.
    Relabel {
        /// Entries to relabel.
        local_ids: Vec<LocalId>,
        /// New author label.
        label: String,
    },
    /// Remove an entry.
    Remove {
        /// Entry to remove.
        local_id: LocalId,
    },
}

/// Ordered sequence of rendered messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<MessageView>,
    next_local_id: LocalId,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one mutation. Returns false if it targeted a missing entry.
    pub fn apply(&mut self, op: &TranscriptOp) -> bool {
        match op {
            TranscriptOp::Append(view) => {
                self.next_local_id = self.next_local_id.max(view.local_id.saturating_add(1));
                self.entries.push(view.clone());
                true
            },
            TranscriptOp::AssignId { local_id, message_id } => match self.get_mut(*local_id) {
                Some(view) => {
                    view.message_id = Some(message_id.clone());
                    view.pending = false;
                    true
                },
                None => false,
            },
            TranscriptOp::Relabel { local_ids, label } => {
                let mut touched = false;
                for view in self.entries.iter_mut().filter(|v| local_ids.contains(&v.local_id)) {
                    view.author_label.clone_from(label);
                    touched = true;
                }
                touched
            },
            TranscriptOp::Remove { local_id } => {
                let before = self.entries.len();
                self.entries.retain(|v| v.local_id != *local_id);
                self.entries.len() != before
            },
        }
    }

    /// Key the next appended entry will receive.
    pub fn next_local_id(&self) -> LocalId {
        self.next_local_id
    }

    /// Entries in render order.
    pub fn entries(&self) -> &[MessageView] {
        &self.entries
    }

    /// Number of rendered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is rendered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by local key.
    pub fn get(&self, local_id: LocalId) -> Option<&MessageView> {
        self.entries.iter().find(|v| v.local_id == local_id)
    }

    /// Entry carrying a durable id.
    pub fn by_message_id(&self, message_id: &str) -> Option<&MessageView> {
        self.entries.iter().find(|v| v.message_id.as_deref() == Some(message_id))
    }

    /// Oldest optimistic send still waiting for its echo.
    pub fn oldest_pending(&self) -> Option<&MessageView> {
        self.entries.iter().find(|v| v.pending)
    }

    /// Pending entry with the given correlation token.
    pub fn pending_with_correlation(&self, correlation_id: &str) -> Option<&MessageView> {
        self.entries
            .iter()
            .find(|v| v.pending && v.correlation_id.as_deref() == Some(correlation_id))
    }

    /// Keys of entries rendered under `label`.
    pub fn labelled(&self, label: &str) -> Vec<LocalId> {
        self.entries.iter().filter(|v| v.author_label == label).map(|v| v.local_id).collect()
    }

    /// Keys of entries authored by `sender_id`.
    pub fn authored_by(&self, sender_id: &str) -> Vec<LocalId> {
        self.entries.iter().filter(|v| v.sender_id == sender_id).map(|v| v.local_id).collect()
    }

    fn get_mut(&mut self, local_id: LocalId) -> Option<&mut MessageView> {
        self.entries.iter_mut().find(|v| v.local_id == local_id)
    }
}
