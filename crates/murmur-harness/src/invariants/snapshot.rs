//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state so every check in
//! a pass sees the same state.

use murmur_app::{App, Bridge, ConnectionState};
use murmur_client::MessageView;

/// Snapshot of the entire system state.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<ClientSnapshot>) -> Self {
        Self { clients }
    }

    /// Add a client snapshot.
    pub fn add_client(&mut self, client: ClientSnapshot) {
        self.clients.push(client);
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone, Default)]
pub struct ClientSnapshot {
    /// Client label used in violation messages.
    pub id: String,
    /// Account id, once the session has started.
    pub user_id: Option<String>,
    /// Transcript as rendered by the App.
    pub rendered: Vec<MessageView>,
    /// Transcript as held by the reconciler. `None` when only the App was
    /// captured.
    pub reconciled: Option<Vec<MessageView>>,
    /// Whether delete mode is on.
    pub delete_mode: bool,
    /// Message ids selected for deletion.
    pub selected: Vec<String>,
}

impl ClientSnapshot {
    /// Capture the App's view of one client.
    pub fn from_app(id: impl Into<String>, app: &App) -> Self {
        let user_id = match app.connection_state() {
            ConnectionState::Connected { user_id } => Some(user_id.clone()),
            _ => None,
        };

        Self {
            id: id.into(),
            user_id,
            rendered: app.transcript().entries().to_vec(),
            reconciled: None,
            delete_mode: app.delete_mode(),
            selected: app.selected().iter().cloned().collect(),
        }
    }

    /// Capture both the App and the protocol state behind it.
    pub fn capture(id: impl Into<String>, app: &App, bridge: &Bridge) -> Self {
        let mut snapshot = Self::from_app(id, app);
        snapshot.reconciled = Some(bridge.client().transcript().entries().to_vec());
        if let Some(session) = bridge.client().session() {
            snapshot.user_id = Some(session.self_user_id.clone());
        }
        snapshot
    }

    /// Confirmed entries, in transcript order.
    pub fn confirmed(&self) -> impl Iterator<Item = &MessageView> {
        self.rendered.iter().filter(|view| !view.pending && view.message_id.is_some())
    }
}
