//! In-process chat server for simulation.
//!
//! Models the observable behaviour of the real server: one Initialization
//! snapshot per connection, message ids assigned in arrival order, every
//! broadcast delivered to every open connection (the sender included), and
//! the HTTP username change and upload endpoints.
//!
//! Delivery can be held and released in a seeded random order to exercise
//! echo reconciliation under reordering.

use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
};

use murmur_app::{Inbound, RequestOutcome};
use murmur_proto::{
    BasicMessage, DeletionPayload, Envelope, InitializationPayload, NewUserPayload,
    UsernameChangePayload,
    http::{UploadRequest, UsernameChangeRequest},
};
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

/// Simulated server configuration.
#[derive(Debug, Clone)]
pub struct SimServerConfig {
    /// Address returned by endpoint discovery.
    pub ip: String,
    /// Echo `correlation_id` back on Basic messages. Disable to model a
    /// server that drops unknown fields.
    pub echo_correlation: bool,
    /// Seed for delivery reordering.
    pub seed: u64,
}

impl Default for SimServerConfig {
    fn default() -> Self {
        Self { ip: "127.0.0.1".to_string(), echo_correlation: true, seed: 0 }
    }
}

#[derive(Debug)]
struct SimConnection {
    user_id: String,
    inbox: VecDeque<Inbound>,
    open: bool,
}

/// In-process chat server.
#[derive(Debug)]
pub struct SimServer {
    config: SimServerConfig,
    /// Account directory. `None` marks a deleted account.
    users: BTreeMap<String, Option<String>>,
    connections: BTreeMap<String, SimConnection>,
    /// Message id to author.
    owners: HashMap<String, String>,
    next_message: u64,
    next_ws: u64,
    /// Deliveries waiting for [`SimServer::release_held`].
    held: Option<Vec<(String, String)>>,
    rng: ChaCha8Rng,
    uploads: Vec<(String, Vec<u8>)>,
}

impl SimServer {
    /// Create an empty server.
    pub fn new(config: SimServerConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            users: BTreeMap::new(),
            connections: BTreeMap::new(),
            owners: HashMap::new(),
            next_message: 1,
            next_ws: 1,
            held: None,
            rng,
            uploads: Vec::new(),
        }
    }

    /// Address returned by endpoint discovery.
    pub fn ip(&self) -> &str {
        &self.config.ip
    }

    /// Register an account and announce it to every open connection.
    pub fn add_user(&mut self, user_id: impl Into<String>, username: impl Into<String>) {
        let user_id = user_id.into();
        let username = username.into();
        self.users.insert(user_id.clone(), Some(username.clone()));
        self.broadcast(&Envelope::NewUser(NewUserPayload { user_id, username }));
    }

    /// Mark an account deleted. Later snapshots carry `None` for it.
    pub fn delete_account(&mut self, user_id: &str) {
        if let Some(name) = self.users.get_mut(user_id) {
            *name = None;
        }
    }

    /// Current name of an account.
    pub fn username(&self, user_id: &str) -> Option<&str> {
        self.users.get(user_id).and_then(Option::as_deref)
    }

    /// Open a connection for `user_id` and queue its Initialization.
    ///
    /// Returns the connection id, or `None` if the account is unknown.
    pub fn connect(&mut self, user_id: &str) -> Option<String> {
        let username = self.users.get(user_id)?.clone().unwrap_or_default();

        let ws_id = format!("ws{}", self.next_ws);
        self.next_ws += 1;

        let init = Envelope::Initialization(InitializationPayload {
            user_id: user_id.to_string(),
            ws_id: ws_id.clone(),
            username,
            user_map: self.users.iter().map(|(id, name)| (id.clone(), name.clone())).collect(),
        });

        let mut inbox = VecDeque::new();
        match init.encode() {
            Ok(text) => inbox.push_back(Inbound::Text(text)),
            Err(e) => tracing::error!(error = %e, "failed to encode initialization"),
        }

        self.connections
            .insert(ws_id.clone(), SimConnection { user_id: user_id.to_string(), inbox, open: true });
        tracing::debug!(%ws_id, user_id, "connection opened");

        Some(ws_id)
    }

    /// Close a connection, queueing the close notification.
    pub fn close(&mut self, ws_id: &str, clean: bool) {
        if let Some(conn) = self.connections.get_mut(ws_id)
            && conn.open
        {
            conn.open = false;
            conn.inbox.push_back(Inbound::Closed { clean });
        }
    }

    /// Queue a raw text frame on one connection.
    pub fn inject(&mut self, ws_id: &str, text: impl Into<String>) {
        if let Some(conn) = self.connections.get_mut(ws_id) {
            conn.inbox.push_back(Inbound::Text(text.into()));
        }
    }

    /// Next inbound item for a connection.
    pub fn recv(&mut self, ws_id: &str) -> Option<Inbound> {
        self.connections.get_mut(ws_id)?.inbox.pop_front()
    }

    /// Number of queued inbound items for a connection.
    pub fn queued(&self, ws_id: &str) -> usize {
        self.connections.get(ws_id).map_or(0, |conn| conn.inbox.len())
    }

    /// Process a text frame sent by a client.
    pub fn handle_text(&mut self, ws_id: &str, text: &str) {
        let Some(conn) = self.connections.get(ws_id) else {
            tracing::warn!(ws_id, "frame from unknown connection");
            return;
        };
        if !conn.open {
            tracing::warn!(ws_id, "frame on closed connection");
            return;
        }
        let author = conn.user_id.clone();

        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(ws_id, error = %e, "dropping undecodable frame");
                return;
            },
        };

        match envelope {
            Envelope::Basic(message) => self.accept_message(message),
            Envelope::Deletion(deletion) => self.accept_deletion(&author, deletion),
            other => self.broadcast(&other),
        }
    }

    /// Username change endpoint.
    pub fn change_username(&mut self, request: &UsernameChangeRequest) -> RequestOutcome {
        let UsernameChangePayload { new_username, sender_id } = &request.change;
        let new_username = new_username.trim();

        if new_username.is_empty() {
            return RequestOutcome::Failed { reason: "username cannot be empty".to_string() };
        }
        if !self.users.contains_key(sender_id) {
            return RequestOutcome::Failed { reason: "unknown user".to_string() };
        }
        let taken = self
            .users
            .iter()
            .any(|(id, name)| id != sender_id && name.as_deref() == Some(new_username));
        if taken {
            return RequestOutcome::Failed { reason: "username already taken".to_string() };
        }

        self.users.insert(sender_id.clone(), Some(new_username.to_string()));
        self.broadcast(&Envelope::UsernameChange(UsernameChangePayload {
            new_username: new_username.to_string(),
            sender_id: sender_id.clone(),
        }));
        RequestOutcome::Succeeded
    }

    /// Upload endpoint.
    pub fn upload(&mut self, request: &UploadRequest) -> RequestOutcome {
        match request.decode_data() {
            Ok(bytes) => {
                self.uploads.push((request.filename.clone(), bytes));
                RequestOutcome::Succeeded
            },
            Err(e) => RequestOutcome::Failed { reason: e.to_string() },
        }
    }

    /// Files received by the upload endpoint.
    pub fn uploads(&self) -> &[(String, Vec<u8>)] {
        &self.uploads
    }

    /// Ids of messages that exist and have not been deleted.
    pub fn live_message_ids(&self) -> HashSet<String> {
        self.owners.keys().cloned().collect()
    }

    /// Hold every broadcast until [`SimServer::release_held`].
    pub fn hold_deliveries(&mut self) {
        self.held.get_or_insert_with(Vec::new);
    }

    /// Deliver held broadcasts in a seeded random order and stop holding.
    pub fn release_held(&mut self) {
        let Some(mut held) = self.held.take() else {
            return;
        };
        held.shuffle(&mut self.rng);
        for (ws_id, text) in held {
            self.inject(&ws_id, text);
        }
    }

    fn accept_message(&mut self, mut message: BasicMessage) {
        if message.durable_id().is_none() {
            message.message_id = format!("m{}", self.next_message);
            self.next_message += 1;
        }
        if !self.config.echo_correlation {
            message.correlation_id = None;
        }
        self.owners.insert(message.message_id.clone(), message.sender_id.clone());
        self.broadcast(&Envelope::Basic(message));
    }

    fn accept_deletion(&mut self, author: &str, deletion: DeletionPayload) {
        let owned = self.owners.get(&deletion.message_id).is_some_and(|owner| owner == author);
        if !owned || deletion.sender_id != author {
            tracing::warn!(
                message_id = %deletion.message_id,
                author,
                "rejecting deletion of a message the sender does not own"
            );
            return;
        }
        self.owners.remove(&deletion.message_id);
        self.broadcast(&Envelope::Deletion(deletion));
    }

    fn broadcast(&mut self, envelope: &Envelope) {
        let text = match envelope.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode broadcast");
                return;
            },
        };

        for (ws_id, conn) in &mut self.connections {
            if !conn.open {
                continue;
            }
            match &mut self.held {
                Some(held) => held.push((ws_id.clone(), text.clone())),
                None => conn.inbox.push_back(Inbound::Text(text.clone())),
            }
        }
    }
}

impl Default for SimServer {
    fn default() -> Self {
        Self::new(SimServerConfig::default())
    }
}

/// A server handle shared between simulated clients and the test body.
pub type SharedSimServer = Arc<Mutex<SimServer>>;

/// Create a shared server for testing.
pub fn create_shared_server(config: SimServerConfig) -> SharedSimServer {
    Arc::new(Mutex::new(SimServer::new(config)))
}
