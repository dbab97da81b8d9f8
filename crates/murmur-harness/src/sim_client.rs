//! Synchronous simulated client.
//!
//! [`SimClient`] wires an [`App`] and a [`Bridge`] to a [`SimServer`] without
//! a runtime, so tests can interleave delivery between several clients one
//! frame at a time. Action handling follows [`murmur_app::Runtime`].

use murmur_app::{App, AppAction, AppEvent, Bridge, Inbound, KeyInput, RequestOutcome};
use murmur_client::{ClientConfig, ConnectionConfig};
use murmur_proto::http::UploadRequest;

use crate::{invariants::ClientSnapshot, sim_driver::SIM_EPOCH_MILLIS, sim_server::SimServer};

/// App and Bridge for one simulated user.
pub struct SimClient {
    user_id: String,
    app: App,
    bridge: Bridge,
    ws_id: Option<String>,
    clock: u64,
}

impl SimClient {
    /// Create a disconnected client for `user_id`.
    pub fn new(user_id: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            user_id: user_id.into(),
            app: App::default(),
            bridge: Bridge::new(config, ConnectionConfig::default()),
            ws_id: None,
            clock: SIM_EPOCH_MILLIS,
        }
    }

    /// Discover, connect and open. Returns `false` if the server rejects the
    /// account.
    pub fn connect(&mut self, server: &mut SimServer) -> bool {
        for event in self.bridge.begin_discovery() {
            self.app.handle(event);
        }
        if let Err(e) = self.bridge.endpoint_resolved(server.ip()) {
            self.app.handle(AppEvent::Error { message: e.to_string() });
            return false;
        }
        let Some(ws_id) = server.connect(&self.user_id) else {
            return false;
        };
        self.ws_id = Some(ws_id);
        for event in self.bridge.connection_opened() {
            self.app.handle(event);
        }
        true
    }

    /// Execute app actions against the server.
    ///
    /// Returns the outcome of every HTTP request made along the way.
    pub fn perform(&mut self, server: &mut SimServer, actions: Vec<AppAction>) -> Vec<RequestOutcome> {
        let mut outcomes = Vec::new();
        let mut pending = actions;

        while !pending.is_empty() {
            for action in std::mem::take(&mut pending) {
                match action {
                    AppAction::SendMessage { .. } | AppAction::DeleteMessages { .. } => {
                        self.clock += 1;
                        for event in self.bridge.process_app_action(action, self.clock) {
                            pending.extend(self.app.handle(event));
                        }
                        self.flush(server);
                    },
                    AppAction::ChangeUsername { new_username } => {
                        let outcome = match self.bridge.username_change_request(&new_username) {
                            Some(request) => server.change_username(&request),
                            None => RequestOutcome::Failed { reason: "no session".to_string() },
                        };
                        outcomes.push(outcome.clone());
                        pending.extend(self.app.handle(AppEvent::UsernameChangeFinished(outcome)));
                    },
                    AppAction::Upload { filename, bytes } => {
                        let outcome = server.upload(&UploadRequest::from_bytes(filename, &bytes));
                        outcomes.push(outcome.clone());
                        pending.extend(self.app.handle(AppEvent::UploadFinished(outcome)));
                    },
                    AppAction::Render | AppAction::Quit | AppAction::Navigate(_) => {},
                }
            }
        }

        outcomes
    }

    /// Type `text` into the composer and press Enter.
    pub fn compose(&mut self, server: &mut SimServer, text: &str) {
        for c in text.chars() {
            self.app.handle(AppEvent::Key(KeyInput::Char(c)));
        }
        let actions = self.app.handle(AppEvent::Key(KeyInput::Enter));
        self.perform(server, actions);
    }

    /// Deliver one queued inbound item. Returns `false` if nothing was
    /// queued.
    pub fn deliver_one(&mut self, server: &mut SimServer) -> bool {
        let Some(ws_id) = self.ws_id.as_deref() else {
            return false;
        };
        let Some(inbound) = server.recv(ws_id) else {
            return false;
        };

        let events = match inbound {
            Inbound::Text(text) => self.bridge.handle_text(&text),
            Inbound::Closed { clean } => self.bridge.connection_closed(clean),
        };
        self.flush(server);
        for event in events {
            let actions = self.app.handle(event);
            self.perform(server, actions);
        }
        true
    }

    /// Deliver everything queued for this client.
    pub fn deliver_all(&mut self, server: &mut SimServer) {
        while self.deliver_one(server) {}
    }

    /// Account id.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Connection id, once connected.
    pub fn ws_id(&self) -> Option<&str> {
        self.ws_id.as_deref()
    }

    /// The App.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Mutable App, for driving UI operations directly.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// The Bridge.
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Capture App and protocol state for invariant checks.
    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot::capture(&self.user_id, &self.app, &self.bridge)
    }

    fn flush(&mut self, server: &mut SimServer) {
        let Some(ws_id) = self.ws_id.as_deref() else {
            self.bridge.take_outgoing();
            return;
        };
        for text in self.bridge.take_outgoing() {
            server.handle_text(ws_id, &text);
        }
    }
}
