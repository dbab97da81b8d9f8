//! Protocol-to-Application translation layer.
//!
//! The [`Bridge`] wraps the sans-IO [`murmur_client::Client`] and
//! [`murmur_client::Connection`] and adapts them to the application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts [`crate::AppAction`]s into client events.
//! - Runs every outbound envelope through the connection send guard and
//!   accumulates the encoded text frames for the driver's next I/O cycle.
//! - Converts client actions back into [`crate::AppEvent`]s for the UI.
//! - Absorbs protocol-level errors (logged, never shown) and surfaces the
//!   rest as error events.

use murmur_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, CloseOutcome, Connection,
    ConnectionConfig,
};
use murmur_proto::http::UsernameChangeRequest;

use crate::{AppAction, AppEvent};

/// Bridge between App and Client protocol logic.
#[derive(Debug, Clone)]
pub struct Bridge {
    client: Client,
    connection: Connection,
    outgoing: Vec<String>,
}

impl Bridge {
    /// Create a new Bridge.
    pub fn new(client_config: ClientConfig, connection_config: ConnectionConfig) -> Self {
        Self {
            client: Client::new(client_config),
            connection: Connection::new(connection_config),
            outgoing: Vec::new(),
        }
    }

    /// Underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Underlying connection state machine.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Process an App action and return resulting App events.
    ///
    /// `timestamp` is the wall clock in milliseconds, stamped on outbound
    /// messages.
    pub fn process_app_action(&mut self, action: AppAction, timestamp: u64) -> Vec<AppEvent> {
        match action {
            AppAction::SendMessage { content } => {
                let result = self.client.handle(ClientEvent::SendMessage { content, timestamp });
                self.handle_client_result(result)
            },
            AppAction::DeleteMessages { message_ids } => {
                let result = self.client.handle(ClientEvent::DeleteMessages { message_ids });
                self.handle_client_result(result)
            },
            AppAction::ChangeUsername { .. }
            | AppAction::Upload { .. }
            | AppAction::Render
            | AppAction::Quit
            | AppAction::Navigate(_) => vec![],
        }
    }

    /// Handle a text frame from the server.
    pub fn handle_text(&mut self, text: &str) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::FrameReceived(text.to_string()));
        self.handle_client_result(result)
    }

    /// Start endpoint discovery.
    pub fn begin_discovery(&mut self) -> Vec<AppEvent> {
        match self.connection.begin_discovery() {
            Ok(()) => vec![AppEvent::Connecting],
            Err(e) => vec![AppEvent::Error { message: e.to_string() }],
        }
    }

    /// Discovery returned `ip`. Returns the URL to open.
    pub fn endpoint_resolved(&mut self, ip: &str) -> Result<String, ClientError> {
        self.connection.endpoint_resolved(ip)
    }

    /// The socket opened.
    pub fn connection_opened(&mut self) -> Vec<AppEvent> {
        match self.connection.opened() {
            Ok(()) => vec![AppEvent::Connected],
            Err(e) => vec![AppEvent::Error { message: e.to_string() }],
        }
    }

    /// The socket closed.
    pub fn connection_closed(&mut self, clean: bool) -> Vec<AppEvent> {
        match self.connection.closed(clean) {
            Some(CloseOutcome::SessionEnded) => vec![AppEvent::ConnectionClosed { clean: true }],
            Some(CloseOutcome::ForcedLogout) => vec![AppEvent::ConnectionClosed { clean: false }],
            None => vec![],
        }
    }

    /// Body for a username change request. `None` before Initialization.
    pub fn username_change_request(&self, new_username: &str) -> Option<UsernameChangeRequest> {
        self.client
            .session()
            .map(|session| UsernameChangeRequest::new(session.self_user_id.clone(), new_username))
    }

    /// Take pending outgoing text frames.
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    fn handle_client_result(
        &mut self,
        result: Result<Vec<ClientAction>, ClientError>,
    ) -> Vec<AppEvent> {
        match result {
            Ok(actions) => self.process_client_actions(actions),
            Err(e) if e.is_absorbed() => {
                tracing::warn!(error = %e, "dropped");
                vec![]
            },
            Err(e) => vec![AppEvent::Error { message: e.to_string() }],
        }
    }

    fn process_client_actions(&mut self, actions: Vec<ClientAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                ClientAction::Send(envelope) => match self.connection.send(&envelope) {
                    Ok(text) => self.outgoing.push(text),
                    Err(e) if e.is_absorbed() => {
                        tracing::warn!(variant = %envelope.kind(), error = %e, "send dropped");
                    },
                    Err(e) => events.push(AppEvent::Error { message: e.to_string() }),
                },
                ClientAction::Transcript(op) => events.push(AppEvent::Transcript(op)),
                ClientAction::SessionStarted { user_id, display_name } => {
                    events.push(AppEvent::SessionStarted { user_id, display_name });
                },
                ClientAction::DisplayNameChanged { display_name } => {
                    events.push(AppEvent::DisplayNameChanged { display_name });
                },
            }
        }

        events
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(ClientConfig::default(), ConnectionConfig::default())
    }
}
