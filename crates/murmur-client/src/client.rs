//! Client state machine.
//!
//! The `Client` owns the session context: identity, user directory and the
//! reconciled transcript. It is constructed empty and becomes live on the
//! first Initialization frame.

use murmur_proto::Envelope;

use crate::{
    config::ClientConfig,
    directory::UserDirectory,
    error::ClientError,
    event::{ClientAction, ClientEvent},
    reconciler::Reconciler,
    session::Session,
    transcript::{Transcript, TranscriptOp},
};

/// Client for the Murmur chat protocol.
#[derive(Debug, Clone)]
pub struct Client {
    /// Configuration.
    pub(crate) config: ClientConfig,

    /// Session identity. `None` until Initialization.
    pub(crate) session: Option<Session>,

    /// Account id to display name mapping.
    pub(crate) directory: UserDirectory,

    /// Echo correlation and transcript.
    pub(crate) reconciler: Reconciler,
}

impl Client {
    /// Create a client with no session.
    pub fn new(config: ClientConfig) -> Self {
        let reconciler = Reconciler::new(config.rename_matching);
        Self { config, session: None, directory: UserDirectory::new(), reconciler }
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current session. `None` before Initialization.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// User directory.
    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Rendered transcript.
    pub fn transcript(&self) -> &Transcript {
        self.reconciler.transcript()
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::FrameReceived(text) => self.handle_frame(&text),
            ClientEvent::SendMessage { content, timestamp } => {
                self.handle_send_message(&content, timestamp)
            },
            ClientEvent::DeleteMessages { message_ids } => {
                self.handle_delete_messages(&message_ids)
            },
        }
    }

    fn handle_send_message(
        &mut self,
        content: &str,
        timestamp: u64,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let session =
            self.session.as_ref().ok_or(ClientError::NotInitialized { operation: "send" })?;

        let (op, message) = self.reconciler.render_local(session, content.to_string(), timestamp);

        Ok(vec![ClientAction::Transcript(op), ClientAction::Send(Envelope::Basic(message))])
    }

    fn handle_delete_messages(
        &mut self,
        message_ids: &[String],
    ) -> Result<Vec<ClientAction>, ClientError> {
        let session =
            self.session.as_ref().ok_or(ClientError::NotInitialized { operation: "delete" })?;

        let (ops, requests) = self.reconciler.delete_local(session, message_ids);
        tracing::info!(requested = message_ids.len(), removed = ops.len(), "deleting messages");

        let mut actions = transcript_actions(ops);
        actions.extend(requests.into_iter().map(|r| ClientAction::Send(Envelope::Deletion(r))));
        Ok(actions)
    }
}

/// Wrap transcript ops as actions.
pub(crate) fn transcript_actions(ops: Vec<TranscriptOp>) -> Vec<ClientAction> {
    ops.into_iter().map(ClientAction::Transcript).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const INIT: &str = r#"{"Initialization":{"user_id":"u1","ws_id":"c1","username":"alice",
        "user_map":{"u1":"alice","u2":"bob"}}}"#;

    fn live_client() -> Client {
        let mut client = Client::new(ClientConfig::default());
        client.handle(ClientEvent::FrameReceived(INIT.to_string())).unwrap();
        client
    }

    #[test]
    fn send_before_initialization_fails() {
        let mut client = Client::new(ClientConfig::default());
        let result = client.handle(ClientEvent::SendMessage { content: "hi".into(), timestamp: 0 });

        assert_eq!(result, Err(ClientError::NotInitialized { operation: "send" }));
    }

    #[test]
    fn blank_message_is_rejected() {
        let mut client = live_client();
        let result =
            client.handle(ClientEvent::SendMessage { content: " \n\t ".into(), timestamp: 0 });

        assert_eq!(result, Err(ClientError::EmptyMessage));
        assert!(client.transcript().is_empty());
    }

    #[test]
    fn send_renders_then_transmits_trimmed_content() {
        let mut client = live_client();
        let actions = client
            .handle(ClientEvent::SendMessage { content: "  hi  ".into(), timestamp: 7 })
            .unwrap();

        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], ClientAction::Transcript(TranscriptOp::Append(v)) if v.pending));
        let ClientAction::Send(Envelope::Basic(message)) = &actions[1] else {
            unreachable!("expected Basic send, got {:?}", actions[1]);
        };
        assert_eq!(message.content, "hi");
        assert_eq!(message.ws_id, "c1");
        assert_eq!(message.timestamp, 7);
        assert!(message.message_id.is_empty());
    }

    #[test]
    fn delete_emits_one_request_per_removed_entry() {
        let mut client = live_client();
        let frame = r#"{"Basic":{"content":"x","sender_id":"u2","message_id":"m1",
            "room_id":"","ws_id":"c2","timestamp":1}}"#;
        client.handle(ClientEvent::FrameReceived(frame.to_string())).unwrap();

        let actions = client
            .handle(ClientEvent::DeleteMessages { message_ids: vec!["m1".into(), "m1".into()] })
            .unwrap();

        let sends = actions.iter().filter(|a| matches!(a, ClientAction::Send(_))).count();
        assert_eq!(sends, 1);
        assert!(client.transcript().is_empty());
    }
}
