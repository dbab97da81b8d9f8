//! Frame dispatch.
//!
//! Routes each decoded [`Envelope`] to exactly one handler. Only
//! Initialization, Basic, NewUser, UsernameChange and Deletion carry
//! behaviour; the other variants are accepted and traced so the protocol
//! surface stays complete.

use murmur_proto::{
    BasicMessage, DeletionPayload, Envelope, InitializationPayload, UsernameChangePayload,
};

use crate::{
    client::{Client, transcript_actions},
    error::ClientError,
    event::ClientAction,
    session::Session,
};

impl Client {
    /// Decode and dispatch one inbound text frame.
    pub(crate) fn handle_frame(&mut self, text: &str) -> Result<Vec<ClientAction>, ClientError> {
        let envelope = Envelope::decode(text).map_err(ClientError::UnknownMessageType)?;
        self.dispatch(envelope)
    }

    /// Dispatch a decoded envelope.
    ///
    /// Frames other than Initialization are rejected with
    /// [`ClientError::NoSession`] until a session exists.
    pub fn dispatch(&mut self, envelope: Envelope) -> Result<Vec<ClientAction>, ClientError> {
        let kind = envelope.kind();

        let actions = match envelope {
            Envelope::Initialization(init) => self.handle_initialization(init),
            _ if self.session.is_none() => return Err(ClientError::NoSession { variant: kind }),
            Envelope::Basic(message) => self.handle_basic(message),
            Envelope::NewUser(user) => {
                tracing::debug!(user_id = %user.user_id, "new user");
                self.directory.insert_user(user.user_id, user.username);
                Vec::new()
            },
            Envelope::UsernameChange(change) => self.handle_username_change(change),
            Envelope::Deletion(deletion) => self.handle_deletion(&deletion),
            Envelope::Image(_)
            | Envelope::Notification(_)
            | Envelope::Typing(_)
            | Envelope::UserAddition(_)
            | Envelope::UserRemoval(_)
            | Envelope::ChangeRoom(_)
            | Envelope::CreateRoomChange(_) => {
                tracing::debug!(variant = %kind, "inert frame");
                Vec::new()
            },
        };

        Ok(actions)
    }

    fn handle_initialization(&mut self, init: InitializationPayload) -> Vec<ClientAction> {
        let session = Session::from_initialization(&init);
        tracing::info!(
            user_id = %session.self_user_id,
            ws_id = %session.connection_id,
            users = init.user_map.len(),
            "session initialized"
        );

        self.directory.replace_from_snapshot(init.user_map);

        let action = ClientAction::SessionStarted {
            user_id: session.self_user_id.clone(),
            display_name: session.display_name.clone(),
        };
        self.session = Some(session);
        vec![action]
    }

    fn handle_basic(&mut self, message: BasicMessage) -> Vec<ClientAction> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        transcript_actions(self.reconciler.reconcile_basic(session, &self.directory, message))
    }

    fn handle_username_change(&mut self, change: UsernameChangePayload) -> Vec<ClientAction> {
        let UsernameChangePayload { new_username, sender_id } = change;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let is_self = session.is_self(&sender_id);
        let unchanged = self.directory.name_of(&sender_id) == Some(new_username.as_str())
            && (!is_self || session.display_name == new_username);
        if unchanged {
            tracing::debug!(%sender_id, "rename to current name ignored");
            return Vec::new();
        }

        // Relabel first: the old name must still resolve.
        let ops =
            self.reconciler.propagate_rename(session, &self.directory, &sender_id, &new_username);
        self.directory.rename(&sender_id, new_username.clone());

        let mut actions = transcript_actions(ops);
        if is_self {
            tracing::info!(display_name = %new_username, "own display name changed");
            session.display_name.clone_from(&new_username);
            actions.push(ClientAction::DisplayNameChanged { display_name: new_username });
        }
        actions
    }

    fn handle_deletion(&mut self, deletion: &DeletionPayload) -> Vec<ClientAction> {
        tracing::debug!(sender_id = %deletion.sender_id, message_id = %deletion.message_id, "deletion");
        transcript_actions(self.reconciler.apply_deletion(&deletion.message_id))
    }
}
