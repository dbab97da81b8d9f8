//! Reconciler.
//!
//! Aligns optimistically rendered local state with the authoritative frames
//! delivered by the server.
//!
//! # Echo correlation
//!
//! Every local send is rendered immediately as a pending [`Direction::Sent`]
//! entry and goes out with an empty `message_id`, this connection's `ws_id`
//! and a correlation token `"{ws_id}:{seq}"`. The server redelivers the
//! message to every connection, including ours. An inbound Basic whose `ws_id`
//! is ours is an echo and is never rendered again. Instead it confirms a
//! pending entry:
//!
//! 1. the pending entry carrying the echoed correlation token, or
//! 2. if the server did not echo a token, the oldest pending entry.
//!
//! The second rule is only correct when echoes arrive in send order. Out of
//! order echoes without tokens can be attributed to the wrong entry, but each
//! pending entry is confirmed at most once and no durable id is ever attached
//! twice.
//!
//! # Rename propagation
//!
//! Renames are applied to the transcript before the directory is updated, so
//! the old display name is still resolvable. See [`RenameMatching`].

use murmur_proto::{BasicMessage, DeletionPayload};

use crate::{
    config::RenameMatching,
    directory::{DELETED_ACCOUNT, UserDirectory},
    session::Session,
    transcript::{Direction, LocalId, MessageView, Transcript, TranscriptOp},
};

/// Echo correlation, rename propagation and deletion application.
///
/// Every op returned by the reconciler has already been applied to its own
/// transcript; callers forward the ops to any mirror.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    transcript: Transcript,
    rename_matching: RenameMatching,
    next_correlation: u64,
}

impl Reconciler {
    /// Create a reconciler with an empty transcript.
    pub fn new(rename_matching: RenameMatching) -> Self {
        Self { transcript: Transcript::new(), rename_matching, next_correlation: 0 }
    }

    /// Rendered transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Render a local send optimistically.
    ///
    /// Returns the append op and the Basic payload to transmit.
    pub fn render_local(
        &mut self,
        session: &Session,
        content: String,
        timestamp: u64,
    ) -> (TranscriptOp, BasicMessage) {
        let correlation_id = format!("{}:{}", session.connection_id, self.next_correlation);
        self.next_correlation += 1;

        let label = if session.display_name.is_empty() {
            DELETED_ACCOUNT.to_string()
        } else {
            session.display_name.clone()
        };

        let view = MessageView {
            local_id: self.transcript.next_local_id(),
            message_id: None,
            correlation_id: Some(correlation_id.clone()),
            sender_id: session.self_user_id.clone(),
            room_id: session.current_room_id.clone(),
            author_label: label,
            content: content.clone(),
            timestamp,
            direction: Direction::Sent,
            pending: true,
        };

        let message = BasicMessage {
            content,
            sender_id: session.self_user_id.clone(),
            message_id: String::new(),
            room_id: session.current_room_id.clone(),
            ws_id: session.connection_id.clone(),
            timestamp,
            correlation_id: Some(correlation_id),
        };

        tracing::debug!(local_id = view.local_id, "rendered optimistic send");
        (self.commit(TranscriptOp::Append(view)), message)
    }

    /// Reconcile an inbound Basic message.
    pub fn reconcile_basic(
        &mut self,
        session: &Session,
        directory: &UserDirectory,
        message: BasicMessage,
    ) -> Vec<TranscriptOp> {
        if session.is_own_connection(&message.ws_id) {
            self.reconcile_echo(&message).into_iter().collect()
        } else {
            self.render_remote(session, directory, message).into_iter().collect()
        }
    }

    fn reconcile_echo(&mut self, echo: &BasicMessage) -> Option<TranscriptOp> {
        let Some(message_id) = echo.durable_id() else {
            tracing::warn!(ws_id = %echo.ws_id, "echo without message id, ignoring");
            return None;
        };

        if self.transcript.by_message_id(message_id).is_some() {
            tracing::debug!(%message_id, "duplicate echo, ignoring");
            return None;
        }

        let target = match echo.correlation_id.as_deref() {
            Some(token) => {
                let target = self.transcript.pending_with_correlation(token);
                if target.is_none() {
                    tracing::warn!(%message_id, %token, "echo with unknown correlation token");
                }
                target
            },
            None => {
                let target = self.transcript.oldest_pending();
                if target.is_none() {
                    tracing::warn!(%message_id, "echo with nothing pending");
                }
                target
            },
        }?;

        let local_id = target.local_id;
        tracing::debug!(local_id, %message_id, "echo confirmed pending send");

        Some(self.commit(TranscriptOp::AssignId { local_id, message_id: message_id.to_string() }))
    }

    fn render_remote(
        &mut self,
        session: &Session,
        directory: &UserDirectory,
        message: BasicMessage,
    ) -> Option<TranscriptOp> {
        if let Some(id) = message.durable_id()
            && self.transcript.by_message_id(id).is_some()
        {
            tracing::debug!(message_id = %id, "message already rendered, ignoring");
            return None;
        }

        let direction =
            if session.is_self(&message.sender_id) { Direction::Sent } else { Direction::Received };

        let view = MessageView {
            local_id: self.transcript.next_local_id(),
            message_id: message.durable_id().map(str::to_owned),
            correlation_id: None,
            author_label: directory.display_name(&message.sender_id).to_string(),
            sender_id: message.sender_id,
            room_id: message.room_id,
            content: message.content,
            timestamp: message.timestamp,
            direction,
            pending: false,
        };

        Some(self.commit(TranscriptOp::Append(view)))
    }

    /// Relabel rendered entries for a display name change.
    ///
    /// Must run before the directory applies the change.
    pub fn propagate_rename(
        &mut self,
        session: &Session,
        directory: &UserDirectory,
        sender_id: &str,
        new_name: &str,
    ) -> Vec<TranscriptOp> {
        let old_name = if session.is_self(sender_id) && !session.display_name.is_empty() {
            Some(session.display_name.as_str())
        } else {
            directory.name_of(sender_id)
        };

        if old_name == Some(new_name) {
            return Vec::new();
        }

        let local_ids = match (self.rename_matching, old_name) {
            (RenameMatching::Label, Some(old_name)) => self.transcript.labelled(old_name),
            // Unknown or deleted: matching the placeholder label would relabel
            // every deleted account's entries.
            (RenameMatching::Label, None) | (RenameMatching::Sender, _) => {
                self.transcript.authored_by(sender_id)
            },
        };

        if local_ids.is_empty() {
            return Vec::new();
        }

        let label = if new_name.is_empty() { DELETED_ACCOUNT } else { new_name };
        tracing::debug!(%sender_id, old = ?old_name, new = %label, entries = local_ids.len(), "relabelling");

        vec![self.commit(TranscriptOp::Relabel { local_ids, label: label.to_string() })]
    }

    /// Delete entries on user intent.
    ///
    /// Removes each rendered entry immediately and returns one Deletion
    /// request per removed entry. Ids that are not rendered are skipped.
    pub fn delete_local(
        &mut self,
        session: &Session,
        message_ids: &[String],
    ) -> (Vec<TranscriptOp>, Vec<DeletionPayload>) {
        let mut ops = Vec::new();
        let mut requests = Vec::new();

        for message_id in message_ids {
            let Some(local_id) = self.local_id_of(message_id) else {
                tracing::debug!(%message_id, "delete of unrendered message skipped");
                continue;
            };

            ops.push(self.commit(TranscriptOp::Remove { local_id }));
            requests.push(DeletionPayload {
                sender_id: session.self_user_id.clone(),
                message_id: message_id.clone(),
            });
        }

        (ops, requests)
    }

    /// Apply an inbound Deletion. Idempotent.
    pub fn apply_deletion(&mut self, message_id: &str) -> Vec<TranscriptOp> {
        match self.local_id_of(message_id) {
            Some(local_id) => vec![self.commit(TranscriptOp::Remove { local_id })],
            None => {
                tracing::debug!(%message_id, "deletion of absent message is a no-op");
                Vec::new()
            },
        }
    }

    fn local_id_of(&self, message_id: &str) -> Option<LocalId> {
        self.transcript.by_message_id(message_id).map(|v| v.local_id)
    }

    fn commit(&mut self, op: TranscriptOp) -> TranscriptOp {
        self.transcript.apply(&op);
        op
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            self_user_id: "u1".into(),
            connection_id: "c1".into(),
            display_name: "alice".into(),
            current_room_id: String::new(),
        }
    }

    fn directory() -> UserDirectory {
        let mut directory = UserDirectory::new();
        directory.insert_user("u1", "alice");
        directory.insert_user("u2", "bob");
        directory
    }

    fn echo(of: &BasicMessage, message_id: &str, with_token: bool) -> BasicMessage {
        BasicMessage {
            message_id: message_id.into(),
            correlation_id: if with_token { of.correlation_id.clone() } else { None },
            ..of.clone()
        }
    }

    fn remote(sender_id: &str, ws_id: &str, message_id: &str) -> BasicMessage {
        BasicMessage {
            content: "yo".into(),
            sender_id: sender_id.into(),
            message_id: message_id.into(),
            room_id: String::new(),
            ws_id: ws_id.into(),
            timestamp: 1,
            correlation_id: None,
        }
    }

    #[test]
    fn echo_assigns_id_without_duplicating() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();

        let (_, sent) = reconciler.render_local(&session, "hi".into(), 0);
        assert_eq!(reconciler.transcript().len(), 1);
        assert!(reconciler.transcript().entries()[0].pending);
        assert!(sent.message_id.is_empty());
        assert_eq!(sent.correlation_id.as_deref(), Some("c1:0"));

        let ops = reconciler.reconcile_basic(&session, &directory, echo(&sent, "m42", false));

        assert_eq!(ops, vec![TranscriptOp::AssignId { local_id: 0, message_id: "m42".into() }]);
        assert_eq!(reconciler.transcript().len(), 1);
        assert_eq!(reconciler.transcript().entries()[0].message_id.as_deref(), Some("m42"));
    }

    #[test]
    fn in_order_echoes_without_tokens_attach_in_send_order() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();

        let (_, first) = reconciler.render_local(&session, "one".into(), 0);
        let (_, second) = reconciler.render_local(&session, "two".into(), 1);

        reconciler.reconcile_basic(&session, &directory, echo(&first, "m1", false));
        reconciler.reconcile_basic(&session, &directory, echo(&second, "m2", false));

        let transcript = reconciler.transcript();
        assert_eq!(transcript.by_message_id("m1").unwrap().content, "one");
        assert_eq!(transcript.by_message_id("m2").unwrap().content, "two");
    }

    #[test]
    fn tokens_fix_out_of_order_echoes() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();

        let (_, first) = reconciler.render_local(&session, "one".into(), 0);
        let (_, second) = reconciler.render_local(&session, "two".into(), 1);

        reconciler.reconcile_basic(&session, &directory, echo(&second, "m2", true));
        reconciler.reconcile_basic(&session, &directory, echo(&first, "m1", true));

        let transcript = reconciler.transcript();
        assert_eq!(transcript.by_message_id("m1").unwrap().content, "one");
        assert_eq!(transcript.by_message_id("m2").unwrap().content, "two");
    }

    #[test]
    fn stray_echoes_are_ignored() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();

        let stray = remote("u1", "c1", "m9");
        assert!(reconciler.reconcile_basic(&session, &directory, stray).is_empty());

        let (_, sent) = reconciler.render_local(&session, "hi".into(), 0);
        let mut unknown = echo(&sent, "m1", true);
        unknown.correlation_id = Some("c1:99".into());
        assert!(reconciler.reconcile_basic(&session, &directory, unknown).is_empty());

        assert!(reconciler.reconcile_basic(&session, &directory, echo(&sent, "", false)).is_empty());
        assert!(reconciler.transcript().entries()[0].pending);
    }

    #[test]
    fn duplicate_echo_does_not_confirm_second_entry() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();

        let (_, first) = reconciler.render_local(&session, "one".into(), 0);
        reconciler.render_local(&session, "two".into(), 1);

        reconciler.reconcile_basic(&session, &directory, echo(&first, "m1", false));
        let ops = reconciler.reconcile_basic(&session, &directory, echo(&first, "m1", false));

        assert!(ops.is_empty());
        assert!(reconciler.transcript().entries()[1].pending);
    }

    #[test]
    fn remote_messages_render_with_directory_labels() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();

        reconciler.reconcile_basic(&session, &directory, remote("u2", "c2", "m1"));
        reconciler.reconcile_basic(&session, &directory, remote("u9", "c9", "m2"));
        reconciler.reconcile_basic(&session, &directory, remote("u1", "c7", "m3"));

        let entries = reconciler.transcript().entries();
        assert_eq!(entries[0].author_label, "bob");
        assert_eq!(entries[0].direction, Direction::Received);
        assert_eq!(entries[1].author_label, DELETED_ACCOUNT);
        // Same account on another connection: sent styling, separate entry.
        assert_eq!(entries[2].direction, Direction::Sent);
        assert_eq!(entries[2].author_label, "alice");
    }

    #[test]
    fn remote_duplicate_is_ignored() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();

        reconciler.reconcile_basic(&session, &directory, remote("u2", "c2", "m1"));
        let ops = reconciler.reconcile_basic(&session, &directory, remote("u2", "c2", "m1"));

        assert!(ops.is_empty());
        assert_eq!(reconciler.transcript().len(), 1);
    }

    #[test]
    fn label_rename_relabels_matching_entries() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_basic(&session, &directory, remote("u2", "c2", "m1"));
        reconciler.render_local(&session, "mine".into(), 0);

        let ops = reconciler.propagate_rename(&session, &directory, "u2", "robert");

        assert_eq!(ops, vec![TranscriptOp::Relabel { local_ids: vec![0], label: "robert".into() }]);
        assert_eq!(reconciler.transcript().entries()[1].author_label, "alice");
    }

    #[test]
    fn label_rename_conflates_shared_names() {
        let session = session();
        let mut directory = directory();
        directory.insert_user("u3", "bob");
        let mut reconciler = Reconciler::new(RenameMatching::Label);
        reconciler.reconcile_basic(&session, &directory, remote("u2", "c2", "m1"));
        reconciler.reconcile_basic(&session, &directory, remote("u3", "c3", "m2"));

        reconciler.propagate_rename(&session, &directory, "u2", "robert");

        assert_eq!(reconciler.transcript().labelled("robert"), vec![0, 1]);
    }

    #[test]
    fn sender_rename_keeps_shared_names_apart() {
        let session = session();
        let mut directory = directory();
        directory.insert_user("u3", "bob");
        let mut reconciler = Reconciler::new(RenameMatching::Sender);
        reconciler.reconcile_basic(&session, &directory, remote("u2", "c2", "m1"));
        reconciler.reconcile_basic(&session, &directory, remote("u3", "c3", "m2"));

        reconciler.propagate_rename(&session, &directory, "u2", "robert");

        assert_eq!(reconciler.transcript().labelled("robert"), vec![0]);
        assert_eq!(reconciler.transcript().labelled("bob"), vec![1]);
    }

    #[test]
    fn rename_of_unknown_sender_leaves_placeholders_alone() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_basic(&session, &directory, remote("u8", "c8", "m1"));
        reconciler.reconcile_basic(&session, &directory, remote("u9", "c9", "m2"));

        reconciler.propagate_rename(&session, &directory, "u9", "nine");

        let entries = reconciler.transcript().entries();
        assert_eq!(entries[0].author_label, DELETED_ACCOUNT);
        assert_eq!(entries[1].author_label, "nine");
    }

    #[test]
    fn rename_to_same_name_is_noop() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_basic(&session, &directory, remote("u2", "c2", "m1"));

        assert!(reconciler.propagate_rename(&session, &directory, "u2", "bob").is_empty());
    }

    #[test]
    fn local_delete_removes_and_requests() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();
        let (_, sent) = reconciler.render_local(&session, "hi".into(), 0);
        reconciler.reconcile_basic(&session, &directory, echo(&sent, "m1", true));

        let (ops, requests) =
            reconciler.delete_local(&session, &["m1".to_string(), "missing".to_string()]);

        assert_eq!(ops, vec![TranscriptOp::Remove { local_id: 0 }]);
        assert_eq!(requests, vec![DeletionPayload {
            sender_id: "u1".into(),
            message_id: "m1".into()
        }]);
        assert!(reconciler.transcript().is_empty());

        // Server confirmation afterwards is a no-op.
        assert!(reconciler.apply_deletion("m1").is_empty());
    }

    #[test]
    fn inbound_deletion_removes_entry() {
        let (session, directory) = (session(), directory());
        let mut reconciler = Reconciler::default();
        reconciler.reconcile_basic(&session, &directory, remote("u2", "c2", "m1"));

        assert_eq!(reconciler.apply_deletion("m1"), vec![TranscriptOp::Remove { local_id: 0 }]);
        assert!(reconciler.transcript().is_empty());
    }
}
