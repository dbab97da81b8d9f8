//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use murmur_client::{Direction, MessageView};

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// The rendered transcript must equal the reconciled transcript.
///
/// The App mirrors the reconciler by applying the same ops in the same
/// order. Any divergence means an op was dropped or applied twice.
pub struct MirrorMatchesClient;

impl Invariant for MirrorMatchesClient {
    fn name(&self) -> &'static str {
        "mirror_matches_client"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(reconciled) = &client.reconciled else {
                continue;
            };
            if &client.rendered != reconciled {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: rendered {} entries, reconciled {}",
                        client.id,
                        client.rendered.len(),
                        reconciled.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// No durable message id appears twice in one transcript.
pub struct UniqueMessageIds;

impl Invariant for UniqueMessageIds {
    fn name(&self) -> &'static str {
        "unique_message_ids"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let mut seen = HashSet::new();
            for id in client.rendered.iter().filter_map(|view| view.message_id.as_deref()) {
                if !seen.insert(id) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("client {}: message {id} rendered twice", client.id),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Every entry carries a visible author label.
pub struct NonBlankLabels;

impl Invariant for NonBlankLabels {
    fn name(&self) -> &'static str {
        "non_blank_labels"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if let Some(view) = client.rendered.iter().find(|v| v.author_label.trim().is_empty()) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: entry {} has a blank author label",
                        client.id, view.local_id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Only local sends may be pending, and pending entries have no durable id.
pub struct PendingOnlySent;

impl Invariant for PendingOnlySent {
    fn name(&self) -> &'static str {
        "pending_only_sent"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let bad = client.rendered.iter().find(|view| {
                view.pending && (view.direction != Direction::Sent || view.message_id.is_some())
            });
            if let Some(view) = bad {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: entry {} is pending with direction {:?} and id {:?}",
                        client.id, view.local_id, view.direction, view.message_id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Delete mode only ever selects our own confirmed messages, and nothing is
/// selected outside delete mode.
pub struct SelectionIsOwnConfirmed;

impl Invariant for SelectionIsOwnConfirmed {
    fn name(&self) -> &'static str {
        "selection_is_own_confirmed"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if !client.delete_mode && !client.selected.is_empty() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: {} selected outside delete mode",
                        client.id,
                        client.selected.len()
                    ),
                });
            }

            for id in &client.selected {
                let own = client
                    .rendered
                    .iter()
                    .find(|view| view.message_id.as_deref() == Some(id.as_str()))
                    .is_some_and(MessageView::is_confirmed_own);
                if !own {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "client {}: selected {id} is not an own confirmed message",
                            client.id
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Clients agree on the author and content of every confirmed message they
/// both hold.
pub struct ConfirmedMessagesAgree;

impl Invariant for ConfirmedMessagesAgree {
    fn name(&self) -> &'static str {
        "confirmed_messages_agree"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut first_seen: HashMap<&str, (&str, &MessageView)> = HashMap::new();

        for client in &state.clients {
            for view in client.confirmed() {
                let Some(id) = view.message_id.as_deref() else {
                    continue;
                };
                let (other, earlier) = match first_seen.entry(id) {
                    Entry::Vacant(slot) => {
                        slot.insert((&client.id, view));
                        continue;
                    },
                    Entry::Occupied(slot) => *slot.get(),
                };
                if earlier.sender_id != view.sender_id || earlier.content != view.content {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "message {id}: client {other} has ({}, {:?}), client {} has ({}, {:?})",
                            earlier.sender_id, earlier.content, client.id, view.sender_id, view.content
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::ClientSnapshot;

    fn view(local_id: u64, message_id: Option<&str>, pending: bool) -> MessageView {
        MessageView {
            local_id,
            message_id: message_id.map(str::to_string),
            correlation_id: None,
            sender_id: "u1".to_string(),
            room_id: String::new(),
            author_label: "alice".to_string(),
            content: "hi".to_string(),
            timestamp: 0,
            direction: Direction::Sent,
            pending,
        }
    }

    fn client(rendered: Vec<MessageView>) -> ClientSnapshot {
        ClientSnapshot { id: "a".to_string(), rendered, ..Default::default() }
    }

    #[test]
    fn duplicate_ids_are_flagged() {
        let snapshot = SystemSnapshot::single(client(vec![
            view(0, Some("m1"), false),
            view(1, Some("m1"), false),
        ]));
        assert!(UniqueMessageIds.check(&snapshot).is_err());
    }

    #[test]
    fn received_pending_entry_is_flagged() {
        let mut entry = view(0, None, true);
        entry.direction = Direction::Received;
        let snapshot = SystemSnapshot::single(client(vec![entry]));
        assert!(PendingOnlySent.check(&snapshot).is_err());
    }

    #[test]
    fn blank_label_is_flagged() {
        let mut entry = view(0, Some("m1"), false);
        entry.author_label = " ".to_string();
        let snapshot = SystemSnapshot::single(client(vec![entry]));
        assert!(NonBlankLabels.check(&snapshot).is_err());
    }

    #[test]
    fn mirror_divergence_is_flagged() {
        let mut snapshot = client(vec![view(0, Some("m1"), false)]);
        snapshot.reconciled = Some(vec![]);
        assert!(MirrorMatchesClient.check(&SystemSnapshot::single(snapshot)).is_err());
    }

    #[test]
    fn selecting_a_pending_message_is_flagged() {
        let mut snapshot = client(vec![view(0, None, true)]);
        snapshot.delete_mode = true;
        snapshot.selected = vec!["m9".to_string()];
        assert!(SelectionIsOwnConfirmed.check(&SystemSnapshot::single(snapshot)).is_err());
    }

    #[test]
    fn disagreeing_clients_are_flagged() {
        let a = client(vec![view(0, Some("m1"), false)]);
        let mut other = view(0, Some("m1"), false);
        other.content = "edited".to_string();
        let mut b = client(vec![other]);
        b.id = "b".to_string();

        let snapshot = SystemSnapshot::from_clients(vec![a, b]);
        assert!(ConfirmedMessagesAgree.check(&snapshot).is_err());
    }
}
