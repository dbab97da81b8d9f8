//! Fuzz target for the client state machine
//!
//! Interleaves arbitrary inbound frames with sends and deletions.
//!
//! # Strategy
//!
//! - Raw text: arbitrary strings, mostly rejected by the decoder
//! - Echoes: well-formed Basic frames with fuzzed ids, connections and
//!   correlation tokens
//! - User intents: sends and deletions at any point, before or after
//!   Initialization
//!
//! # Invariants
//!
//! - NEVER panic; bad frames are errors
//! - Transcript local ids stay unique
//! - Durable message ids stay unique

#![no_main]

use std::collections::{HashMap, HashSet};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use murmur_client::{Client, ClientConfig, ClientEvent};
use murmur_proto::{BasicMessage, DeletionPayload, Envelope, InitializationPayload};

#[derive(Debug, Arbitrary)]
enum Step {
    Raw(String),
    Init { user: u8, ws: u8 },
    Echo { message_id: u8, sender: u8, ws: u8, correlation: Option<u8>, content: String },
    Deleted { message_id: u8, sender: u8 },
    Send(String),
    Delete(Vec<u8>),
}

fn frame(step: Step) -> Option<ClientEvent> {
    let envelope = match step {
        Step::Raw(text) => return Some(ClientEvent::FrameReceived(text)),
        Step::Send(content) => return Some(ClientEvent::SendMessage { content, timestamp: 0 }),
        Step::Delete(ids) => {
            return Some(ClientEvent::DeleteMessages {
                message_ids: ids.into_iter().map(|id| format!("m{id}")).collect(),
            });
        },
        Step::Init { user, ws } => Envelope::Initialization(InitializationPayload {
            user_id: format!("u{}", user % 4),
            ws_id: format!("ws{}", ws % 4),
            username: "me".to_string(),
            user_map: HashMap::from([
                (format!("u{}", user % 4), Some("me".to_string())),
                ("u9".to_string(), None),
            ]),
        }),
        Step::Echo { message_id, sender, ws, correlation, content } => Envelope::Basic(BasicMessage {
            content,
            sender_id: format!("u{}", sender % 4),
            message_id: format!("m{message_id}"),
            room_id: "general".to_string(),
            ws_id: format!("ws{}", ws % 4),
            timestamp: 0,
            correlation_id: correlation.map(|c| format!("ws{}:{c}", ws % 4)),
        }),
        Step::Deleted { message_id, sender } => Envelope::Deletion(DeletionPayload {
            sender_id: format!("u{}", sender % 4),
            message_id: format!("m{message_id}"),
        }),
    };
    envelope.encode().ok().map(ClientEvent::FrameReceived)
}

fuzz_target!(|steps: Vec<Step>| {
    let mut client = Client::new(ClientConfig::default());

    for step in steps {
        let Some(event) = frame(step) else {
            continue;
        };
        let _ = client.handle(event);

        let entries = client.transcript().entries();
        let locals: HashSet<_> = entries.iter().map(|e| e.local_id).collect();
        assert_eq!(locals.len(), entries.len(), "duplicate local id");

        let ids: Vec<_> = entries.iter().filter_map(|e| e.message_id.as_ref()).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len(), "duplicate message id");
    }
});
