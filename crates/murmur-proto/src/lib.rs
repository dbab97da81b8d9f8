//! Murmur wire protocol.
//!
//! Every frame exchanged over the persistent connection is a UTF-8 JSON text
//! object with exactly one top-level key naming the variant, whose value is
//! the variant payload:
//!
//! ```text
//! {"Basic": {"content": "hi", "sender_id": "u1", "message_id": "", ...}}
//! ```
//!
//! # Components
//!
//! - [`Envelope`]: exhaustive sum type over all variants, with
//!   [`Envelope::encode`] and [`Envelope::decode`]
//! - [`VariantKind`]: variant discriminant and the fixed key scan order
//! - [`payloads`]: per-variant payload structs
//! - [`http`]: request/response bodies of the HTTP collaborators (endpoint
//!   discovery, username change, upload)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod http;
pub mod payloads;

pub use envelope::{Envelope, VariantKind};
pub use errors::{ProtocolError, Result};
pub use payloads::{
    BasicMessage, ChangeRoomPayload, CreateRoomChangePayload, DeletionPayload, ImagePayload,
    InitializationPayload, NewUserPayload, NotificationPayload, TypingPayload, UserAdditionPayload,
    UserRemovalPayload, UsernameChangePayload,
};
