//! Single-key tagged envelopes.
//!
//! An envelope is a JSON object whose only recognised key names the variant.
//! Decoding inspects the top-level keys explicitly rather than trusting serde's
//! externally tagged representation, so that malformed frames can be
//! classified: no recognised key is [`ProtocolError::UnknownVariant`], more than
//! one is [`ProtocolError::AmbiguousVariant`]. Ambiguous frames are rejected,
//! never resolved by picking the first match.
//!
//! # Invariants
//!
//! - Each [`Envelope`] variant maps to exactly one [`VariantKind`] (enforced by
//!   match exhaustiveness in [`Envelope::kind`] and the decoder).
//! - `Envelope::decode(e.encode()?)` yields `e`.

use std::fmt;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    errors::{ProtocolError, Result},
    payloads::{
        BasicMessage, ChangeRoomPayload, CreateRoomChangePayload, DeletionPayload, ImagePayload,
        InitializationPayload, NewUserPayload, NotificationPayload, TypingPayload,
        UserAdditionPayload, UserRemovalPayload, UsernameChangePayload,
    },
};

/// Variant discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// Session snapshot.
    Initialization,
    /// Chat message.
    Basic,
    /// Image message.
    Image,
    /// Notification.
    Notification,
    /// Typing indicator.
    Typing,
    /// Message deletion.
    Deletion,
    /// New account.
    NewUser,
    /// Room membership addition.
    UserAddition,
    /// Room membership removal.
    UserRemoval,
    /// Room switch.
    ChangeRoom,
    /// Display name change.
    UsernameChange,
    /// Room creation.
    CreateRoomChange,
}

impl VariantKind {
    /// All variants in key scan order.
    ///
    /// Mirrors the legacy dispatcher's switch order. Since ambiguous frames are
    /// rejected, the order only decides how variants are listed in
    /// [`ProtocolError::AmbiguousVariant`].
    pub const PRIORITY: [Self; 12] = [
        Self::Initialization,
        Self::Basic,
        Self::Image,
        Self::Notification,
        Self::Typing,
        Self::Deletion,
        Self::NewUser,
        Self::UserAddition,
        Self::UserRemoval,
        Self::ChangeRoom,
        Self::UsernameChange,
        Self::CreateRoomChange,
    ];

    /// Wire key for this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialization => "Initialization",
            Self::Basic => "Basic",
            Self::Image => "Image",
            Self::Notification => "Notification",
            Self::Typing => "Typing",
            Self::Deletion => "Deletion",
            Self::NewUser => "NewUser",
            Self::UserAddition => "UserAddition",
            Self::UserRemoval => "UserRemoval",
            Self::ChangeRoom => "ChangeRoom",
            Self::UsernameChange => "UsernameChange",
            Self::CreateRoomChange => "CreateRoomChange",
        }
    }

    /// Look up a variant by wire key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::PRIORITY.into_iter().find(|kind| kind.as_str() == key)
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded protocol frame.
///
/// Serializes with serde's externally tagged representation, which is exactly
/// the single-key wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Envelope {
    /// Session snapshot, first frame on every connection.
    Initialization(InitializationPayload),
    /// Chat message.
    Basic(BasicMessage),
    /// Image message.
    Image(ImagePayload),
    /// Notification.
    Notification(NotificationPayload),
    /// Typing indicator.
    Typing(TypingPayload),
    /// Message deletion.
    Deletion(DeletionPayload),
    /// New account.
    NewUser(NewUserPayload),
    /// Room membership addition.
    UserAddition(UserAdditionPayload),
    /// Room membership removal.
    UserRemoval(UserRemovalPayload),
    /// Room switch.
    ChangeRoom(ChangeRoomPayload),
    /// Display name change.
    UsernameChange(UsernameChangePayload),
    /// Room creation.
    CreateRoomChange(CreateRoomChangePayload),
}

impl Envelope {
    /// Variant discriminant.
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::Initialization(_) => VariantKind::Initialization,
            Self::Basic(_) => VariantKind::Basic,
            Self::Image(_) => VariantKind::Image,
            Self::Notification(_) => VariantKind::Notification,
            Self::Typing(_) => VariantKind::Typing,
            Self::Deletion(_) => VariantKind::Deletion,
            Self::NewUser(_) => VariantKind::NewUser,
            Self::UserAddition(_) => VariantKind::UserAddition,
            Self::UserRemoval(_) => VariantKind::UserRemoval,
            Self::ChangeRoom(_) => VariantKind::ChangeRoom,
            Self::UsernameChange(_) => VariantKind::UsernameChange,
            Self::CreateRoomChange(_) => VariantKind::CreateRoomChange,
        }
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decode a JSON text frame.
    ///
    /// # Errors
    ///
    /// - `Malformed` if the text is not a JSON object
    /// - `UnknownVariant` if no recognised key is present
    /// - `AmbiguousVariant` if more than one recognised key is present
    /// - `InvalidPayload` if the payload does not match the variant
    pub fn decode(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let Value::Object(mut object) = value else {
            return Err(ProtocolError::Malformed("frame is not a JSON object".to_string()));
        };

        let kind = Self::classify(&object)?;
        let payload = object.remove(kind.as_str()).unwrap_or_default();
        Self::from_payload(kind, payload)
    }

    /// Find the single recognised variant key of a frame object.
    fn classify(object: &Map<String, Value>) -> Result<VariantKind> {
        let present: Vec<VariantKind> = VariantKind::PRIORITY
            .into_iter()
            .filter(|kind| object.contains_key(kind.as_str()))
            .collect();

        match present.len() {
            0 => Err(ProtocolError::UnknownVariant { keys: object.keys().cloned().collect() }),
            1 => Ok(present[0]),
            _ => Err(ProtocolError::AmbiguousVariant { variants: present }),
        }
    }

    fn from_payload(kind: VariantKind, payload: Value) -> Result<Self> {
        let envelope = match kind {
            VariantKind::Initialization => Self::Initialization(parse(kind, payload)?),
            VariantKind::Basic => Self::Basic(parse(kind, payload)?),
            VariantKind::Image => Self::Image(parse(kind, payload)?),
            VariantKind::Notification => Self::Notification(parse(kind, payload)?),
            VariantKind::Typing => Self::Typing(parse(kind, payload)?),
            VariantKind::Deletion => Self::Deletion(parse(kind, payload)?),
            VariantKind::NewUser => Self::NewUser(parse(kind, payload)?),
            VariantKind::UserAddition => Self::UserAddition(parse(kind, payload)?),
            VariantKind::UserRemoval => Self::UserRemoval(parse(kind, payload)?),
            VariantKind::ChangeRoom => Self::ChangeRoom(parse(kind, payload)?),
            VariantKind::UsernameChange => Self::UsernameChange(parse(kind, payload)?),
            VariantKind::CreateRoomChange => Self::CreateRoomChange(parse(kind, payload)?),
        };
        Ok(envelope)
    }
}

fn parse<T: DeserializeOwned>(kind: VariantKind, payload: Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| ProtocolError::InvalidPayload { variant: kind, reason: e.to_string() })
}
