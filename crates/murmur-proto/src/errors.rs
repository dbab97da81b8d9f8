//! Protocol error types.

use thiserror::Error;

use crate::VariantKind;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding envelopes.
///
/// None of these are fatal to a session. A frame that fails to decode is
/// logged and dropped by the receiver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is not valid JSON or not a JSON object.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// No recognised variant key is present.
    #[error("unknown variant: frame keys {keys:?}")]
    UnknownVariant {
        /// Top-level keys that were present.
        keys: Vec<String>,
    },

    /// More than one recognised variant key is present.
    #[error("ambiguous frame: matches {variants:?}")]
    AmbiguousVariant {
        /// Every recognised variant, in scan order.
        variants: Vec<VariantKind>,
    },

    /// The variant key was recognised but its payload does not parse.
    #[error("invalid {variant} payload: {reason}")]
    InvalidPayload {
        /// Variant whose payload failed.
        variant: VariantKind,
        /// Parser message.
        reason: String,
    },

    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Upload data is not valid base64.
    #[error("invalid base64 data: {0}")]
    InvalidBase64(String),
}
