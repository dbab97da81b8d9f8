//! Property-based tests for envelope encoding/decoding.
//!
//! These verify decoder totality (never panics, always classifies) and that
//! encoding is lossless for the variants the client reconciles on.

use murmur_proto::{
    BasicMessage, DeletionPayload, Envelope, ProtocolError, UsernameChangePayload, VariantKind,
};
use proptest::prelude::*;

/// Strategy for generating chat messages, with and without server ids.
fn arbitrary_basic() -> impl Strategy<Value = BasicMessage> {
    (
        ".{0,64}",
        "[a-z0-9]{1,8}",
        prop_oneof![Just(String::new()), "[a-f0-9]{1,16}"],
        "[a-z]{0,8}",
        "[a-z0-9]{1,8}",
        any::<u64>(),
        proptest::option::of("[a-z0-9:]{1,12}"),
    )
        .prop_map(|(content, sender_id, message_id, room_id, ws_id, timestamp, correlation_id)| {
            BasicMessage {
                content,
                sender_id,
                message_id,
                room_id,
                ws_id,
                timestamp,
                correlation_id,
            }
        })
}

/// Strategy for the reconciled envelope variants.
fn arbitrary_envelope() -> impl Strategy<Value = Envelope> {
    prop_oneof![
        arbitrary_basic().prop_map(Envelope::Basic),
        ("[a-z0-9]{1,8}", "[a-f0-9]{1,16}").prop_map(|(sender_id, message_id)| {
            Envelope::Deletion(DeletionPayload { sender_id, message_id })
        }),
        ("[a-z0-9]{1,8}", ".{0,32}").prop_map(|(sender_id, new_username)| {
            Envelope::UsernameChange(UsernameChangePayload { new_username, sender_id })
        }),
    ]
}

proptest! {
    #[test]
    fn prop_decode_never_panics(text in ".{0,256}") {
        let _ = Envelope::decode(&text);
    }

    #[test]
    fn prop_encode_decode_preserves_envelope(envelope in arbitrary_envelope()) {
        let text = envelope.encode().expect("encode");
        let decoded = Envelope::decode(&text).expect("decode");
        prop_assert_eq!(decoded, envelope);
    }

    #[test]
    fn prop_any_two_known_keys_are_ambiguous(a in 0usize..12, b in 0usize..12) {
        prop_assume!(a != b);
        let first = VariantKind::PRIORITY[a];
        let second = VariantKind::PRIORITY[b];
        let text = format!(r#"{{"{first}":{{}},"{second}":{{}}}}"#);

        let result = Envelope::decode(&text);
        prop_assert!(
            matches!(result, Err(ProtocolError::AmbiguousVariant { ref variants }) if variants.len() == 2),
            "expected ambiguity, got {:?}",
            result
        );
    }

    #[test]
    fn prop_unknown_keys_never_decode(key in "[a-z]{1,12}") {
        let text = format!(r#"{{"{key}":{{}}}}"#);
        prop_assert!(
            matches!(Envelope::decode(&text), Err(ProtocolError::UnknownVariant { .. })),
            "lowercase keys never match a variant",
        );
    }
}
