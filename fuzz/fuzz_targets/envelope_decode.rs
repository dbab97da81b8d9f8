//! Fuzz target for Envelope::decode
//!
//! Feeds arbitrary text to the envelope decoder.
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Anything that decodes re-encodes to text that decodes to the same
//!   envelope

#![no_main]

use libfuzzer_sys::fuzz_target;
use murmur_proto::Envelope;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(envelope) = Envelope::decode(text) {
        let encoded = envelope.encode().expect("decoded envelope must encode");
        let again = Envelope::decode(&encoded).expect("encoded envelope must decode");
        assert_eq!(envelope, again);
    }
});
