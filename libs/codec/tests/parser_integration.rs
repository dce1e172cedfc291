//! Property tests for envelope parsing
//!
//! Round-trips arbitrary valid state and body, and feeds arbitrary bytes to the
//! decoder to check it never panics.

use codec::{decode, encode, TaggedState, ENVELOPE_SIGNATURE};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn tag_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,40}"
}

fn tag_value() -> impl Strategy<Value = Vec<u8>> {
    vec(any::<u8>(), 1..256)
}

proptest! {
    #[test]
    fn round_trip_arbitrary_tags(
        tags in btree_map(tag_name(), tag_value(), 0..12),
        body in vec(any::<u8>(), 0..512),
    ) {
        let mut state = TaggedState::new();
        for (name, value) in &tags {
            state.set(name, value.clone()).unwrap();
        }

        let frame = encode(&state, &body).unwrap();
        let decoded = decode(&frame).unwrap();

        prop_assert_eq!(decoded.state.len(), tags.len());
        for (name, value) in &tags {
            prop_assert_eq!(decoded.state.value(name), Some(value.as_slice()));
        }
        prop_assert_eq!(decoded.state.byte_size(), state.byte_size());
        prop_assert_eq!(decoded.body, body);
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in vec(any::<u8>(), 0..256)) {
        let _ = decode(&data);
    }

    #[test]
    fn arbitrary_bytes_after_signature_never_panic(
        version in prop_oneof![Just(1u8), any::<u8>()],
        tail in vec(any::<u8>(), 0..256),
    ) {
        let mut data = ENVELOPE_SIGNATURE.to_vec();
        data.push(version);
        data.extend_from_slice(&tail);
        let _ = decode(&data);
    }
}
