//! Random-input fuzzer for message and payload decoding
//!
//! Feeds arbitrary bytes to `Message::decode` and to `Payload::decode` for a
//! kind picked from the first input byte. Decoding may fail but must never
//! panic, and anything that decodes must encode back to the same payload.

#![no_main]

use fmapi_proto::{CodecConfig, Kind, Message, Payload, builder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };

    let context = builder::get_vcs_info(0, selector >> 4, selector & 0x0F).payload;
    let lenient = CodecConfig { strict_payload_len: false, ..CodecConfig::default() };

    // INVARIANT 1: whole-message decode never over-reads
    for config in [CodecConfig::default(), lenient] {
        if let Ok((message, consumed)) = Message::decode(rest, Some(&context), &config) {
            assert!(consumed <= rest.len());
            assert_eq!(consumed, message.header.message_len());
        }
    }

    // INVARIANT 2: a decoded payload re-encodes to the bytes it consumed
    let Ok(kind) = Kind::from_ordinal(selector % Kind::COUNT as u8) else {
        return;
    };
    if let Ok((payload, consumed)) = Payload::decode(kind, rest, Some(&context)) {
        assert!(consumed <= rest.len());
        assert_eq!(payload.kind(), kind);

        // Reserved bits are dropped on decode, so compare decoded values
        let wire = payload.to_bytes().expect("decoded payload must encode");
        assert_eq!(wire.len(), consumed, "size mismatch for {kind:?}");
        let (again, _) = Payload::decode(kind, &wire, Some(&context)).expect("re-encoded payload must decode");
        assert_eq!(again, payload);
    }
});
