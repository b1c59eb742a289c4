//! Exhaustive positive space fuzzer for the message builders
//!
//! Unlike random fuzzing (message_decode.rs), this fuzzer walks every builder
//! with edge-case values for each field:
//! - 0, 1, mid-range and maximum for byte and word fields
//! - the largest value of every sub-byte field
//! - empty, single and full lists
//!
//! The fuzzer input only picks the combination, so coverage stays exhaustive
//! while libFuzzer guides exploration.

#![no_main]

use fmapi_proto::{CodecConfig, Message, QosTelemetry, builder, payloads::LdAllocBlock};
use libfuzzer_sys::fuzz_target;

const U8_EDGES: &[u8] = &[0, 1, 0x7F, 0x80, 0xFE, 0xFF];

const U16_EDGES: &[u16] = &[0, 1, 0x00FF, 0x0100, 0x7FFF, u16::MAX];

const U64_EDGES: &[u64] = &[0, 1, u32::MAX as u64, u64::MAX / 2, u64::MAX];

// Values of 4-bit fields
const NIBBLES: &[u8] = &[0, 1, 0x0E, 0x0F];

// List lengths for the 16-entry MLD lists
const LIST_LENS: &[usize] = &[0, 1, 15, 16];

fn pick<T: Copy>(table: &[T], selector: u8) -> T {
    table[usize::from(selector) % table.len()]
}

fn check(message: &Message, config: &CodecConfig) {
    // INVARIANT 1: encoding must succeed for in-range fields
    let wire = message.to_bytes(config).expect("builder output must encode");

    // INVARIANT 2: encoded size matches the header
    assert_eq!(wire.len(), message.header.message_len(), "size mismatch for {:?}", message.kind());

    // INVARIANT 3: round trip is identity
    let context = builder::get_vcs_info(0, 0, 255).payload;
    let (decoded, consumed) = Message::decode(&wire, Some(&context), config).expect("builder output must decode");
    assert_eq!(consumed, wire.len());
    assert_eq!(&decoded, message);
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let config = CodecConfig::default();
    let a = pick(U8_EDGES, data[0]);
    let b = pick(U8_EDGES, data[1]);
    let w = pick(U16_EDGES, data[2]);
    let q = pick(U64_EDGES, data[3]);
    let n = pick(NIBBLES, data[0] ^ data[1]);
    let len = pick(LIST_LENS, data[2] ^ data[3]);

    let blocks: Vec<LdAllocBlock> = (0..len).map(|_| LdAllocBlock { range1: q, range2: q }).collect();
    let fractions = vec![a; len];
    let data_len = usize::from(w) % 4097;

    let messages = [
        builder::identify(),
        builder::background_status(),
        builder::get_message_limit(),
        builder::set_message_limit(a),
        builder::identify_switch(),
        builder::get_all_ports(),
        builder::get_port(a),
        builder::get_ports(&fractions).expect("fits"),
        builder::port_control(a, b),
        builder::ppb_config(a, b, n, n, a & 1 == 1, [a, b, a, b]),
        builder::get_vcs_info(a, b, a),
        builder::bind_vppb(a, b, a, w),
        builder::unbind_vppb(a, b, n),
        builder::generate_aer(a, b, u32::from(w), [b; 32]),
        builder::ld_config(a, w, b, n, n, b & 1 == 1, [b, a, b, a]),
        builder::ld_memory(a, w, q, n, n, a & 1 == 0, vec![b; data_len]),
        builder::get_ld_info(),
        builder::get_ld_alloc(a, b),
        builder::set_ld_alloc(a, &blocks).expect("fits"),
        builder::get_qos_control(),
        builder::set_qos_control(QosTelemetry::from_bits_truncate(a), a, b, a, w, b),
        builder::get_qos_status(),
        builder::get_qos_alloc(a, b),
        builder::set_qos_alloc(a, &fractions).expect("fits"),
        builder::get_qos_limit(a, b),
        builder::set_qos_limit(b, &fractions).expect("fits"),
    ];

    for message in &messages {
        check(message, &config);

        // Every request also survives a trip through a tunnel
        if message.payload.encoded_len() <= config.max_tunnel_payload_len() {
            let tunnel = builder::tunnel(a, b, message).expect("tunnel must build");
            check(&tunnel, &config);
        }
    }
});
