//! Packet header vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use congabridge_core::protocol::{decode_packet, encode_packet, FrameReassembler};

use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

const FILES: [&str; 6] = [
    "ping_request.json",
    "login_request.json",
    "unknown_opcode.json",
    "truncated_payload.json",
    "short_header.json",
    "undersized_declaration.json",
];

#[test]
fn packet_vectors() {
    for f in FILES {
        let v = load(f);
        let raw = v.frame.decode();
        let res = decode_packet(&raw);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.class().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let p = res.expect("expected ok packet");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(p.ctype as u64, ex["ctype"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(p.flow as u64, ex["flow"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(p.device_id as u64, ex["device_id"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(p.user_id as u64, ex["user_id"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(p.sequence, ex["sequence"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(p.opcode as u64, ex["opcode"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(p.payload.len() as u64, ex["payload_len"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(
            p.op().map(|op| op.as_str()),
            ex["op"].as_str(),
            "vector={}",
            v.description
        );
    }
}

#[test]
fn reencoding_swaps_id_fields() {
    let raw = load("login_request.json").frame.decode();
    let p = decode_packet(&raw).unwrap();
    let again = encode_packet(&p);

    assert_eq!(again.len(), raw.len());
    // everything but the two id words is byte-identical
    assert_eq!(&again[..6], &raw[..6]);
    assert_eq!(&again[14..], &raw[14..]);
    assert_eq!(&again[6..10], &raw[10..14]);
    assert_eq!(&again[10..14], &raw[6..10]);
}

#[test]
fn valid_vectors_reassemble_in_order() {
    let mut stream = Vec::new();
    for f in ["ping_request.json", "login_request.json", "unknown_opcode.json"] {
        stream.extend(load(f).frame.decode());
    }

    let mut r = FrameReassembler::default();
    let mut got = Vec::new();
    for chunk in stream.chunks(5) {
        got.extend(r.push(chunk).unwrap());
    }
    let ops: Vec<u16> = got.iter().map(|p| p.opcode).collect();
    assert_eq!(ops, vec![0x07D5, 0x07D1, 0xBEEF]);
    assert_eq!(r.pending(), 0);
}
