#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use congabridge_core::BridgeError;
use congabridge_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
bridge:
  cmd_listen: "0.0.0.0:4010"
  max_frame_byte: 1024 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.class().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.bridge.cmd_listen, "0.0.0.0:4010");
    assert_eq!(cfg.bridge.map_listen, "0.0.0.0:4030");
    assert_eq!(cfg.handshake.map_info_delay_ms, 1000);
    assert_eq!(cfg.handshake.map_info_mask, 0x78FF);
    assert!(cfg.api.enabled);
    assert_eq!(cfg.api.command_timeout_ms, 10000);
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
bridge:
  cmd_listen: "127.0.0.1:14010"
  map_listen: "127.0.0.1:14030"
  max_frame_bytes: 65536
handshake:
  map_info_delay_ms: 0
  map_info_mask: 30975
api:
  enabled: false
  listen: "127.0.0.1:9000"
  command_timeout_ms: 2500
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.bridge.cmd_addr().unwrap().port(), 14010);
    assert_eq!(cfg.bridge.max_frame_bytes, 65536);
    assert_eq!(cfg.handshake.map_info_delay_ms, 0);
    assert!(!cfg.api.enabled);
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert!(matches!(err, BridgeError::UnsupportedVersion));
}

#[test]
fn rejects_bad_values() {
    for bad in [
        "version: 1\nbridge:\n  cmd_listen: \"not-an-addr\"\n",
        "version: 1\nbridge:\n  max_frame_bytes: 8\n",
        "version: 1\nhandshake:\n  map_info_delay_ms: 60001\n",
        "version: 1\napi:\n  command_timeout_ms: 5\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert!(matches!(err, BridgeError::BadConfig(_)), "{bad}: {err}");
    }
}
