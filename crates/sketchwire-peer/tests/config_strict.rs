#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sketchwire_peer::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
peer:
  encodng: "Base64" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.peer.encoding, "Base64");
    assert_eq!(cfg.peer.stroke_width, 0.006);
    assert_eq!(cfg.peer.stroke_color, "#FFFFFFFF");
    assert_eq!(cfg.limits.max_envelope_bytes, 1024 * 1024);
    assert_eq!(cfg.limits.outbound_queue, 256);
}

#[test]
fn full_config_overrides_defaults() {
    let ok = r##"
version: 1
peer:
  encoding: Base64
  stroke_width: 0.02
  stroke_color: "#FF00FF00"
limits:
  max_envelope_bytes: 4096
  outbound_queue: 8
"##;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.peer.stroke_width, 0.02);
    assert_eq!(cfg.peer.stroke_color, "#FF00FF00");
    assert_eq!(cfg.limits.max_envelope_bytes, 4096);
    assert_eq!(cfg.limits.outbound_queue, 8);
}

#[test]
fn unsupported_version_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn unknown_encoding_rejected() {
    let bad = "version: 1\npeer:\n  encoding: Base85\n";
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn out_of_range_values_rejected() {
    for bad in [
        "version: 1\npeer:\n  stroke_width: 0.0\n",
        "version: 1\npeer:\n  stroke_width: 1.5\n",
        "version: 1\nlimits:\n  max_envelope_bytes: 16\n",
        "version: 1\nlimits:\n  outbound_queue: 0\n",
    ] {
        let err = config::load_from_str(bad).expect_err("must fail");
        assert_eq!(err.code().as_str(), "BAD_CONFIG", "input={bad}");
    }
}

#[test]
fn malformed_yaml_is_bad_config() {
    let err = config::load_from_str("version: [1\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn missing_file_is_bad_config() {
    let err = config::load_from_file("/nonexistent/sketchwire.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}
