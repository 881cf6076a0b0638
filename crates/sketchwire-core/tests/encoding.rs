//! Text encoding table behaviour.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sketchwire_core::protocol::encoding::{
    decode_points, encode_points, is_registered, resolve, BASE64,
};
use sketchwire_core::protocol::points::Point;
use sketchwire_core::ErrorCode;

#[test]
fn base64_is_the_canonical_scheme() {
    assert!(is_registered(BASE64));
    assert_eq!(resolve(BASE64).name(), "Base64");
    assert_eq!(resolve(BASE64).encode(b"sketch"), "c2tldGNo");
}

#[test]
fn unknown_names_fall_back_to_base64() {
    assert!(!is_registered("Foo"));
    assert_eq!(resolve("Foo").name(), BASE64);
    assert_eq!(resolve("").name(), BASE64);

    let text = encode_points(BASE64, &[Point::new(1.5, -2.25)]);
    let pts = decode_points("Foo", &text).unwrap();
    assert_eq!(pts, vec![Point::new(1.5, -2.25)]);
}

#[test]
fn line_wrapped_base64_decodes() {
    let pts = vec![Point::new(3.0, 4.0), Point::new(-1.0, 0.5)];
    let text = encode_points(BASE64, &pts);
    let (head, tail) = text.split_at(8);
    let wrapped = format!("{head}\n  {tail}\r\n");
    assert_eq!(decode_points(BASE64, &wrapped).unwrap(), pts);
}

#[test]
fn invalid_text_is_a_decode_failure() {
    let err = decode_points("Foo", "not*base64!").expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::DecodeFailure);
    assert!(err.to_string().contains("Base64"));
}

#[test]
fn empty_text_decodes_to_no_points() {
    assert!(decode_points(BASE64, "").unwrap().is_empty());
}
