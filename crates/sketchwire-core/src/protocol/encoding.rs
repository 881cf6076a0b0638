//! Text encodings for binary payloads.
//!
//! Envelopes are text, so point payloads and image bytes travel through a
//! named scheme. The table is fixed at compile time and read-only. Names that
//! are not in the table resolve to the default scheme instead of failing, so
//! peers announcing a newer scheme name still get a decode attempt.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Result, SketchError};
use crate::protocol::points::{self, Point};

/// Canonical name of the default scheme.
pub const BASE64: &str = "Base64";

/// A reversible bytes <-> text transform.
pub trait TextEncoding: Send + Sync {
    /// Name carried in `encoding="..."` attributes.
    fn name(&self) -> &'static str;
    fn encode(&self, bytes: &[u8]) -> String;
    fn decode(&self, text: &str) -> Result<Vec<u8>>;
}

/// Standard alphabet, padded. Decoding skips ASCII whitespace so line-wrapped
/// bodies are accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64Encoding;

impl TextEncoding for Base64Encoding {
    fn name(&self) -> &'static str {
        BASE64
    }

    fn encode(&self, bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>> {
        let res = if text.bytes().any(|b| b.is_ascii_whitespace()) {
            let compact: Vec<u8> = text
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            STANDARD.decode(compact)
        } else {
            STANDARD.decode(text)
        };
        res.map_err(|source| SketchError::DecodeFailure {
            encoding: self.name().to_string(),
            source: source.into(),
        })
    }
}

static DEFAULT_ENCODING: Base64Encoding = Base64Encoding;

static ENCODINGS: &[&dyn TextEncoding] = &[&DEFAULT_ENCODING];

/// The scheme used when a name is unknown.
pub fn default_encoding() -> &'static dyn TextEncoding {
    &DEFAULT_ENCODING
}

/// Whether `name` is in the table (no fallback).
pub fn is_registered(name: &str) -> bool {
    ENCODINGS.iter().any(|e| e.name() == name)
}

/// Look up a scheme by name, falling back to the default.
pub fn resolve(name: &str) -> &'static dyn TextEncoding {
    match ENCODINGS.iter().find(|e| e.name() == name) {
        Some(e) => *e,
        None => {
            tracing::debug!(requested = %name, fallback = BASE64, "unknown encoding name");
            default_encoding()
        }
    }
}

/// Pack and encode points under the named scheme.
pub fn encode_points(encoding: &str, pts: &[Point]) -> String {
    resolve(encoding).encode(&points::pack(pts))
}

/// Decode and unpack points under the named scheme.
pub fn decode_points(encoding: &str, text: &str) -> Result<Vec<Point>> {
    let bytes = resolve(encoding).decode(text)?;
    Ok(points::unpack(&bytes))
}
