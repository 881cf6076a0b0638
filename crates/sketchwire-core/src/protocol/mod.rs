//! Protocol modules (point payloads, text encodings, XML envelopes).
//!
//! Layering, leaves first:
//! - `points`: packed big-endian `f32` pairs.
//! - `encoding`: named byte <-> text schemes (`Base64` by default).
//! - `action`: the action model carried by an envelope.
//! - `envelope`: envelope serialization (builder entry points).
//! - `parser`: single-pass envelope parser.
//! - `document`: last-wins view over a parsed envelope.
//!
//! All parsers are panic-free: malformed input is reported as `SketchError`
//! instead of panicking or indexing raw buffers.

pub mod action;
pub mod document;
pub mod encoding;
pub mod envelope;
pub mod parser;
pub mod points;
