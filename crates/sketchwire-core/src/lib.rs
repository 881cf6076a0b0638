//! sketchwire core: transport-agnostic sketch protocol codec.
//!
//! This crate defines the wire-level contracts shared by every sketch peer:
//! packed point payloads, the text-encoding table, the XML action envelope
//! and its single-pass parser. It carries no transport or runtime
//! dependencies so it can be embedded wherever envelopes are produced or
//! consumed.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Envelopes come
//! from remote peers, so every fallible path surfaces as `SketchError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, Result, SketchError};
pub use protocol::action::{
    Action, ActionKind, BackgroundImage, Bounds, Drawing, EncodedPoints, Marker, RemoveMarker,
    UserLocation,
};
pub use protocol::document::ActionDocument;
pub use protocol::envelope::Envelope;
pub use protocol::points::Point;
