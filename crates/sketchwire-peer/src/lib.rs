//! sketchwire peer library.
//!
//! Wires config, the action dispatcher, metrics and a channel transport
//! around the core codec so an application can run one end of a sketch
//! session. Consumed by the `sketchwire-inspect` binary and by integration
//! tests.

pub mod config;
pub mod dispatch;
pub mod obs;
pub mod services;
pub mod session;
pub mod transport;

pub use session::SketchSession;
