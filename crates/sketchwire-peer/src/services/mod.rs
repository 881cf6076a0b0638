//! Built-in action handlers.

pub mod trace;

pub use trace::TraceHandler;
