//! Dispatcher module exports.

pub mod dispatcher;

pub use dispatcher::{ActionHandler, Dispatcher, InboundMeta};
