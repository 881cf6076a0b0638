//! Top-level facade crate for sketchwire.
//!
//! Re-exports the codec and the peer library so users can depend on a single crate.

pub mod core {
    pub use sketchwire_core::*;
}

pub mod peer {
    pub use sketchwire_peer::*;
}
