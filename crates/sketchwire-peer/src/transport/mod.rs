//! Transport seam.
//!
//! The protocol never touches a socket. Outbound envelopes leave through an
//! [`Outbound`] implementation; inbound blobs arrive on a channel drained by
//! [`pump`].

pub mod channel;

pub use channel::{pump, ChannelOutbound, PumpExit};

use async_trait::async_trait;
use bytes::Bytes;

use sketchwire_core::error::Result;

/// Delivers one serialized envelope to the remote peer.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send(&self, envelope: Bytes) -> Result<()>;
}
