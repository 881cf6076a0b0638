use bytes::Bytes;
use tokio::sync::mpsc;

use async_trait::async_trait;
use sketchwire_core::error::{Result, SketchError};
use sketchwire_core::protocol::action::Action;

use crate::session::SketchSession;
use crate::transport::Outbound;

/// Outbound half backed by a bounded tokio channel.
#[derive(Clone)]
pub struct ChannelOutbound {
    tx: mpsc::Sender<Bytes>,
}

impl ChannelOutbound {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }

    /// Build an outbound half and the receiver that observes what it sends.
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Outbound for ChannelOutbound {
    async fn send(&self, envelope: Bytes) -> Result<()> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| SketchError::Transport("outbound channel closed".into()))
    }
}

/// Why [`pump`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The remote peer sent a close action.
    Closed,
    /// The inbound channel was dropped.
    Disconnected,
}

/// Feed inbound blobs into `session` until the peer closes or the source ends.
///
/// Rejected envelopes are logged and skipped; one bad blob does not end the
/// session.
pub async fn pump(session: &SketchSession, mut rx: mpsc::Receiver<Bytes>) -> PumpExit {
    while let Some(blob) = rx.recv().await {
        match session.receive(&blob).await {
            Ok(env) => {
                if env.actions.iter().any(|a| matches!(a, Action::Close)) {
                    tracing::info!(seq = ?env.seq, "peer closed session");
                    return PumpExit::Closed;
                }
            }
            Err(e) => {
                tracing::warn!(code = e.code().as_str(), error = %e, "inbound envelope rejected");
            }
        }
    }
    tracing::debug!("inbound source ended");
    PumpExit::Disconnected
}
