use async_trait::async_trait;

use sketchwire_core::error::Result;
use sketchwire_core::protocol::action::{Action, ActionKind};

use crate::dispatch::{ActionHandler, InboundMeta};

/// Logs every action of one kind at info. Useful to prove dispatch routing.
pub struct TraceHandler {
    kind: ActionKind,
}

impl TraceHandler {
    pub fn new(kind: ActionKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl ActionHandler for TraceHandler {
    fn kind(&self) -> ActionKind {
        self.kind
    }

    async fn handle(&self, meta: InboundMeta, action: &Action) -> Result<()> {
        match action {
            Action::Draw(d) => {
                let points = d.points.as_ref().map(|p| p.points().map(|v| v.len())).transpose()?;
                tracing::info!(seq = ?meta.seq, color = %d.color, width = d.width, erase = d.is_erase(), ?points, "draw");
            }
            Action::Undo(n) => tracing::info!(seq = ?meta.seq, steps = n, "undo"),
            Action::Marker(m) => tracing::info!(seq = ?meta.seq, id = %m.id, title = ?m.title, "marker"),
            Action::RemoveMarker(r) => tracing::info!(seq = ?meta.seq, id = %r.id, "remove marker"),
            Action::BackgroundColor(c) => tracing::info!(seq = ?meta.seq, color = %c, "background color"),
            other => tracing::info!(seq = ?meta.seq, index = meta.index, kind = other.kind().as_str(), "action"),
        }
        Ok(())
    }
}
