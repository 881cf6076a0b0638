use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use sketchwire_core::error::Result;
use sketchwire_core::protocol::action::{Action, ActionKind};

/// Per-envelope metadata handed to handlers alongside each action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundMeta {
    pub seq: Option<i32>,
    pub version: i32,
    /// Position of the action inside its envelope.
    pub index: usize,
}

/// Consumer of one kind of inbound action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn kind(&self) -> ActionKind;
    async fn handle(&self, meta: InboundMeta, action: &Action) -> Result<()>;
}

/// Registry routing inbound actions to their handler by kind.
#[derive(Default)]
pub struct Dispatcher {
    handlers: DashMap<ActionKind, Arc<dyn ActionHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Register a handler; a later registration for the same kind replaces it.
    pub fn register(&self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn registered_kinds(&self) -> Vec<ActionKind> {
        self.handlers.iter().map(|e| *e.key()).collect()
    }

    /// Route one action. Returns `Ok(false)` when nothing handles its kind.
    pub async fn dispatch(&self, meta: InboundMeta, action: &Action) -> Result<bool> {
        let kind = action.kind();
        // No shard lock held across the await.
        let handler = match self.handlers.get(&kind) {
            Some(h) => h.value().clone(),
            None => {
                tracing::debug!(kind = kind.as_str(), "no handler registered");
                return Ok(false);
            }
        };
        handler.handle(meta, action).await?;
        Ok(true)
    }
}
