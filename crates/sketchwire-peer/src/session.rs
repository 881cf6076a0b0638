//! One end of a sketch session.
//!
//! Outbound: every envelope is stamped with a sequence number that starts at
//! 1 and increases by one per send. Envelopes refused before sending do not
//! consume a number. Inbound: blobs are size-checked, parsed,
//! and each action is dispatched in envelope order.

use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use sketchwire_core::error::{Result, SketchError};
use sketchwire_core::protocol::action::{
    Action, BackgroundImage, Bounds, Drawing, Marker, RemoveMarker, UserLocation,
};
use sketchwire_core::protocol::envelope::{Envelope, ImageSource};
use sketchwire_core::protocol::points::Point;

use crate::config::PeerConfig;
use crate::dispatch::{Dispatcher, InboundMeta};
use crate::obs::PeerMetrics;
use crate::transport::Outbound;

const NO_SEQ: i64 = i64::MIN;

pub struct SketchSession {
    encoding: String,
    stroke_width: f32,
    stroke_color: String,
    max_envelope_bytes: usize,
    next_seq: AtomicI32,
    last_inbound_seq: AtomicI64,
    outbound: Arc<dyn Outbound>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<PeerMetrics>,
}

impl SketchSession {
    pub fn new(
        cfg: &PeerConfig,
        outbound: Arc<dyn Outbound>,
        dispatcher: Arc<Dispatcher>,
        metrics: Arc<PeerMetrics>,
    ) -> Self {
        Self {
            encoding: cfg.peer.encoding.clone(),
            stroke_width: cfg.peer.stroke_width,
            stroke_color: cfg.peer.stroke_color.clone(),
            max_envelope_bytes: cfg.limits.max_envelope_bytes,
            next_seq: AtomicI32::new(1),
            last_inbound_seq: AtomicI64::new(NO_SEQ),
            outbound,
            dispatcher,
            metrics,
        }
    }

    pub fn metrics(&self) -> Arc<PeerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Highest sequence number seen from the peer so far.
    pub fn last_inbound_seq(&self) -> Option<i32> {
        match self.last_inbound_seq.load(Ordering::Acquire) {
            NO_SEQ => None,
            v => i32::try_from(v).ok(),
        }
    }

    /// Serialize `actions` into one envelope and send it. Returns the stamped seq.
    pub async fn send(&self, actions: Vec<Action>) -> Result<i32> {
        let mut env = Envelope::new(actions);
        // A seq is claimed only once its envelope is known to be sendable.
        let (seq, xml) = loop {
            let seq = self.next_seq.load(Ordering::Acquire);
            let next = seq
                .checked_add(1)
                .ok_or_else(|| SketchError::Transport("outbound seq exhausted".into()))?;
            env.seq = Some(seq);
            let xml = env.to_xml()?;
            if xml.len() > self.max_envelope_bytes {
                return Err(SketchError::PayloadTooLarge {
                    len: xml.len(),
                    max: self.max_envelope_bytes,
                });
            }
            if self
                .next_seq
                .compare_exchange(seq, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break (seq, xml);
            }
        };

        tracing::debug!(seq, bytes = xml.len(), "sending envelope");
        self.outbound.send(Bytes::from(xml)).await?;
        self.metrics.envelopes_out.inc(&[]);
        Ok(seq)
    }

    /// Stroke in the configured color and width.
    pub async fn draw(&self, points: Vec<Point>, erase: bool) -> Result<i32> {
        self.draw_styled(points, &self.stroke_color, self.stroke_width, erase)
            .await
    }

    pub async fn draw_styled(&self, points: Vec<Point>, color: &str, width: f32, erase: bool) -> Result<i32> {
        let drawing = Drawing::new(points, &self.encoding, color, width, erase);
        self.send(vec![Action::Draw(drawing)]).await
    }

    pub async fn undo(&self, times: u32) -> Result<i32> {
        self.send(vec![Action::Undo(times)]).await
    }

    pub async fn close(&self) -> Result<i32> {
        self.send(vec![Action::Close]).await
    }

    pub async fn location(&self, point: Point) -> Result<i32> {
        let user = UserLocation::new(point, &self.encoding);
        self.send(vec![Action::UserLocation(user)]).await
    }

    pub async fn bounds(&self, northeast: Point, southwest: Point) -> Result<i32> {
        let bounds = Bounds::new(northeast, southwest, &self.encoding);
        self.send(vec![Action::Bounds(bounds)]).await
    }

    pub async fn place_marker(
        &self,
        title: Option<&str>,
        snippet: Option<&str>,
        point: Point,
        id: &str,
    ) -> Result<i32> {
        let marker = Marker::new(title, snippet, point, id, &self.encoding);
        self.send(vec![Action::Marker(marker)]).await
    }

    pub async fn remove_marker(&self, id: &str) -> Result<i32> {
        let remove = RemoveMarker { id: id.to_string() };
        self.send(vec![Action::RemoveMarker(remove)]).await
    }

    pub async fn background_color(&self, color: &str) -> Result<i32> {
        self.send(vec![Action::BackgroundColor(color.to_string())]).await
    }

    pub async fn background_image(&self, image: &[u8]) -> Result<i32> {
        if image.is_empty() {
            return Err(SketchError::EmptyPayload("image"));
        }
        let img = BackgroundImage::from_bytes(image, &self.encoding);
        self.send(vec![Action::BackgroundImage(img)]).await
    }

    pub async fn background_image_from(&self, source: &(dyn ImageSource + Sync)) -> Result<i32> {
        let bytes = source.compress();
        self.background_image(&bytes).await
    }

    /// Parse one inbound blob and dispatch its actions in order.
    ///
    /// A failing handler is logged and counted; the remaining actions are
    /// still dispatched.
    pub async fn receive(&self, blob: &[u8]) -> Result<Envelope> {
        if blob.len() > self.max_envelope_bytes {
            let err = SketchError::PayloadTooLarge {
                len: blob.len(),
                max: self.max_envelope_bytes,
            };
            self.reject(&err);
            return Err(err);
        }

        let started = Instant::now();
        let env = match Envelope::parse(blob) {
            Ok(env) => env,
            Err(e) => {
                self.reject(&e);
                return Err(e);
            }
        };
        self.metrics.parse_duration.observe(&[], started.elapsed());
        self.metrics.envelopes_in.inc(&[]);

        if let Some(seq) = env.seq {
            self.track_seq(seq);
        }

        for (index, action) in env.actions.iter().enumerate() {
            let kind = action.kind().as_str();
            self.metrics.actions_in.inc(&[("kind", kind)]);

            let meta = InboundMeta {
                seq: env.seq,
                version: env.version,
                index,
            };
            match self.dispatcher.dispatch(meta, action).await {
                Ok(true) => {}
                Ok(false) => self.metrics.unhandled.inc(&[("kind", kind)]),
                Err(e) => {
                    self.metrics.handler_errors.inc(&[("kind", kind)]);
                    tracing::warn!(seq = ?env.seq, index, kind, code = e.code().as_str(), error = %e, "action handler failed");
                }
            }
        }

        Ok(env)
    }

    fn track_seq(&self, seq: i32) {
        let prev = self.last_inbound_seq.fetch_max(i64::from(seq), Ordering::AcqRel);
        if prev != NO_SEQ && i64::from(seq) <= prev {
            self.metrics.seq_regressions.inc(&[]);
            tracing::warn!(seq, prev, "inbound seq did not increase");
        }
    }

    fn reject(&self, err: &SketchError) {
        self.metrics.rejected.inc(&[("code", err.code().as_str())]);
        tracing::debug!(code = err.code().as_str(), error = %err, "envelope rejected");
    }
}
