#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sketchwire_core::error::Result;
use sketchwire_core::protocol::action::{Action, ActionKind};
use sketchwire_core::{ActionDocument, Envelope, Point};
use sketchwire_peer::config::PeerConfig;
use sketchwire_peer::dispatch::{ActionHandler, Dispatcher, InboundMeta};
use sketchwire_peer::obs::PeerMetrics;
use sketchwire_peer::transport::{pump, ChannelOutbound, PumpExit};
use sketchwire_peer::SketchSession;
use tokio::sync::mpsc;

/// Records (seq, index, kind) for every action it sees.
struct Recorder {
    kind: ActionKind,
    seen: Arc<Mutex<Vec<(Option<i32>, usize, ActionKind)>>>,
}

#[async_trait]
impl ActionHandler for Recorder {
    fn kind(&self) -> ActionKind {
        self.kind
    }

    async fn handle(&self, meta: InboundMeta, action: &Action) -> Result<()> {
        self.seen.lock().unwrap().push((meta.seq, meta.index, action.kind()));
        Ok(())
    }
}

fn session_with(
    kinds: &[ActionKind],
) -> (
    SketchSession,
    mpsc::Receiver<bytes::Bytes>,
    Arc<Mutex<Vec<(Option<i32>, usize, ActionKind)>>>,
) {
    let cfg = PeerConfig::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Arc::new(Dispatcher::new());
    for &kind in kinds {
        dispatcher.register(Arc::new(Recorder {
            kind,
            seen: Arc::clone(&seen),
        }));
    }
    let (outbound, rx) = ChannelOutbound::pair(cfg.limits.outbound_queue);
    let session = SketchSession::new(&cfg, Arc::new(outbound), dispatcher, Arc::new(PeerMetrics::default()));
    (session, rx, seen)
}

#[tokio::test]
async fn outbound_seq_starts_at_one_and_increases() {
    let (session, mut rx, _) = session_with(&[]);

    assert_eq!(session.undo(2).await.unwrap(), 1);
    assert_eq!(session.background_color("#FF000000").await.unwrap(), 2);
    assert_eq!(session.close().await.unwrap(), 3);

    for want in 1..=3 {
        let blob = rx.recv().await.unwrap();
        let env = Envelope::parse(&blob).unwrap();
        assert_eq!(env.seq, Some(want));
    }
    assert_eq!(session.metrics().envelopes_out.get(&[]), 3);
}

#[tokio::test]
async fn draw_uses_configured_stroke() {
    let (session, mut rx, _) = session_with(&[]);
    session
        .draw(vec![Point::new(0.1, 0.2), Point::new(0.3, 0.4)], false)
        .await
        .unwrap();

    let doc = ActionDocument::parse(&rx.recv().await.unwrap()).unwrap();
    let drawing = doc.drawing().unwrap();
    assert_eq!(drawing.color, "#FFFFFFFF");
    assert_eq!(drawing.width, 0.006);
    assert!(!drawing.is_erase());
    assert_eq!(drawing.points.as_ref().unwrap().points().unwrap().len(), 2);
}

#[tokio::test]
async fn two_sessions_exchange_through_pump() {
    let (alice, alice_out, _) = session_with(&[]);
    let (bob, _bob_out, seen) = session_with(&[ActionKind::Marker, ActionKind::Undo, ActionKind::Close]);

    alice
        .place_marker(Some("pin"), None, Point::new(1.0, 2.0), "m-1")
        .await
        .unwrap();
    alice.undo(3).await.unwrap();
    alice.close().await.unwrap();

    let exit = pump(&bob, alice_out).await;
    assert_eq!(exit, PumpExit::Closed);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            (Some(1), 0, ActionKind::Marker),
            (Some(2), 0, ActionKind::Undo),
            (Some(3), 0, ActionKind::Close),
        ]
    );
    assert_eq!(bob.last_inbound_seq(), Some(3));
    assert_eq!(bob.metrics().envelopes_in.get(&[]), 3);
}

#[tokio::test]
async fn pump_reports_disconnect_when_source_ends() {
    let (session, _, _) = session_with(&[]);
    let (tx, rx) = mpsc::channel(4);
    tx.send(bytes::Bytes::from_static(b"<actions><undo/></actions>")).await.unwrap();
    drop(tx);

    assert_eq!(pump(&session, rx).await, PumpExit::Disconnected);
}

#[tokio::test]
async fn pump_skips_bad_envelopes() {
    let (session, _, seen) = session_with(&[ActionKind::Close]);
    let (tx, rx) = mpsc::channel(4);
    tx.send(bytes::Bytes::from_static(b"<actions><drawing>")).await.unwrap();
    tx.send(bytes::Bytes::from_static(b"<actions><close/></actions>")).await.unwrap();

    assert_eq!(pump(&session, rx).await, PumpExit::Closed);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(session.metrics().rejected.get(&[("code", "MALFORMED_ENVELOPE")]), 1);
}

#[tokio::test]
async fn actions_dispatch_in_envelope_order() {
    let (session, _, seen) = session_with(&[ActionKind::BackgroundColor, ActionKind::Undo]);
    let blob = br##"<actions seq="9"><background_color color="#FF000000"/><undo/><undo/><background_color color="#FFFFFFFF"/></actions>"##;

    let env = session.receive(blob).await.unwrap();
    assert_eq!(env.actions.len(), 3);
    assert_eq!(
        seen.lock().unwrap().clone(),
        vec![
            (Some(9), 0, ActionKind::BackgroundColor),
            (Some(9), 1, ActionKind::Undo),
            (Some(9), 2, ActionKind::BackgroundColor),
        ]
    );
}

#[tokio::test]
async fn unhandled_kinds_are_counted_not_failed() {
    let (session, _, _) = session_with(&[]);
    session.receive(b"<actions><close/></actions>").await.unwrap();

    let metrics = session.metrics();
    assert_eq!(metrics.unhandled.get(&[("kind", "close")]), 1);
    assert_eq!(metrics.actions_in.get(&[("kind", "close")]), 1);
}

#[tokio::test]
async fn oversized_blob_rejected_before_parse() {
    let (session, _, _) = session_with(&[]);
    let blob = vec![b' '; 1024 * 1024 + 1];

    let err = session.receive(&blob).await.expect_err("must fail");
    assert_eq!(err.code().as_str(), "PAYLOAD_TOO_LARGE");
    assert_eq!(session.metrics().rejected.get(&[("code", "PAYLOAD_TOO_LARGE")]), 1);
    assert_eq!(session.metrics().parse_duration.count(&[]), 0);
}

#[tokio::test]
async fn non_increasing_inbound_seq_is_tolerated() {
    let (session, _, _) = session_with(&[]);
    session.receive(br#"<actions seq="5"><undo/></actions>"#).await.unwrap();
    session.receive(br#"<actions seq="4"><undo/></actions>"#).await.unwrap();

    assert_eq!(session.last_inbound_seq(), Some(5));
    assert_eq!(session.metrics().seq_regressions.get(&[]), 1);
    assert_eq!(session.metrics().envelopes_in.get(&[]), 2);
}

#[tokio::test]
async fn empty_background_image_rejected() {
    let (session, _, _) = session_with(&[]);
    let err = session.background_image(&[]).await.expect_err("must fail");
    assert_eq!(err.code().as_str(), "EMPTY_PAYLOAD");
}

#[test]
fn metrics_render_prometheus_text() {
    let metrics = PeerMetrics::default();
    metrics.actions_in.inc(&[("kind", "draw")]);
    metrics.envelopes_in.inc(&[]);

    let text = metrics.render();
    assert!(text.contains("# TYPE sketchwire_actions_in_total counter"));
    assert!(text.contains("sketchwire_actions_in_total{kind=\"draw\"} 1"));
    assert!(text.contains("sketchwire_envelopes_in_total 1"));
}

/// Fails every action of its kind.
struct Failing(ActionKind);

#[async_trait]
impl ActionHandler for Failing {
    fn kind(&self) -> ActionKind {
        self.0
    }

    async fn handle(&self, _meta: InboundMeta, _action: &Action) -> Result<()> {
        Err(sketchwire_core::SketchError::Transport("handler down".into()))
    }
}

#[tokio::test]
async fn handler_failure_does_not_stop_the_envelope() {
    let (session, _, seen) = session_with(&[ActionKind::Close]);
    session.dispatcher().register(Arc::new(Failing(ActionKind::Undo)));

    let (tx, rx) = mpsc::channel(4);
    tx.send(bytes::Bytes::from_static(br#"<actions seq="1"><undo/><close/></actions>"#))
        .await
        .unwrap();

    assert_eq!(pump(&session, rx).await, PumpExit::Closed);
    assert_eq!(seen.lock().unwrap().clone(), vec![(Some(1), 1, ActionKind::Close)]);

    let metrics = session.metrics();
    assert_eq!(metrics.handler_errors.get(&[("kind", "undo")]), 1);
    assert_eq!(metrics.envelopes_in.get(&[]), 1);
    assert!(metrics.render().contains("sketchwire_handler_errors_total{kind=\"undo\"} 1"));
}

#[tokio::test]
async fn refused_sends_do_not_consume_seq() {
    let mut cfg = PeerConfig::default();
    cfg.limits.max_envelope_bytes = 1024;
    let (outbound, mut rx) = ChannelOutbound::pair(8);
    let session = SketchSession::new(
        &cfg,
        Arc::new(outbound),
        Arc::new(Dispatcher::new()),
        Arc::new(PeerMetrics::default()),
    );

    let err = session.remove_marker("").await.expect_err("must fail");
    assert_eq!(err.code().as_str(), "EMPTY_PAYLOAD");

    let stroke: Vec<Point> = (0..512).map(|i| Point::new(i as f32, 0.0)).collect();
    let err = session.draw(stroke, false).await.expect_err("must fail");
    assert_eq!(err.code().as_str(), "PAYLOAD_TOO_LARGE");

    assert_eq!(session.undo(1).await.unwrap(), 1);
    assert_eq!(session.undo(1).await.unwrap(), 2);
    let first = Envelope::parse(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(first.seq, Some(1));
    assert_eq!(session.metrics().envelopes_out.get(&[]), 2);
}
