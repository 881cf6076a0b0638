//! sketchwire-inspect
//!
//! Reads one envelope per stdin line, runs it through a peer session, and
//! prints the parsed envelope as JSON on stdout. Rejections go to the log.
//! Metrics are written to stderr at end of input.
//!
//! Config path comes from `SKETCHWIRE_CONFIG`; built-in defaults apply when
//! it is unset.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use sketchwire_core::protocol::action::ActionKind;
use sketchwire_peer::config::{self, PeerConfig};
use sketchwire_peer::dispatch::Dispatcher;
use sketchwire_peer::obs::PeerMetrics;
use sketchwire_peer::services::TraceHandler;
use sketchwire_peer::transport::ChannelOutbound;
use sketchwire_peer::SketchSession;

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cfg = match std::env::var("SKETCHWIRE_CONFIG") {
        Ok(path) => match config::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(%path, code = e.code().as_str(), error = %e, "config load failed");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => PeerConfig::default(),
    };

    let dispatcher = Arc::new(Dispatcher::new());
    for kind in ActionKind::ALL {
        dispatcher.register(Arc::new(TraceHandler::new(kind)));
    }
    let metrics = Arc::new(PeerMetrics::default());
    // Inspect never sends; the outbound half only satisfies the session.
    let (outbound, _sent) = ChannelOutbound::pair(cfg.limits.outbound_queue);
    let session = SketchSession::new(&cfg, Arc::new(outbound), dispatcher, metrics);

    tracing::info!(encoding = %cfg.peer.encoding, max_bytes = cfg.limits.max_envelope_bytes, "sketchwire-inspect reading stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failed = false;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                failed = true;
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match session.receive(line.as_bytes()).await {
            Ok(env) => match serde_json::to_string(&env) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "json render failed"),
            },
            Err(e) => {
                tracing::warn!(code = e.code().as_str(), error = %e, "envelope rejected");
                failed = true;
            }
        }
    }

    eprint!("{}", session.metrics().render());
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
