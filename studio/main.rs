//! fdnet Studio
//!
//! A small JSON-over-HTTP surface for a running training session, served by
//! a synchronous tiny_http server.
//!
//! Run with:
//!   cargo run --bin studio --release
//! Then, for example:
//!   curl -X POST http://127.0.0.1:7878/train/start
//!   curl http://127.0.0.1:7878/status
//!   curl -d inputs=10,12 http://127.0.0.1:7878/classify
//!
//! Every call goes through one training session, so reads never observe a
//! half-finished step.

mod state;
mod routes;
mod handlers;
mod util;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tiny_http::Server;
use tracing::{info, Level};

use fdnet::config::RunArgs;
use fdnet::logging::init_logging;
use fdnet::Session;

use state::StudioState;

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Serve a finite-difference training session over HTTP")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,

    #[command(flatten)]
    run: RunArgs,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level: Level = cli.log_level.parse()?;
    init_logging(level)?;

    let config = cli.run.resolve().context("loading configuration")?;
    let prepared = config
        .prepare()
        .with_context(|| format!("preparing network from {}", config.checkpoint_path.display()))?;
    info!(restored = prepared.restored, layers = ?prepared.network.layer_sizes(), "network ready");

    let session = Session::spawn(prepared.network, prepared.data, prepared.store, config.learn_rate);
    let shared_state = Arc::new(StudioState { session, config });

    let server = Server::http(&cli.addr).map_err(|e| anyhow!("failed to bind {}: {e}", cli.addr))?;
    info!(addr = %cli.addr, "studio listening");

    // One thread per request: `/train/step` blocks for a whole step and
    // must not stall status polling.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    Ok(())
}
