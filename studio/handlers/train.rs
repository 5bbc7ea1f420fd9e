use std::io::Cursor;
use serde::Serialize;
use tiny_http::Response;
use tracing::info;

use fdnet::train::Progress;

use crate::routes::{engine_error, ok};
use crate::state::SharedState;

#[derive(Serialize)]
struct StatusBody {
    #[serde(flatten)]
    progress: Progress,
    learn_rate: f64,
    layer_sizes: Vec<usize>,
    checkpoint_path: String,
}

/// Topology is read from the session: a restored checkpoint overrides the
/// configured layer sizes.
fn status_body(state: &SharedState) -> StatusBody {
    StatusBody {
        progress: state.session.progress(),
        learn_rate: state.config.learn_rate,
        layer_sizes: state.session.layer_sizes().to_vec(),
        checkpoint_path: state.config.checkpoint_path.display().to_string(),
    }
}

fn status(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    ok(&status_body(state))
}

/// `GET /status` — latest step statistics and whether training is running.
pub fn handle_status(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    status(state)
}

/// `POST /train/step` — runs exactly one step and returns its stats.
pub fn handle_step(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    match state.session.train_step() {
        Ok(stats) => ok(&stats),
        Err(e) => engine_error(&e),
    }
}

/// `POST /train/start` — trains continuously until `/train/stop`.
pub fn handle_start(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    info!("start requested");
    match state.session.start() {
        Ok(()) => status(state),
        Err(e) => engine_error(&e),
    }
}

/// `POST /train/stop` — stops after the step in flight.
pub fn handle_stop(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    info!("stop requested");
    match state.session.stop() {
        Ok(()) => status(state),
        Err(e) => engine_error(&e),
    }
}
