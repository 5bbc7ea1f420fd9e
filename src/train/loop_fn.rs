use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, info};

use crate::data::point::DataPoint;
use crate::error::Result;
use crate::network::checkpoint::CheckpointStore;
use crate::network::network::Network;
use crate::train::step_stats::StepStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Runs one training step: learn, re-measure the mean cost, and checkpoint
/// on improvement. `step` is only used to label the returned stats.
pub fn train_step(
    network: &mut Network,
    data: &[DataPoint],
    store: &CheckpointStore,
    learn_rate: f64,
    step: usize,
) -> Result<StepStats> {
    let t_start = Instant::now();

    network.learn(data, learn_rate)?;
    let cost = network.cost_multiple(data)?;
    let saved = network.save_weights_and_biases(cost, store)?;

    let stats = StepStats {
        step,
        cost,
        lowest_cost: network.lowest_cost(),
        saved,
        elapsed_ms: t_start.elapsed().as_millis() as u64,
    };
    debug!(step, cost, saved, elapsed_ms = stats.elapsed_ms, "training step finished");
    Ok(stats)
}

/// Repeats [`train_step`] until a stop condition is met and returns the
/// stats of the last completed step (`None` if no step ran).
///
/// # Termination
/// The loop ends when:
/// - `config.max_steps` steps have completed,
/// - `config.stop_flag` is set (checked before each step), **or**
/// - the `progress_tx` receiver has been dropped.
///
/// A step is never interrupted part-way; errors abort the loop and are
/// returned as-is.
pub fn train_loop(
    network: &mut Network,
    data: &[DataPoint],
    store: &CheckpointStore,
    config: &TrainConfig,
) -> Result<Option<StepStats>> {
    info!(
        learn_rate = config.learn_rate,
        max_steps = ?config.max_steps,
        parameters = network.parameter_count(),
        samples = data.len(),
        "training started"
    );

    let mut last = None;
    let mut step = 0;

    loop {
        if config.max_steps.is_some_and(|max| step >= max) {
            break;
        }
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                break;
            }
        }

        step += 1;
        let stats = train_step(network, data, store, config.learn_rate, step)?;
        last = Some(stats.clone());

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                break;
            }
        }
    }

    info!(steps = step, lowest_cost = network.lowest_cost(), "training stopped");
    Ok(last)
}
