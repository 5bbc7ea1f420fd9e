use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::train::step_stats::StepStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `learn_rate`  — gradient-descent step size
/// - `max_steps`   — stop after this many steps; `None` runs until stopped
/// - `progress_tx` — optional channel; one `StepStats` is sent per completed
///                   step. If the receiver is dropped the loop ends.
/// - `stop_flag`   — optional atomic flag; when set from another thread the
///                   loop ends before starting its next step.
pub struct TrainConfig {
    pub learn_rate: f64,
    pub max_steps: Option<usize>,
    pub progress_tx: Option<mpsc::Sender<StepStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// A config with no progress channel and no stop flag.
    pub fn new(learn_rate: f64, max_steps: Option<usize>) -> Self {
        TrainConfig {
            learn_rate,
            max_steps,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
