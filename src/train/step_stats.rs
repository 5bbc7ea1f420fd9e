use serde::{Serialize, Deserialize};

/// Statistics for one completed training step.
///
/// `train_loop` sends one value per step over `TrainConfig::progress_tx`, and
/// the training session keeps the latest one for the display side to sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    /// 1-based step number within the current run.
    pub step: usize,
    /// Mean cost over the dataset after the step's update.
    pub cost: f64,
    /// Network's lowest cost after the checkpoint decision.
    pub lowest_cost: f64,
    /// Whether this step produced a new checkpoint.
    pub saved: bool,
    /// Wall-clock duration of the step in milliseconds.
    pub elapsed_ms: u64,
}
