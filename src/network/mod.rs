pub mod checkpoint;
pub mod network;

pub use checkpoint::{CheckpointStore, DEFAULT_CHECKPOINT_PATH};
pub use network::{Network, GRADIENT_STEP, INITIAL_LOWEST_COST};
