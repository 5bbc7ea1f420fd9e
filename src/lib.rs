pub mod error;
pub mod math;
pub mod activation;
pub mod data;
pub mod layers;
pub mod network;
pub mod train;
pub mod config;
pub mod logging;

// Convenience re-exports
pub use error::{Error, Result, ShapeViolation};
pub use math::matrix::Matrix;
pub use data::point::DataPoint;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use network::checkpoint::CheckpointStore;
pub use train::{train_loop, train_step, Session, SessionHandle, StepStats, TrainConfig};
pub use config::RunConfig;
