pub mod activation;

pub use activation::{activation, node_cost};
