pub mod point;
pub mod toy;

pub use point::{DataPoint, one_hot};
pub use toy::two_clusters;
