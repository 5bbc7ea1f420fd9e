use rand::Rng;

use crate::data::point::DataPoint;
use crate::error::Result;

/// Two overlapping square clusters in the plane.
///
/// Emits `positive` points with both coordinates uniform in `[2, 25)` and
/// label 1, followed by `negative` points with both coordinates uniform in
/// `[0, 100)` and label 0. Targets are the one-hot encoding of the label.
/// The caller owns the RNG so that one seeded stream can also drive weight
/// initialization afterwards.
pub fn two_clusters<R: Rng + ?Sized>(rng: &mut R, positive: usize, negative: usize) -> Result<Vec<DataPoint>> {
    let mut points = Vec::with_capacity(positive + negative);
    for _ in 0..positive {
        let inputs: Vec<f64> = vec![rng.gen_range(2.0..25.0), rng.gen_range(2.0..25.0)];
        points.push(DataPoint::new(inputs, 1, 2)?);
    }
    for _ in 0..negative {
        let inputs: Vec<f64> = vec![rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)];
        points.push(DataPoint::new(inputs, 0, 2)?);
    }
    Ok(points)
}
