use rand::Rng;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::data::point::DataPoint;
use crate::error::{Error, Result};
use crate::layers::dense::Layer;
use crate::network::checkpoint::CheckpointStore;

/// Step used for every forward-difference gradient estimate.
pub const GRADIENT_STEP: f64 = 1e-4;

/// Initial value of [`Network::lowest_cost`] for a fresh network.
pub const INITIAL_LOWEST_COST: f64 = 1.0;

/// An ordered stack of dense layers plus the best mean cost seen so far.
///
/// `lowest_cost` never increases: it only moves when
/// [`Network::save_weights_and_biases`] observes a strictly lower cost and
/// the checkpoint write succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NetworkRecord", into = "NetworkRecord")]
pub struct Network {
    pub layers: Vec<Layer>,
    lowest_cost: f64,
}

impl Network {
    /// Builds zero-initialised layers from consecutive pairs of `layer_sizes`.
    pub fn new(layer_sizes: &[usize]) -> Result<Network> {
        if layer_sizes.len() < 2 {
            return Err(Error::InvalidTopology(format!(
                "need at least 2 layer sizes, got {}",
                layer_sizes.len()
            )));
        }
        if let Some(pos) = layer_sizes.iter().position(|&n| n == 0) {
            return Err(Error::InvalidTopology(format!("layer size at position {pos} is zero")));
        }
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Layer::new(pair[0], pair[1]))
            .collect();
        Ok(Network { layers, lowest_cost: INITIAL_LOWEST_COST })
    }

    /// Randomises every layer's weights; see [`Layer::initialize_random_weights`].
    pub fn randomize_weights<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            layer.initialize_random_weights(rng);
        }
    }

    pub fn lowest_cost(&self) -> f64 {
        self.lowest_cost
    }

    /// Widths from input to output, e.g. `[2, 6, 2]`.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layers.len() + 1);
        if let Some(first) = self.layers.first() {
            sizes.push(first.num_nodes_in());
        }
        sizes.extend(self.layers.iter().map(Layer::num_nodes_out));
        sizes
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.num_nodes_in() * l.num_nodes_out() + l.num_nodes_out())
            .sum()
    }

    /// Forward pass through every layer in order.
    pub fn calculate_outputs(&self, inputs: &[f64]) -> Result<Vec<f64>> {
        let mut current = inputs.to_vec();
        for layer in &self.layers {
            current = layer.calculate_outputs(&current)?;
        }
        Ok(current)
    }

    /// Summed squared error of one sample.
    pub fn cost(&self, data_point: &DataPoint) -> Result<f64> {
        let outputs = self.calculate_outputs(data_point.inputs())?;
        let expected = data_point.expected_outputs();
        if outputs.len() != expected.len() {
            return Err(Error::WidthMismatch { expected: outputs.len(), actual: expected.len() });
        }
        Ok(outputs
            .iter()
            .zip(expected.iter())
            .map(|(&a, &e)| Layer::node_cost(a, e))
            .sum())
    }

    /// Mean of [`Network::cost`] over `data`.
    pub fn cost_multiple(&self, data: &[DataPoint]) -> Result<f64> {
        if data.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let mut total_cost = 0.0;
        for data_point in data {
            total_cost += self.cost(data_point)?;
        }
        Ok(total_cost / data.len() as f64)
    }

    /// Index of the largest output; the first one wins a tie.
    pub fn classify(&self, inputs: &[f64]) -> Result<usize> {
        let outputs = self.calculate_outputs(inputs)?;
        let mut best = 0;
        for (i, &value) in outputs.iter().enumerate().skip(1) {
            if value > outputs[best] {
                best = i;
            }
        }
        Ok(best)
    }

    /// One full-batch gradient-descent step with forward-difference
    /// gradients.
    ///
    /// Every parameter is nudged by [`GRADIENT_STEP`] in turn (each layer's
    /// weights, then its biases), the mean cost over `data` is re-measured,
    /// and the parameter is restored to its exact previous value. All
    /// estimates share the cost measured before any nudge. Updates are only
    /// applied once every gradient is known.
    pub fn learn(&mut self, data: &[DataPoint], learn_rate: f64) -> Result<()> {
        let h = GRADIENT_STEP;
        let original_cost = self.cost_multiple(data)?;

        for l in 0..self.layers.len() {
            let (num_in, num_out) = (self.layers[l].num_nodes_in(), self.layers[l].num_nodes_out());

            for node_out in 0..num_out {
                for node_in in 0..num_in {
                    let saved = *self.layers[l].weight_mut(node_in, node_out);
                    *self.layers[l].weight_mut(node_in, node_out) = saved + h;
                    let perturbed = self.cost_multiple(data);
                    *self.layers[l].weight_mut(node_in, node_out) = saved;
                    let delta_cost = perturbed? - original_cost;
                    self.layers[l].set_weight_gradient(node_in, node_out, delta_cost / h);
                }
            }

            for node_out in 0..num_out {
                let saved = *self.layers[l].bias_mut(node_out);
                *self.layers[l].bias_mut(node_out) = saved + h;
                let perturbed = self.cost_multiple(data);
                *self.layers[l].bias_mut(node_out) = saved;
                let delta_cost = perturbed? - original_cost;
                self.layers[l].set_bias_gradient(node_out, delta_cost / h);
            }
        }

        for layer in &mut self.layers {
            layer.apply_gradients(learn_rate);
        }
        debug!(original_cost, learn_rate, "applied finite-difference gradients");
        Ok(())
    }

    /// Writes a checkpoint when `cost` is strictly below `lowest_cost`, then
    /// lowers `lowest_cost` to `cost`.
    ///
    /// The snapshot is taken before the update, so it carries the previous
    /// lowest cost. Returns whether a write happened; on a failed write
    /// `lowest_cost` is left unchanged.
    pub fn save_weights_and_biases(&mut self, cost: f64, store: &CheckpointStore) -> Result<bool> {
        if cost.is_nan() || cost >= self.lowest_cost {
            return Ok(false);
        }
        store.save(self)?;
        let previous = self.lowest_cost;
        self.lowest_cost = cost;
        info!(cost, previous, path = %store.path().display(), "new lowest cost, checkpoint written");
        Ok(true)
    }
}

/// On-disk form of a [`Network`].
#[derive(Serialize, Deserialize)]
struct NetworkRecord {
    layers: Vec<Layer>,
    lowest_cost: f64,
}

impl TryFrom<NetworkRecord> for Network {
    type Error = Error;

    fn try_from(record: NetworkRecord) -> Result<Network> {
        if record.layers.is_empty() {
            return Err(Error::InvalidTopology("network has no layers".into()));
        }
        for (i, pair) in record.layers.windows(2).enumerate() {
            if pair[0].num_nodes_out() != pair[1].num_nodes_in() {
                return Err(Error::InvalidTopology(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i,
                    pair[0].num_nodes_out(),
                    i + 1,
                    pair[1].num_nodes_in()
                )));
            }
        }
        Ok(Network { layers: record.layers, lowest_cost: record.lowest_cost })
    }
}

impl From<Network> for NetworkRecord {
    fn from(network: Network) -> NetworkRecord {
        NetworkRecord { layers: network.layers, lowest_cost: network.lowest_cost }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::tempdir;

    fn xor_like() -> Vec<DataPoint> {
        vec![
            DataPoint::new(vec![1.0, 0.0], 0, 2).unwrap(),
            DataPoint::new(vec![0.0, 1.0], 1, 2).unwrap(),
            DataPoint::new(vec![1.0, 1.0], 0, 2).unwrap(),
        ]
    }

    fn seeded(sizes: &[usize], seed: u64) -> Network {
        let mut net = Network::new(sizes).unwrap();
        net.randomize_weights(&mut StdRng::seed_from_u64(seed));
        net
    }

    #[test]
    fn new_wires_consecutive_sizes() {
        let net = Network::new(&[2, 6, 6, 2]).unwrap();
        assert_eq!(net.layers.len(), 3);
        assert_eq!(net.layer_sizes(), vec![2, 6, 6, 2]);
        assert_eq!(net.lowest_cost(), 1.0);
        assert_eq!(net.parameter_count(), 2 * 6 + 6 + 6 * 6 + 6 + 6 * 2 + 2);
    }

    #[test]
    fn new_rejects_bad_topologies() {
        assert!(matches!(Network::new(&[3]), Err(Error::InvalidTopology(_))));
        assert!(matches!(Network::new(&[2, 0, 1]), Err(Error::InvalidTopology(_))));
    }

    #[test]
    fn zero_network_outputs_half() {
        let net = Network::new(&[2, 3, 4]).unwrap();
        assert_eq!(net.calculate_outputs(&[5.0, -5.0]).unwrap(), vec![0.5; 4]);
    }

    #[test]
    fn cost_sums_node_costs() {
        let net = Network::new(&[2, 2]).unwrap();
        let p = DataPoint::new(vec![1.0, 1.0], 1, 2).unwrap();
        // outputs are both 0.5 -> 0.25 + 0.25
        assert_relative_eq!(net.cost(&p).unwrap(), 0.5);
    }

    #[test]
    fn cost_rejects_target_width_mismatch() {
        let net = Network::new(&[2, 2]).unwrap();
        let p = DataPoint::new(vec![1.0, 1.0], 0, 3).unwrap();
        assert!(matches!(net.cost(&p), Err(Error::WidthMismatch { expected: 2, actual: 3 })));
    }

    #[test]
    fn cost_multiple_is_mean_of_costs() {
        let net = seeded(&[2, 3, 2], 5);
        let data = xor_like();
        let mean = data.iter().map(|p| net.cost(p).unwrap()).sum::<f64>() / data.len() as f64;
        assert_relative_eq!(net.cost_multiple(&data).unwrap(), mean, epsilon = 1e-15);
    }

    #[test]
    fn cost_multiple_rejects_empty_dataset() {
        let net = Network::new(&[2, 2]).unwrap();
        assert!(matches!(net.cost_multiple(&[]), Err(Error::EmptyDataset)));
    }

    #[test]
    fn classify_picks_first_maximum() {
        let net = Network::new(&[2, 3]).unwrap();
        // every output is 0.5, so the first index wins
        assert_eq!(net.classify(&[1.0, 2.0]).unwrap(), 0);

        let mut net = Network::new(&[1, 3]).unwrap();
        net.layers[0].set_biases(vec![0.0, -2.0, -2.0]).unwrap();
        assert_eq!(net.classify(&[0.0]).unwrap(), 1);
    }

    #[test]
    fn zero_learn_rate_keeps_parameters_and_fills_gradients() {
        let mut net = seeded(&[2, 3, 2], 9);
        let before = net.clone();
        net.learn(&xor_like(), 0.0).unwrap();
        for (a, b) in net.layers.iter().zip(before.layers.iter()) {
            assert_eq!(a.weights(), b.weights());
            assert_eq!(a.biases(), b.biases());
        }
        let any_nonzero = net
            .layers
            .iter()
            .any(|l| l.cost_gradients_w().iter().any(|&g| g != 0.0) || l.cost_gradients_b().iter().any(|&g| g != 0.0));
        assert!(any_nonzero);
    }

    #[test]
    fn learn_fails_cleanly_on_empty_dataset() {
        let mut net = seeded(&[2, 2], 1);
        let before = net.clone();
        assert!(matches!(net.learn(&[], 0.5), Err(Error::EmptyDataset)));
        assert_eq!(net.layers[0].weights(), before.layers[0].weights());
    }

    #[test]
    fn learning_reduces_cost() {
        let mut net = seeded(&[2, 4, 2], 21);
        let data = xor_like();
        let start = net.cost_multiple(&data).unwrap();
        for _ in 0..50 {
            net.learn(&data, 0.5).unwrap();
        }
        assert!(net.cost_multiple(&data).unwrap() < start);
    }

    #[test]
    fn save_only_on_strict_improvement() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("train.json"));
        let mut net = Network::new(&[2, 2]).unwrap();

        assert!(!net.save_weights_and_biases(1.0, &store).unwrap());
        assert!(!store.path().exists());

        assert!(net.save_weights_and_biases(0.4, &store).unwrap());
        assert_eq!(net.lowest_cost(), 0.4);
        assert_eq!(store.load().unwrap().unwrap().lowest_cost(), 1.0);
        let written = std::fs::read_to_string(store.path()).unwrap();

        assert!(!net.save_weights_and_biases(0.4, &store).unwrap());
        assert!(!net.save_weights_and_biases(0.9, &store).unwrap());
        assert!(!net.save_weights_and_biases(f64::NAN, &store).unwrap());
        assert_eq!(net.lowest_cost(), 0.4);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), written);
    }

    #[test]
    fn failed_write_keeps_lowest_cost() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("missing").join("train.json"));
        let mut net = Network::new(&[2, 2]).unwrap();
        assert!(matches!(net.save_weights_and_biases(0.1, &store), Err(Error::Io(_))));
        assert_eq!(net.lowest_cost(), 1.0);
    }

    #[test]
    fn snapshot_keeps_the_lowest_cost_from_before_the_save() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("train.json"));
        let mut net = Network::new(&[2, 2]).unwrap();

        assert!(net.save_weights_and_biases(0.4, &store).unwrap());
        assert_eq!(store.load().unwrap().unwrap().lowest_cost(), 1.0);

        assert!(net.save_weights_and_biases(0.25, &store).unwrap());
        assert_eq!(net.lowest_cost(), 0.25);
        let mut back = store.load().unwrap().unwrap();
        assert_eq!(back.lowest_cost(), 0.4);

        // the restored network saves again at the cost it was written for
        assert!(back.save_weights_and_biases(0.25, &store).unwrap());
    }

    #[test]
    fn deserialization_checks_wiring() {
        let net = Network::new(&[2, 3, 1]).unwrap();
        let mut value = serde_json::to_value(&net).unwrap();
        value["layers"][1]["num_nodes_in"] = serde_json::json!(4);
        value["layers"][1]["weights"] = serde_json::json!([[0.0], [0.0], [0.0], [0.0]]);
        assert!(serde_json::from_value::<Network>(value).is_err());
    }
}
