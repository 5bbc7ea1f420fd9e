use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::{activation, node_cost};
use crate::error::{Error, Result, ShapeViolation};
use crate::math::matrix::Matrix;

/// One dense layer: `num_nodes_in x num_nodes_out` weights, one bias per
/// output node, and scratch buffers holding the last estimated cost
/// gradients.
///
/// Only weights and biases are persisted; the gradient buffers are rebuilt
/// zeroed when a layer is deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "LayerRecord", into = "LayerRecord")]
pub struct Layer {
    num_nodes_in: usize,
    num_nodes_out: usize,
    weights: Matrix,
    biases: Vec<f64>,
    cost_gradients_w: Matrix,
    cost_gradients_b: Vec<f64>,
}

impl Layer {
    /// A layer with all-zero weights and biases.
    pub fn new(num_nodes_in: usize, num_nodes_out: usize) -> Layer {
        Layer {
            num_nodes_in,
            num_nodes_out,
            weights: Matrix::zeros(num_nodes_in, num_nodes_out),
            biases: vec![0.0; num_nodes_out],
            cost_gradients_w: Matrix::zeros(num_nodes_in, num_nodes_out),
            cost_gradients_b: vec![0.0; num_nodes_out],
        }
    }

    /// A layer with optional initial parameters; omitted ones start at zero.
    ///
    /// Weights and biases are both validated before failing, so the error
    /// lists every violated dimension at once.
    pub fn with_parameters(
        num_nodes_in: usize,
        num_nodes_out: usize,
        weights: Option<Vec<Vec<f64>>>,
        biases: Option<Vec<f64>>,
    ) -> Result<Layer> {
        let mut layer = Layer::new(num_nodes_in, num_nodes_out);
        let mut violations = Vec::new();
        if let Some(w) = &weights {
            violations.extend(layer.weight_violations(w));
        }
        if let Some(b) = &biases {
            violations.extend(layer.bias_violations(b));
        }
        if !violations.is_empty() {
            return Err(Error::ShapeMismatch(violations));
        }
        if let Some(w) = weights {
            layer.weights = Matrix { rows: num_nodes_in, cols: num_nodes_out, data: w };
        }
        if let Some(b) = biases {
            layer.biases = b;
        }
        Ok(layer)
    }

    pub fn num_nodes_in(&self) -> usize {
        self.num_nodes_in
    }

    pub fn num_nodes_out(&self) -> usize {
        self.num_nodes_out
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn cost_gradients_w(&self) -> &Matrix {
        &self.cost_gradients_w
    }

    pub fn cost_gradients_b(&self) -> &[f64] {
        &self.cost_gradients_b
    }

    fn weight_violations(&self, weights: &[Vec<f64>]) -> Vec<ShapeViolation> {
        let mut violations = Vec::new();
        if weights.len() != self.num_nodes_in {
            violations.push(ShapeViolation::WeightRows {
                expected: self.num_nodes_in,
                actual: weights.len(),
            });
        }
        for (row, values) in weights.iter().enumerate() {
            if values.len() != self.num_nodes_out {
                violations.push(ShapeViolation::WeightRowLength {
                    row,
                    expected: self.num_nodes_out,
                    actual: values.len(),
                });
            }
        }
        violations
    }

    fn bias_violations(&self, biases: &[f64]) -> Vec<ShapeViolation> {
        if biases.len() != self.num_nodes_out {
            vec![ShapeViolation::BiasLength { expected: self.num_nodes_out, actual: biases.len() }]
        } else {
            vec![]
        }
    }

    /// Replaces the whole weight matrix. Nothing changes on error.
    pub fn set_weights(&mut self, weights: Vec<Vec<f64>>) -> Result<()> {
        let violations = self.weight_violations(&weights);
        if !violations.is_empty() {
            return Err(Error::ShapeMismatch(violations));
        }
        self.weights = Matrix { rows: self.num_nodes_in, cols: self.num_nodes_out, data: weights };
        Ok(())
    }

    /// Replaces the whole bias vector. Nothing changes on error.
    pub fn set_biases(&mut self, biases: Vec<f64>) -> Result<()> {
        let violations = self.bias_violations(&biases);
        if !violations.is_empty() {
            return Err(Error::ShapeMismatch(violations));
        }
        self.biases = biases;
        Ok(())
    }

    /// Forward pass through this layer alone.
    pub fn calculate_outputs(&self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.num_nodes_in {
            return Err(Error::WidthMismatch { expected: self.num_nodes_in, actual: inputs.len() });
        }
        let outputs = (0..self.num_nodes_out)
            .map(|node_out| {
                let weighted_input = inputs
                    .iter()
                    .enumerate()
                    .fold(self.biases[node_out], |acc, (node_in, x)| {
                        acc + x * self.weights[(node_in, node_out)]
                    });
                activation(weighted_input)
            })
            .collect();
        Ok(outputs)
    }

    /// Squared error between one output activation and its target.
    pub fn node_cost(output_activation: f64, expected_output: f64) -> f64 {
        node_cost(output_activation, expected_output)
    }

    /// Subtracts `learn_rate * gradient` from every weight and bias.
    pub fn apply_gradients(&mut self, learn_rate: f64) {
        self.weights.sub_scaled(&self.cost_gradients_w, learn_rate);
        for (bias, gradient) in self.biases.iter_mut().zip(self.cost_gradients_b.iter()) {
            *bias -= gradient * learn_rate;
        }
    }

    /// Draws every weight uniformly from `[-1, 1]` scaled by
    /// `1 / sqrt(num_nodes_in)`. Biases are left as they are.
    pub fn initialize_random_weights<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let scale = 1.0 / (self.num_nodes_in as f64).sqrt();
        self.weights = Matrix::random_uniform(self.num_nodes_in, self.num_nodes_out, scale, rng);
    }

    pub(crate) fn weight_mut(&mut self, node_in: usize, node_out: usize) -> &mut f64 {
        &mut self.weights[(node_in, node_out)]
    }

    pub(crate) fn bias_mut(&mut self, node_out: usize) -> &mut f64 {
        &mut self.biases[node_out]
    }

    pub(crate) fn set_weight_gradient(&mut self, node_in: usize, node_out: usize, gradient: f64) {
        self.cost_gradients_w[(node_in, node_out)] = gradient;
    }

    pub(crate) fn set_bias_gradient(&mut self, node_out: usize, gradient: f64) {
        self.cost_gradients_b[node_out] = gradient;
    }
}

/// On-disk form of a [`Layer`].
#[derive(Serialize, Deserialize)]
struct LayerRecord {
    num_nodes_in: usize,
    num_nodes_out: usize,
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

impl TryFrom<LayerRecord> for Layer {
    type Error = Error;

    fn try_from(record: LayerRecord) -> Result<Layer> {
        if record.num_nodes_in == 0 || record.num_nodes_out == 0 {
            return Err(Error::InvalidTopology(format!(
                "layer of shape {}x{} has no nodes",
                record.num_nodes_in, record.num_nodes_out
            )));
        }
        Layer::with_parameters(
            record.num_nodes_in,
            record.num_nodes_out,
            Some(record.weights),
            Some(record.biases),
        )
    }
}

impl From<Layer> for LayerRecord {
    fn from(layer: Layer) -> LayerRecord {
        LayerRecord {
            num_nodes_in: layer.num_nodes_in,
            num_nodes_out: layer.num_nodes_out,
            weights: layer.weights.data,
            biases: layer.biases,
        }
    }
}
