use crate::error::{Error, Result};

/// One training sample: an input vector paired with its class target.
///
/// Fields are read-only after construction; build a new point instead of
/// editing one.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    inputs: Vec<f64>,
    label: usize,
    num_labels: usize,
    expected_outputs: Vec<f64>,
}

/// A vector of `num_labels` zeros with `1.0` at `index`.
pub fn one_hot(index: usize, num_labels: usize) -> Result<Vec<f64>> {
    if index >= num_labels {
        return Err(Error::InvalidLabel { label: index, num_labels });
    }
    let mut v = vec![0.0; num_labels];
    v[index] = 1.0;
    Ok(v)
}

impl DataPoint {
    /// Builds a point whose expected outputs are the one-hot encoding of
    /// `label`.
    pub fn new(inputs: Vec<f64>, label: usize, num_labels: usize) -> Result<DataPoint> {
        let expected_outputs = one_hot(label, num_labels)?;
        Ok(DataPoint { inputs, label, num_labels, expected_outputs })
    }

    /// Builds a point with caller-supplied targets. No relationship between
    /// `label` and `expected_outputs` is checked.
    pub fn with_expected_outputs(
        inputs: Vec<f64>,
        label: usize,
        num_labels: usize,
        expected_outputs: Vec<f64>,
    ) -> DataPoint {
        DataPoint { inputs, label, num_labels, expected_outputs }
    }

    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    pub fn label(&self) -> usize {
        self.label
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn expected_outputs(&self) -> &[f64] {
        &self.expected_outputs
    }
}
