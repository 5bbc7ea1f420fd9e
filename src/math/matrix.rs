use rand::Rng;
use std::ops::{Index, IndexMut};

/// Row-major matrix of `f64`, stored as one `Vec` per row.
///
/// Layer weights use `rows = num_nodes_in`, `cols = num_nodes_out`, so
/// `m[(i, j)]` is the weight from input node `i` to output node `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Fills a `rows x cols` matrix with values drawn uniformly from
    /// `[-1, 1]` and multiplied by `scale`.
    pub fn random_uniform<R: Rng + ?Sized>(rows: usize, cols: usize, scale: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for value in row.iter_mut() {
                *value = rng.gen_range(-1.0f64..=1.0) * scale;
            }
        }
        res
    }

    /// `self -= other * scale`, element-wise, in place.
    pub fn sub_scaled(&mut self, other: &Matrix, scale: f64) {
        assert_eq!(self.rows, other.rows, "row count mismatch");
        assert_eq!(self.cols, other.cols, "column count mismatch");
        for (row, other_row) in self.data.iter_mut().zip(other.data.iter()) {
            for (value, delta) in row.iter_mut().zip(other_row.iter()) {
                *value -= delta * scale;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.data.iter().flat_map(|row| row.iter())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i][j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i][j]
    }
}
