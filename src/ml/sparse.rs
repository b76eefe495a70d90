//! Sparse feature vectors.

use serde::{Deserialize, Serialize};

/// A sparse vector over a fixed-dimension feature space.
///
/// Indices are strictly increasing and every stored value is non-zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseVector {
    dimension: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Create an all-zero vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        SparseVector {
            dimension,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a vector from `(index, value)` pairs.
    ///
    /// Pairs are sorted, duplicate indices are summed, zeros and indices
    /// outside `dimension` are dropped.
    pub fn from_pairs(dimension: usize, mut pairs: Vec<(usize, f64)>) -> Self {
        pairs.sort_by_key(|&(index, _)| index);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (index, value) in pairs {
            if index >= dimension {
                continue;
            }
            match indices.last() {
                Some(&last) if last == index => {
                    if let Some(v) = values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    indices.push(index);
                    values.push(value);
                }
            }
        }

        let (indices, values) = indices
            .into_iter()
            .zip(values)
            .filter(|&(_, v)| v != 0.0)
            .unzip();

        SparseVector {
            dimension,
            indices,
            values,
        }
    }

    /// Build a sparse vector from a dense slice.
    pub fn from_dense(dense: &[f64]) -> Self {
        let pairs = dense
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .collect();
        Self::from_pairs(dense.len(), pairs)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `index`, zero when absent.
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product with a dense weight vector.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter()
            .filter_map(|(i, v)| dense.get(i).map(|w| w * v))
            .sum()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit L2 norm; the zero vector is left unchanged.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    /// Expand into a dense vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dimension];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let v = SparseVector::from_pairs(5, vec![(3, 1.0), (1, 2.0), (3, 0.5), (9, 4.0), (0, 0.0)]);

        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.values(), &[2.0, 1.5]);
        assert_eq!(v.dimension(), 5);
        assert_eq!(v.get(3), 1.5);
        assert_eq!(v.get(2), 0.0);
    }

    #[test]
    fn test_dot_and_normalize() {
        let mut v = SparseVector::from_dense(&[3.0, 0.0, 4.0]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.dot(&[1.0, 10.0, 2.0]), 11.0);

        v.normalize();
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert_eq!(v.to_dense(), vec![0.6, 0.0, 0.8]);
    }

    #[test]
    fn test_zero_vector() {
        let mut v = SparseVector::zeros(4);
        v.normalize();
        assert!(v.is_empty());
        assert_eq!(v.norm(), 0.0);
        assert_eq!(v.to_dense(), vec![0.0; 4]);
    }
}
