//! L2-regularized logistic regression.

use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    Classifier, binary_probabilities, check_training_data, dimension_mismatch, sigmoid,
};
use crate::dataset::Label;
use crate::error::{Result, VerityError};
use crate::ml::sparse::SparseVector;

/// Logistic regression trained with full-batch gradient descent.
///
/// Minimizes the mean binary cross-entropy plus `||w||² / (2·C·n)`, the
/// per-sample form of the usual `C`-weighted objective. The intercept is not
/// penalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    coefficients: Option<Vec<f64>>,
    /// Intercept term
    intercept: f64,
    /// Inverse regularization strength
    c: f64,
    learning_rate: f64,
    max_iter: usize,
    /// Convergence tolerance on the change in cost
    tolerance: f64,
    /// Recorded for reproducibility; gradient descent itself is deterministic.
    random_state: u64,
    /// Iterations used by the last fit
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(42)
    }
}

impl LogisticRegression {
    /// Create a model with `C = 1.0`, 1000 iterations and tolerance `1e-6`.
    pub fn new(random_state: u64) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            c: 1.0,
            learning_rate: 1.0,
            max_iter: 1000,
            tolerance: 1e-6,
            random_state,
            n_iter: 0,
        }
    }

    /// Set the inverse regularization strength.
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn coefficients(&self) -> Option<&[f64]> {
        self.coefficients.as_deref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Raw linear score `w·x + b`.
    pub fn decision_function(&self, x: &SparseVector) -> Result<f64> {
        let weights = self
            .coefficients
            .as_ref()
            .ok_or_else(|| VerityError::not_fitted(self.name()))?;
        Ok(x.dot(weights) + self.intercept)
    }

    /// Regularized log loss (binary cross-entropy).
    fn cost(&self, weights: &[f64], bias: f64, x: &[SparseVector], y: &[f64]) -> f64 {
        let eps = 1e-15;
        let n = x.len() as f64;

        let loss = x
            .iter()
            .zip(y)
            .map(|(row, &target)| {
                let p = sigmoid(row.dot(weights) + bias).clamp(eps, 1.0 - eps);
                -(target * p.ln() + (1.0 - target) * (1.0 - p).ln())
            })
            .sum::<f64>()
            / n;

        let penalty = weights.iter().map(|w| w * w).sum::<f64>() / (2.0 * self.c * n);
        loss + penalty
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &[SparseVector], y: &[Label]) -> Result<()> {
        let n_features = check_training_data(x, y)?;
        if self.c <= 0.0 {
            return Err(VerityError::invalid_argument("C must be positive"));
        }

        let targets: Vec<f64> = y.iter().map(|l| l.as_f64()).collect();
        let n = x.len() as f64;

        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;
        let mut prev_cost = self.cost(&weights, bias, x, &targets);
        let mut n_iter = self.max_iter;

        for iter in 0..self.max_iter {
            let mut grad_w = vec![0.0; n_features];
            let mut grad_b = 0.0;

            for (row, &target) in x.iter().zip(&targets) {
                let error = sigmoid(row.dot(&weights) + bias) - target;
                for (i, v) in row.iter() {
                    grad_w[i] += error * v;
                }
                grad_b += error;
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                let gradient = g / n + *w / (self.c * n);
                *w -= self.learning_rate * gradient;
            }
            bias -= self.learning_rate * grad_b / n;

            let cost = self.cost(&weights, bias, x, &targets);
            if (prev_cost - cost).abs() < self.tolerance {
                n_iter = iter + 1;
                break;
            }
            prev_cost = cost;
        }

        debug!(
            "Logistic regression fitted on {} samples x {} features in {} iterations (cost {:.6})",
            x.len(),
            n_features,
            n_iter,
            prev_cost
        );

        self.coefficients = Some(weights);
        self.intercept = bias;
        self.n_iter = n_iter;
        Ok(())
    }

    fn predict_proba(&self, x: &SparseVector) -> Result<[f64; 2]> {
        let z = self.decision_function(x)?;
        Ok(binary_probabilities(sigmoid(z)))
    }

    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    fn check_dimension(&self, n_features: usize) -> Result<()> {
        let weights = self
            .coefficients
            .as_ref()
            .ok_or_else(|| VerityError::not_fitted(self.name()))?;
        if weights.len() != n_features {
            return Err(dimension_mismatch(self.name(), n_features, weights.len()));
        }
        Ok(())
    }
}
