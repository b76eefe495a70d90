//! Linear support vector classifier with Platt-scaled probabilities.
//!
//! The hinge-loss primal is solved with Pegasos (stochastic sub-gradient
//! descent with step `1 / (λ·t)` and projection onto the ball of radius
//! `1 / √λ`), with `λ = 1 / (C·n)`. A sigmoid `1 / (1 + exp(A·f + B))` is
//! then fitted to the training decision values to turn margins into
//! probabilities.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{
    Classifier, binary_probabilities, check_training_data, dimension_mismatch, sigmoid,
};
use crate::dataset::Label;
use crate::error::{Result, VerityError};
use crate::ml::sparse::SparseVector;

/// Sigmoid parameters mapping a decision value to `P(fake)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    /// Fit on decision values and labels (Newton's method with backtracking).
    pub fn fit(decision_values: &[f64], labels: &[Label]) -> Self {
        let prior1 = labels.iter().filter(|l| **l == Label::Fake).count() as f64;
        let prior0 = labels.len() as f64 - prior1;

        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|l| if *l == Label::Fake { hi_target } else { lo_target })
            .collect();

        let objective = |a: f64, b: f64| -> f64 {
            decision_values
                .iter()
                .zip(&targets)
                .map(|(&f, &t)| {
                    let z = f * a + b;
                    if z >= 0.0 {
                        t * z + (-z).exp().ln_1p()
                    } else {
                        (t - 1.0) * z + z.exp().ln_1p()
                    }
                })
                .sum()
        };

        let min_step = 1e-10;
        let sigma = 1e-12;
        let eps = 1e-5;

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(a, b);

        for _ in 0..100 {
            let (mut h11, mut h22, mut h21) = (sigma, sigma, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);
            for (&f, &t) in decision_values.iter().zip(&targets) {
                // p = P(fake | f), q = 1 - p
                let p = sigmoid(-(f * a + b));
                let q = 1.0 - p;
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < eps && g2.abs() < eps {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= min_step {
                let (new_a, new_b) = (a + step * da, b + step * db);
                let new_f = objective(new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < min_step {
                debug!("Platt scaling line search failed");
                break;
            }
        }

        PlattScaling { a, b }
    }

    /// `P(fake)` for a decision value.
    pub fn probability(&self, decision_value: f64) -> f64 {
        sigmoid(-(self.a * decision_value + self.b))
    }
}

/// Weight vector stored as `scale · v` so the Pegasos shrink step is O(1).
struct ScaledWeights {
    v: Vec<f64>,
    scale: f64,
    squared_norm: f64,
}

impl ScaledWeights {
    fn new(dimension: usize) -> Self {
        Self {
            v: vec![0.0; dimension],
            scale: 1.0,
            squared_norm: 0.0,
        }
    }

    /// `v · [x, 1]`, unscaled; the last component is the bias feature.
    fn raw_dot(&self, x: &SparseVector) -> f64 {
        x.dot(&self.v) + self.v[self.v.len() - 1]
    }

    fn dot(&self, x: &SparseVector) -> f64 {
        self.scale * self.raw_dot(x)
    }

    fn shrink(&mut self, factor: f64) {
        if factor <= 0.0 {
            self.v.iter_mut().for_each(|w| *w = 0.0);
            self.scale = 1.0;
            self.squared_norm = 0.0;
            return;
        }
        self.scale *= factor;
        if self.scale < 1e-9 {
            let scale = self.scale;
            self.v.iter_mut().for_each(|w| *w *= scale);
            self.squared_norm *= scale * scale;
            self.scale = 1.0;
        }
    }

    /// `w += coefficient · [x, 1]`
    fn add(&mut self, x: &SparseVector, coefficient: f64) {
        let c = coefficient / self.scale;
        let x_norm = x.values().iter().map(|v| v * v).sum::<f64>() + 1.0;
        self.squared_norm += 2.0 * c * self.raw_dot(x) + c * c * x_norm;

        for (i, value) in x.iter() {
            self.v[i] += c * value;
        }
        let bias = self.v.len() - 1;
        self.v[bias] += c;
    }

    fn norm(&self) -> f64 {
        self.scale * self.squared_norm.max(0.0).sqrt()
    }

    fn into_dense(self) -> Vec<f64> {
        let scale = self.scale;
        self.v.into_iter().map(|w| w * scale).collect()
    }
}

/// Linear SVM classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorClassifier {
    /// Feature weights followed by the bias.
    weights: Option<Vec<f64>>,
    platt: Option<PlattScaling>,
    c: f64,
    max_epochs: usize,
    tolerance: f64,
    seed: u64,
}

impl Default for SupportVectorClassifier {
    fn default() -> Self {
        Self::new(42)
    }
}

impl SupportVectorClassifier {
    /// Create a model with `C = 1.0` and at most 1000 epochs.
    pub fn new(seed: u64) -> Self {
        Self {
            weights: None,
            platt: None,
            c: 1.0,
            max_epochs: 1000,
            tolerance: 1e-6,
            seed,
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    pub fn platt(&self) -> Option<PlattScaling> {
        self.platt
    }

    /// Signed distance-like margin; positive leans fake.
    pub fn decision_function(&self, x: &SparseVector) -> Result<f64> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| VerityError::not_fitted(self.name()))?;
        Ok(linear_decision(weights, x))
    }
}

fn linear_decision(weights: &[f64], x: &SparseVector) -> f64 {
    match weights.split_last() {
        Some((bias, w)) => x.dot(w) + bias,
        None => 0.0,
    }
}

fn primal_objective(w: &ScaledWeights, lambda: f64, x: &[SparseVector], y: &[f64]) -> f64 {
    let hinge = x
        .iter()
        .zip(y)
        .map(|(row, &target)| (1.0 - target * w.dot(row)).max(0.0))
        .sum::<f64>()
        / x.len() as f64;
    0.5 * lambda * w.norm().powi(2) + hinge
}

impl Classifier for SupportVectorClassifier {
    fn fit(&mut self, x: &[SparseVector], y: &[Label]) -> Result<()> {
        let n_features = check_training_data(x, y)?;
        if self.c <= 0.0 {
            return Err(VerityError::invalid_argument("C must be positive"));
        }

        let n = x.len();
        let targets: Vec<f64> = y
            .iter()
            .map(|l| if *l == Label::Fake { 1.0 } else { -1.0 })
            .collect();
        let lambda = 1.0 / (self.c * n as f64);
        let radius = 1.0 / lambda.sqrt();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..n).collect();
        let mut w = ScaledWeights::new(n_features + 1);
        let mut t = 0usize;
        let mut prev_objective = f64::INFINITY;
        let mut epochs = 0;

        for _ in 0..self.max_epochs {
            order.shuffle(&mut rng);
            for &i in &order {
                t += 1;
                let eta = 1.0 / (lambda * t as f64);
                let margin = targets[i] * w.dot(&x[i]);

                w.shrink(1.0 - eta * lambda);
                if margin < 1.0 {
                    w.add(&x[i], eta * targets[i]);
                }

                let norm = w.norm();
                if norm > radius {
                    w.shrink(radius / norm);
                }
            }
            epochs += 1;

            let objective = primal_objective(&w, lambda, x, &targets);
            if (prev_objective - objective).abs() < self.tolerance {
                break;
            }
            prev_objective = objective;
        }

        let weights = w.into_dense();
        let decision_values: Vec<f64> = x.iter().map(|row| linear_decision(&weights, row)).collect();
        let platt = PlattScaling::fit(&decision_values, y);

        debug!(
            "Linear SVM fitted on {} samples in {} epochs (A = {:.4}, B = {:.4})",
            n, epochs, platt.a, platt.b
        );

        self.weights = Some(weights);
        self.platt = Some(platt);
        Ok(())
    }

    fn predict_proba(&self, x: &SparseVector) -> Result<[f64; 2]> {
        let decision = self.decision_function(x)?;
        let platt = self
            .platt
            .ok_or_else(|| VerityError::not_fitted(self.name()))?;
        Ok(binary_probabilities(platt.probability(decision)))
    }

    fn name(&self) -> &'static str {
        "svm"
    }

    fn is_fitted(&self) -> bool {
        self.weights.is_some() && self.platt.is_some()
    }

    fn check_dimension(&self, n_features: usize) -> Result<()> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| VerityError::not_fitted(self.name()))?;
        // The bias is stored after the feature weights.
        if weights.len() != n_features + 1 {
            return Err(dimension_mismatch(
                self.name(),
                n_features,
                weights.len().saturating_sub(1),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_decision_function_sign() {
        let (x, y) = toy_data();
        let mut svm = SupportVectorClassifier::default();
        svm.fit(&x, &y).unwrap();

        assert!(svm.decision_function(&fake_probe()).unwrap() > 0.0);
        assert!(svm.decision_function(&real_probe()).unwrap() < 0.0);
    }

    #[test]
    fn test_empty_weights_do_not_panic() {
        let (x, y) = toy_data();
        let mut svm = SupportVectorClassifier::default();
        svm.fit(&x, &y).unwrap();

        let mut value = serde_json::to_value(&svm).unwrap();
        value["weights"] = serde_json::json!([]);
        let emptied: SupportVectorClassifier = serde_json::from_value(value).unwrap();

        assert!(emptied.check_dimension(4).is_err());
        assert_eq!(emptied.decision_function(&fake_probe()).unwrap(), 0.0);
        let [p_real, p_fake] = emptied.predict_proba(&fake_probe()).unwrap();
        assert!((p_real + p_fake - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_platt_scaling_is_monotonic() {
        let values = [-2.0, -1.5, -1.0, -0.5, 0.5, 1.0, 1.5, 2.0];
        let labels = [
            Label::Real,
            Label::Real,
            Label::Real,
            Label::Fake,
            Label::Real,
            Label::Fake,
            Label::Fake,
            Label::Fake,
        ];
        let platt = PlattScaling::fit(&values, &labels);

        assert!(platt.a < 0.0);
        assert!(platt.probability(2.0) > 0.5);
        assert!(platt.probability(-2.0) < 0.5);
        assert!(platt.probability(1.0) > platt.probability(0.0));
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = toy_data();
        let mut a = SupportVectorClassifier::new(3).with_max_epochs(20);
        let mut b = SupportVectorClassifier::new(3).with_max_epochs(20);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }
}
