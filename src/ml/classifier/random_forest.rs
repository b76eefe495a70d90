//! Random forest of Gini decision trees over sparse features.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Classifier, binary_probabilities, check_training_data};
use crate::dataset::Label;
use crate::error::{Result, VerityError};
use crate::ml::sparse::SparseVector;

/// Random forest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Candidate features per split (sqrt of the dimension if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Class frequencies `[P(real), P(fake)]` of the training rows that reached the leaf.
    Leaf { probabilities: [f64; 2] },
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, x: &SparseVector) -> [f64; 2] {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { probabilities } => return *probabilities,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x.get(*feature) <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Largest feature index any split in this subtree tests.
    pub fn max_feature(&self) -> Option<usize> {
        match self {
            TreeNode::Leaf { .. } => None,
            TreeNode::Split {
                feature,
                left,
                right,
                ..
            } => [Some(*feature), left.max_feature(), right.max_feature()]
                .into_iter()
                .flatten()
                .max(),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Grows one classification tree.
struct TreeBuilder<'a> {
    x: &'a [SparseVector],
    y: &'a [Label],
    max_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
}

impl TreeBuilder<'_> {
    fn build(&self, indices: &[usize], depth: usize, rng: &mut StdRng) -> TreeNode {
        let counts = self.class_counts(indices);
        let n = indices.len();

        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || n < self.min_samples_split || counts[0] == 0 || counts[1] == 0 {
            return leaf(counts);
        }

        // Candidate features are drawn from those active in this node; if none
        // of the drawn ones separates the rows, the rest are tried as well.
        let mut active: Vec<usize> = indices
            .iter()
            .flat_map(|&i| self.x[i].indices().iter().copied())
            .collect();
        active.sort_unstable();
        active.dedup();
        active.shuffle(rng);

        let (drawn, rest) = active.split_at(self.max_features.min(active.len()));
        let best = self
            .best_split(indices, drawn)
            .or_else(|| self.best_split(indices, rest));

        let Some(split) = best else {
            return leaf(counts);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[i].get(split.feature) <= split.threshold);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(&left, depth + 1, rng)),
            right: Box::new(self.build(&right, depth + 1, rng)),
        }
    }

    fn best_split(&self, indices: &[usize], features: &[usize]) -> Option<SplitCandidate> {
        let parent = gini(self.class_counts(indices));
        let n = indices.len() as f64;
        let mut best: Option<SplitCandidate> = None;

        for &feature in features {
            let mut column: Vec<(f64, Label)> = indices
                .iter()
                .map(|&i| (self.x[i].get(feature), self.y[i]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = [0usize; 2];
            let mut right = self.class_counts(indices);
            for k in 0..column.len() - 1 {
                let (value, label) = column[k];
                left[label.index()] += 1;
                right[label.index()] -= 1;

                let next = column[k + 1].0;
                if next <= value {
                    continue;
                }

                let n_left = (k + 1) as f64;
                let impurity = (n_left * gini(left) + (n - n_left) * gini(right)) / n;
                if impurity < parent - 1e-12
                    && best.as_ref().is_none_or(|b| impurity < b.impurity)
                {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (value + next) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }

    fn class_counts(&self, indices: &[usize]) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for &i in indices {
            counts[self.y[i].index()] += 1;
        }
        counts
    }
}

fn leaf(counts: [usize; 2]) -> TreeNode {
    let total = (counts[0] + counts[1]).max(1) as f64;
    TreeNode::Leaf {
        probabilities: [counts[0] as f64 / total, counts[1] as f64 / total],
    }
}

fn gini(counts: [usize; 2]) -> f64 {
    let total = (counts[0] + counts[1]) as f64;
    if total == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / total;
    let p1 = counts[1] as f64 / total;
    1.0 - p0 * p0 - p1 * p1
}

/// Random forest classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<TreeNode>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(42)
    }
}

impl RandomForest {
    /// Create a forest of 100 fully grown trees seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_config(ForestConfig {
            seed,
            ..Default::default()
        })
    }

    pub fn with_config(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[TreeNode] {
        &self.trees
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &[SparseVector], y: &[Label]) -> Result<()> {
        let n_features = check_training_data(x, y)?;
        if self.config.n_trees == 0 {
            return Err(VerityError::invalid_argument("n_trees must be positive"));
        }

        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .max(1);

        let builder = TreeBuilder {
            x,
            y,
            max_features,
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split.max(2),
        };

        let n = x.len();
        let trees: Vec<TreeNode> = (0..self.config.n_trees)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(i as u64));
                let indices: Vec<usize> = if self.config.bootstrap {
                    (0..n).map(|_| rng.random_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                builder.build(&indices, 0, &mut rng)
            })
            .collect();

        debug!(
            "Random forest fitted: {} trees, {} candidate features per split, max depth {}",
            trees.len(),
            max_features,
            trees.iter().map(TreeNode::depth).max().unwrap_or(0)
        );

        self.trees = trees;
        Ok(())
    }

    fn predict_proba(&self, x: &SparseVector) -> Result<[f64; 2]> {
        if self.trees.is_empty() {
            return Err(VerityError::not_fitted(self.name()));
        }

        let p_fake = self.trees.iter().map(|t| t.predict(x)[1]).sum::<f64>()
            / self.trees.len() as f64;
        Ok(binary_probabilities(p_fake))
    }

    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn check_dimension(&self, n_features: usize) -> Result<()> {
        if self.trees.is_empty() {
            return Err(VerityError::not_fitted(self.name()));
        }
        match self.trees.iter().filter_map(TreeNode::max_feature).max() {
            Some(feature) if feature >= n_features => Err(VerityError::invalid_argument(format!(
                "{} splits on feature {feature}, but there are only {n_features} features",
                self.name()
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_max_feature() {
        let leaf = || {
            Box::new(TreeNode::Leaf {
                probabilities: [1.0, 0.0],
            })
        };
        let tree = TreeNode::Split {
            feature: 1,
            threshold: 0.5,
            left: leaf(),
            right: Box::new(TreeNode::Split {
                feature: 7,
                threshold: 0.1,
                left: leaf(),
                right: leaf(),
            }),
        };
        assert_eq!(tree.max_feature(), Some(7));
        assert_eq!(leaf().max_feature(), None);
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini([5, 0]), 0.0);
        assert_eq!(gini([5, 5]), 0.5);
        assert_eq!(gini([0, 0]), 0.0);
    }

    #[test]
    fn test_forest_fit() {
        let (x, y) = toy_data();
        let mut forest = RandomForest::new(42);
        forest.fit(&x, &y).unwrap();

        assert_eq!(forest.trees().len(), 100);
        assert!(forest.trees().iter().all(|t| t.n_leaves() >= 2));

        let proba = forest.predict_proba(&fake_probe()).unwrap();
        assert!(proba[1] > 0.9);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = toy_data();
        let mut a = RandomForest::new(7);
        let mut b = RandomForest::new(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_max_depth_limits_trees() {
        let (x, y) = toy_data();
        let mut forest = RandomForest::with_config(ForestConfig {
            n_trees: 5,
            max_depth: Some(1),
            ..Default::default()
        });
        forest.fit(&x, &y).unwrap();
        assert!(forest.trees().iter().all(|t| t.depth() <= 2));
    }
}
