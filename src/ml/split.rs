//! Stratified train/test splitting.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::dataset::Label;
use crate::error::{Result, VerityError};

/// Row indices of the two subsets, each in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so both subsets keep the class balance of `labels`.
///
/// Each class contributes `round(n_class * test_size)` rows to the test set,
/// at least one when it has two or more rows, and always leaves at least one
/// row for training. The same seed always gives the same split.
pub fn stratified_split(labels: &[Label], test_size: f64, seed: u64) -> Result<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(VerityError::invalid_argument(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in Label::ALL {
        let mut rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, l)| *l == class)
            .map(|(i, _)| i)
            .collect();
        rows.shuffle(&mut rng);

        let n_class = rows.len();
        let n_test = if n_class < 2 {
            0
        } else {
            ((n_class as f64 * test_size).round() as usize).clamp(1, n_class - 1)
        };

        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    if test.is_empty() {
        return Err(VerityError::invalid_argument(
            "dataset is too small for a held-out split",
        ));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(real: usize, fake: usize) -> Vec<Label> {
        let mut labels = vec![Label::Real; real];
        labels.extend(vec![Label::Fake; fake]);
        labels
    }

    #[test]
    fn test_split_preserves_class_balance() {
        let labels = labels(300, 300);
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        assert_eq!(split.train.len(), 480);
        assert_eq!(split.test.len(), 120);
        let fake_in_test = split.test.iter().filter(|&&i| labels[i] == Label::Fake).count();
        assert_eq!(fake_in_test, 60);
    }

    #[test]
    fn test_split_is_a_partition() {
        let labels = labels(17, 9);
        let split = stratified_split(&labels, 0.25, 1).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..26).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_reproducible() {
        let labels = labels(40, 25);
        let a = stratified_split(&labels, 0.2, 42).unwrap();
        let b = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_classes_keep_both_sides() {
        let labels = labels(2, 3);
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        for class in Label::ALL {
            assert!(split.train.iter().any(|&i| labels[i] == class));
            assert!(split.test.iter().any(|&i| labels[i] == class));
        }
    }

    #[test]
    fn test_invalid_test_size() {
        let labels = labels(5, 5);
        assert!(stratified_split(&labels, 0.0, 42).is_err());
        assert!(stratified_split(&labels, 1.0, 42).is_err());
        assert!(stratified_split(&[Label::Real], 0.2, 42).is_err());
    }
}
