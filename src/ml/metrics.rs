//! Evaluation metrics for binary classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::Label;

/// Fraction of predictions equal to the true label; zero for empty input.
pub fn accuracy(y_true: &[Label], y_pred: &[Label]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Confusion matrix with [`Label::Fake`] as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_real: usize,
    pub false_fake: usize,
    pub false_real: usize,
    pub true_fake: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[Label], y_pred: &[Label]) -> Self {
        let mut matrix = ConfusionMatrix::default();
        for (t, p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (Label::Real, Label::Real) => matrix.true_real += 1,
                (Label::Real, Label::Fake) => matrix.false_fake += 1,
                (Label::Fake, Label::Real) => matrix.false_real += 1,
                (Label::Fake, Label::Fake) => matrix.true_fake += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_real + self.false_fake + self.false_real + self.true_fake
    }

    /// Rows predicted as `class` that really are `class`, over all rows predicted as `class`.
    pub fn precision(&self, class: Label) -> f64 {
        let (hit, miss) = match class {
            Label::Real => (self.true_real, self.false_real),
            Label::Fake => (self.true_fake, self.false_fake),
        };
        ratio(hit, hit + miss)
    }

    /// Rows of `class` predicted as `class`, over all rows of `class`.
    pub fn recall(&self, class: Label) -> f64 {
        ratio(self.hits(class), self.support(class))
    }

    pub fn f1(&self, class: Label) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    pub fn support(&self, class: Label) -> usize {
        match class {
            Label::Real => self.true_real + self.false_fake,
            Label::Fake => self.true_fake + self.false_real,
        }
    }

    fn hits(&self, class: Label) -> usize {
        match class {
            Label::Real => self.true_real,
            Label::Fake => self.true_fake,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics plus accuracy and macro averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub real: ClassMetrics,
    pub fake: ClassMetrics,
    pub macro_f1: f64,
}

impl ClassificationReport {
    pub fn new(y_true: &[Label], y_pred: &[Label]) -> Self {
        let confusion = ConfusionMatrix::from_labels(y_true, y_pred);
        let class_metrics = |class| ClassMetrics {
            precision: confusion.precision(class),
            recall: confusion.recall(class),
            f1: confusion.f1(class),
            support: confusion.support(class),
        };
        let real = class_metrics(Label::Real);
        let fake = class_metrics(Label::Fake);

        ClassificationReport {
            accuracy: accuracy(y_true, y_pred),
            confusion,
            macro_f1: (real.f1 + fake.f1) / 2.0,
            real,
            fake,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1", "support")?;
        for (name, m) in [("real", &self.real), ("fake", &self.fake)] {
            writeln!(
                f,
                "{:>8} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        write!(
            f,
            "accuracy {:.3} (n = {}), macro F1 {:.3}",
            self.accuracy,
            self.confusion.total(),
            self.macro_f1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dataset::Label::{Fake, Real};

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[Real, Fake, Fake, Real], &[Real, Fake, Real, Real]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_confusion_matrix() {
        let y_true = [Real, Real, Real, Fake, Fake];
        let y_pred = [Real, Real, Fake, Fake, Real];
        let m = ConfusionMatrix::from_labels(&y_true, &y_pred);

        assert_eq!(m.true_real, 2);
        assert_eq!(m.false_fake, 1);
        assert_eq!(m.false_real, 1);
        assert_eq!(m.true_fake, 1);
        assert_eq!(m.total(), 5);
        assert_eq!(m.support(Real), 3);
        assert!((m.precision(Real) - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall(Fake) - 0.5).abs() < 1e-12);
        assert!((m.f1(Fake) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_report_perfect_predictions() {
        let labels = [Real, Fake, Fake];
        let report = ClassificationReport::new(&labels, &labels);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.macro_f1, 1.0);
        assert!(report.to_string().contains("accuracy 1.000"));
    }

    #[test]
    fn test_metrics_without_predictions_for_a_class() {
        let report = ClassificationReport::new(&[Real, Fake], &[Real, Real]);
        assert_eq!(report.fake.precision, 0.0);
        assert_eq!(report.fake.f1, 0.0);
        assert_eq!(report.real.recall, 1.0);
    }
}
