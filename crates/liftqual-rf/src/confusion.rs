//! Confusion matrix and per-class classification metrics.

use std::fmt;

use serde::Serialize;

use crate::error::RfError;

/// Counts of `(true class, predicted class)` pairs.
///
/// `matrix[t][p]` is the number of rows of class `t` predicted as `p`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

/// Per-class precision, recall, and F1.
#[derive(Debug, Clone, Serialize)]
pub struct ClassMetrics {
    pub class: usize,
    /// TP / (TP + FP); 0.0 when the class was never predicted.
    pub precision: f64,
    /// TP / (TP + FN); 0.0 when the class never occurs.
    pub recall: f64,
    pub f1: f64,
    /// Number of rows truly in this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Tally true against predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | no labels |
    /// | [`RfError::PredictionLengthMismatch`] | the two slices differ in length |
    /// | [`RfError::LabelOutOfRange`] | a label is `>= n_classes` |
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, RfError> {
        if true_labels.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        if true_labels.len() != predicted.len() {
            return Err(RfError::PredictionLengthMismatch {
                left: true_labels.len(),
                right: predicted.len(),
            });
        }
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (&t, &p) in true_labels.iter().zip(predicted) {
            let label = t.max(p);
            if label >= n_classes {
                return Err(RfError::LabelOutOfRange { label, n_classes });
            }
            matrix[t][p] += 1;
        }
        Ok(Self { matrix, n_classes })
    }

    /// Total number of tallied rows.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Fraction of rows on the diagonal.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes).map(|i| self.matrix[i][i]).sum();
        match self.total() {
            0 => 0.0,
            total => correct as f64 / total as f64,
        }
    }

    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes)
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted: usize = self.matrix.iter().map(|row| row[c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: c,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Render with class names in place of indices.
    ///
    /// Missing names fall back to the class index.
    #[must_use]
    pub fn display_with<'a>(&'a self, names: &'a [String]) -> LabelledConfusion<'a> {
        LabelledConfusion {
            matrix: self,
            names,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// [`ConfusionMatrix`] formatter with class names; see [`ConfusionMatrix::display_with`].
pub struct LabelledConfusion<'a> {
    matrix: &'a ConfusionMatrix,
    names: &'a [String],
}

impl LabelledConfusion<'_> {
    fn name(&self, class: usize) -> String {
        self.names
            .get(class)
            .cloned()
            .unwrap_or_else(|| class.to_string())
    }
}

impl fmt::Display for LabelledConfusion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "true\\pred")?;
        for p in 0..self.matrix.n_classes {
            write!(f, " {:>7}", self.name(p))?;
        }
        writeln!(f)?;
        for (t, row) in self.matrix.matrix.iter().enumerate() {
            write!(f, "{:>10}", self.name(t))?;
            for count in row {
                write!(f, " {count:>7}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_with(&[]))
    }
}
