use rand::Rng;
use serde::Serialize;

use crate::node::{FeatureIndex, Impurity};

/// Node impurity measure used to score candidate splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SplitCriterion {
    /// `1 - Σ p_i²`
    Gini,
    /// `-Σ p_i ln p_i`
    Entropy,
}

impl SplitCriterion {
    /// Impurity of a node from its per-class row counts.
    ///
    /// An empty node is treated as pure.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let proportions = class_counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| c as f64 / n);
        let value = match self {
            SplitCriterion::Gini => 1.0 - proportions.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -proportions.map(|p| p * p.ln()).sum::<f64>(),
        };
        Impurity::new(value)
    }
}

/// Chosen split for one node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·I(parent) - n_l·I(left) - n_r·I(right)`, unnormalized.
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Per-node inputs shared by every candidate feature.
pub(crate) struct SplitContext<'a> {
    /// Column-major: `columns[feature][row]`.
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) min_samples_leaf: usize,
}

impl SplitContext<'_> {
    /// Search `max_features` randomly drawn columns for the split with the
    /// largest weighted impurity decrease.
    ///
    /// A drawn column with no valid boundary over `rows` does not count
    /// against `max_features`; drawing continues through the remaining
    /// columns. Returns `None` only when no column at all can split `rows`.
    pub(crate) fn best_split(
        &self,
        rows: &[usize],
        max_features: usize,
        rng: &mut impl Rng,
    ) -> Option<SplitResult> {
        let n_features = self.columns.len();
        if rows.is_empty() || n_features == 0 || max_features == 0 {
            return None;
        }

        let mut parent_counts = vec![0usize; self.n_classes];
        for &row in rows {
            parent_counts[self.labels[row]] += 1;
        }
        let parent = self.criterion.impurity(&parent_counts, rows.len());

        // Lazy Fisher-Yates over the feature indices.
        let mut order: Vec<usize> = (0..n_features).collect();
        let take = max_features.min(n_features);
        let mut splittable = 0;
        let mut best: Option<(usize, f64, f64)> = None;
        for i in 0..n_features {
            let j = rng.gen_range(i..n_features);
            order.swap(i, j);
            let feature = order[i];

            let Some((threshold, decrease)) =
                self.scan_feature(feature, rows, &parent_counts, parent)
            else {
                continue;
            };
            if best.is_none_or(|(_, _, d)| decrease > d) {
                best = Some((feature, threshold, decrease));
            }
            splittable += 1;
            if splittable == take {
                break;
            }
        }

        let (feature, threshold, impurity_decrease) = best?;
        let column = &self.columns[feature];
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
            rows.iter().copied().partition(|&row| column[row] <= threshold);

        Some(SplitResult {
            feature: FeatureIndex::new(feature),
            threshold,
            impurity_decrease,
            left_indices,
            right_indices,
        })
    }

    /// Sweep the sorted values of one column, moving rows from the right
    /// child to the left, and return the best `(threshold, decrease)`.
    fn scan_feature(
        &self,
        feature: usize,
        rows: &[usize],
        parent_counts: &[usize],
        parent: Impurity,
    ) -> Option<(f64, f64)> {
        let column = &self.columns[feature];
        let n = rows.len();

        let mut sorted: Vec<(f64, usize)> = rows.iter().map(|&r| (column[r], self.labels[r])).collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = vec![0usize; self.n_classes];
        let mut right = parent_counts.to_vec();
        let mut best: Option<(f64, f64)> = None;

        for i in 0..n - 1 {
            let (value, class) = sorted[i];
            left[class] += 1;
            right[class] -= 1;

            let next = sorted[i + 1].0;
            if value == next {
                continue;
            }
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let decrease = n as f64 * parent.value()
                - n_left as f64 * self.criterion.impurity(&left, n_left).value()
                - n_right as f64 * self.criterion.impurity(&right, n_right).value();

            if best.is_none_or(|(_, d)| decrease > d) {
                best = Some(((value + next) / 2.0, decrease));
            }
        }
        best
    }
}
