//! Feature importance aggregation across trees.

use serde::Serialize;

/// A predictor with its forest-wide importance.
#[derive(Debug, Clone, Serialize)]
pub struct RankedFeature {
    pub name: String,
    /// Mean decrease in impurity, normalized to sum to 1.0 over all predictors.
    pub importance: f64,
    /// 1-based; 1 is the most important.
    pub rank: usize,
}

/// Sum per-tree importances, normalize, and rank descending.
///
/// Ties keep column order, so the ranking is deterministic.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    let mut totals = vec![0.0f64; names.len()];
    for tree in per_tree {
        for (total, value) in totals.iter_mut().zip(tree) {
            *total += value;
        }
    }
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}
