//! Out-of-bag (OOB) evaluation.

use serde::Serialize;

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::tree::majority;

/// `(row, predicted class)` for every row a single tree did not see.
pub(crate) type OobVotes = Vec<(usize, usize)>;

/// Out-of-bag evaluation of a forest.
#[derive(Debug, Clone, Serialize)]
pub struct OobScore {
    /// Fraction of OOB-evaluated rows whose majority OOB vote is correct.
    pub accuracy: f64,
    /// `1 - accuracy`.
    pub error: f64,
    pub confusion_matrix: ConfusionMatrix,
    /// Rows that were out of bag for at least one tree.
    pub n_oob_samples: usize,
    /// OOB error using only the first `k + 1` trees, for `k` in `0..n_trees`.
    pub error_curve: Vec<f64>,
}

/// Replay per-tree OOB votes in tree order, tracking the running error.
///
/// Rows are predicted by majority vote over the trees for which they were
/// out of bag; rows never out of bag are excluded.
pub(crate) fn compute_oob(
    labels: &[usize],
    n_classes: usize,
    votes_per_tree: &[OobVotes],
) -> Result<OobScore, RfError> {
    let n_samples = labels.len();
    let mut votes = vec![vec![0usize; n_classes]; n_samples];
    let mut current: Vec<Option<usize>> = vec![None; n_samples];
    let mut n_evaluated = 0usize;
    let mut n_correct = 0usize;
    let mut error_curve = Vec::with_capacity(votes_per_tree.len());

    for tree_votes in votes_per_tree {
        for &(row, predicted) in tree_votes {
            votes[row][predicted] += 1;
            let winner = majority(&votes[row]);
            let truth = labels[row];
            match current[row] {
                None => {
                    n_evaluated += 1;
                    n_correct += usize::from(winner == truth);
                }
                Some(previous) if previous != winner => {
                    if previous == truth {
                        n_correct -= 1;
                    }
                    if winner == truth {
                        n_correct += 1;
                    }
                }
                Some(_) => {}
            }
            current[row] = Some(winner);
        }
        let error = if n_evaluated == 0 {
            1.0
        } else {
            1.0 - n_correct as f64 / n_evaluated as f64
        };
        error_curve.push(error);
    }

    if n_evaluated == 0 {
        return Err(RfError::OobEvaluationFailed {
            reason: "no sample was out of bag for any tree".to_string(),
        });
    }

    let (truth, predicted): (Vec<usize>, Vec<usize>) = current
        .iter()
        .enumerate()
        .filter_map(|(row, p)| p.map(|p| (labels[row], p)))
        .unzip();
    let confusion_matrix = ConfusionMatrix::from_labels(&truth, &predicted, n_classes)?;
    let accuracy = n_correct as f64 / n_evaluated as f64;

    Ok(OobScore {
        accuracy,
        error: 1.0 - accuracy,
        confusion_matrix,
        n_oob_samples: n_evaluated,
        error_curve,
    })
}
