//! Element-wise comparison of two prediction sequences.

use serde::Serialize;

use crate::error::RfError;

/// How two models' predictions on the same rows line up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agreement {
    /// `true` iff every position holds the same label.
    pub identical: bool,
    pub n_compared: usize,
    pub n_disagreements: usize,
    /// Zero-based positions where the labels differ.
    pub disagreeing_rows: Vec<usize>,
}

impl Agreement {
    /// Compare two prediction sequences position by position.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionLengthMismatch`] when the sequences differ in length.
    pub fn compare<T: PartialEq>(left: &[T], right: &[T]) -> Result<Self, RfError> {
        if left.len() != right.len() {
            return Err(RfError::PredictionLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        let disagreeing_rows: Vec<usize> = left
            .iter()
            .zip(right)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        Ok(Self {
            identical: disagreeing_rows.is_empty(),
            n_compared: left.len(),
            n_disagreements: disagreeing_rows.len(),
            disagreeing_rows,
        })
    }

    /// Fraction of positions on which the two sequences agree; 1.0 for empty input.
    #[must_use]
    pub fn rate(&self) -> f64 {
        if self.n_compared == 0 {
            1.0
        } else {
            1.0 - self.n_disagreements as f64 / self.n_compared as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences() {
        let a = ["B", "A", "B", "C"];
        let agreement = Agreement::compare(&a, &a).unwrap();
        assert!(agreement.identical);
        assert_eq!(agreement.n_compared, 4);
        assert!((agreement.rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reports_disagreeing_positions() {
        let agreement = Agreement::compare(&[0, 1, 2, 3], &[0, 2, 2, 4]).unwrap();
        assert!(!agreement.identical);
        assert_eq!(agreement.disagreeing_rows, vec![1, 3]);
        assert!((agreement.rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn length_mismatch() {
        let err = Agreement::compare(&[1, 2], &[1]).unwrap_err();
        assert!(matches!(err, RfError::PredictionLengthMismatch { left: 2, right: 1 }));
    }

    #[test]
    fn empty_sequences_agree() {
        let agreement = Agreement::compare::<u8>(&[], &[]).unwrap();
        assert!(agreement.identical);
    }
}
