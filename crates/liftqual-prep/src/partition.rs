//! Seeded stratified train/validation partitioning.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::PrepError;

/// Row indices of the two partitions, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

impl Split {
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.train.len()
    }

    #[must_use]
    pub fn n_validation(&self) -> usize {
        self.validation.len()
    }
}

/// Stratified sampling of row indices by class.
///
/// Within each class the rows are shuffled and `ceil(n_c * fraction)` of
/// them go to training, capped at `n_c - 1` so every class also appears in
/// validation. Classes are processed in ascending code order from a single
/// `ChaCha8Rng`, so the same seed and labels always give the same split.
///
/// # Example
///
/// ```
/// use liftqual_prep::StratifiedSplit;
///
/// let labels = [0, 0, 0, 0, 1, 1, 1, 1];
/// let split = StratifiedSplit::new(0.75).unwrap().with_seed(7).split(&labels).unwrap();
/// assert_eq!(split.n_train(), 6);
/// assert_eq!(split.n_validation(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct StratifiedSplit {
    fraction: f64,
    seed: u64,
}

impl StratifiedSplit {
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidFraction`] unless `0 < fraction < 1`.
    pub fn new(fraction: f64) -> Result<Self, PrepError> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(PrepError::InvalidFraction { fraction });
        }
        Ok(Self { fraction, seed: 42 })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Partition rows `0..labels.len()` by class code.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::EmptyLabels`] | `labels` is empty |
    /// | [`PrepError::TooFewRowsForSplit`] | a present class has a single row |
    #[instrument(skip_all, fields(n_rows = labels.len(), fraction = self.fraction, seed = self.seed))]
    pub fn split(&self, labels: &[usize]) -> Result<Split, PrepError> {
        let Some(&max_code) = labels.iter().max() else {
            return Err(PrepError::EmptyLabels);
        };

        let mut class_indices: Vec<Vec<usize>> = vec![Vec::new(); max_code + 1];
        for (row, &label) in labels.iter().enumerate() {
            class_indices[label].push(row);
        }

        for (class, indices) in class_indices.iter().enumerate() {
            if indices.len() == 1 {
                return Err(PrepError::TooFewRowsForSplit { class, count: 1 });
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train = Vec::new();
        let mut validation = Vec::new();

        for (class, indices) in class_indices.iter_mut().enumerate() {
            if indices.is_empty() {
                continue;
            }
            indices.shuffle(&mut rng);
            let n = indices.len();
            let n_train = ((n as f64 * self.fraction).ceil() as usize).min(n - 1);
            debug!(class, n, n_train, "class partitioned");
            train.extend_from_slice(&indices[..n_train]);
            validation.extend_from_slice(&indices[n_train..]);
        }

        train.sort_unstable();
        validation.sort_unstable();
        info!(
            n_train = train.len(),
            n_validation = validation.len(),
            "stratified split done"
        );
        Ok(Split { train, validation })
    }
}
