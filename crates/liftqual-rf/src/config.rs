//! Configuration builder for random forest training.

use crate::error::RfError;
use crate::result::RandomForestResult;
use crate::split::SplitCriterion;

/// Number of candidate columns drawn at each node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1.
    Sqrt,
    /// `ceil(log2(n_features))`, at least 1.
    Log2,
    /// `ceil(n_features * f)` for `f` in (0.0, 1.0].
    Fraction(f64),
    Fixed(usize),
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for a dataset with `n_features` columns.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidMaxFeatures`] when the count falls outside `[1, n_features]`.
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let n = n_features as f64;
        let resolved = match self {
            MaxFeatures::Sqrt => (n.sqrt().floor() as usize).max(1),
            MaxFeatures::Log2 => (n.log2().ceil() as usize).max(1),
            MaxFeatures::Fraction(f) => (n * f).ceil() as usize,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Out-of-bag scoring after the trees are grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OobMode {
    Enabled,
    Disabled,
}

/// Hyperparameters for one forest.
///
/// [`RandomForestConfig::new`] fixes the tree count; everything else starts
/// at the values below and is overridden with the builder methods:
/// `Sqrt` candidate columns, unlimited depth, a node needs 2 rows to split
/// and each leaf keeps at least 1, Gini impurity, seed 42, no out-of-bag
/// scoring, and bootstrap samples as large as the training set.
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) seed: u64,
    pub(crate) oob_mode: OobMode,
    pub(crate) bootstrap_fraction: f64,
}

impl RandomForestConfig {
    /// Create a config for an ensemble of `n_trees` trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            seed: 42,
            oob_mode: OobMode::Disabled,
            bootstrap_fraction: 1.0,
        })
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Depth cap for every tree; `None` grows until the leaves are pure.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Master seed from which every per-tree seed is derived.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_oob_mode(mut self, oob_mode: OobMode) -> Self {
        self.oob_mode = oob_mode;
        self
    }

    /// Size of each bootstrap sample as a fraction of the training rows.
    #[must_use]
    pub fn with_bootstrap_fraction(mut self, bootstrap_fraction: f64) -> Self {
        self.bootstrap_fraction = bootstrap_fraction;
        self
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn oob_mode(&self) -> OobMode {
        self.oob_mode
    }

    #[must_use]
    pub fn bootstrap_fraction(&self) -> f64 {
        self.bootstrap_fraction
    }

    /// Train a forest.
    ///
    /// `features[sample][feature]` is row-major, `labels[sample]` is a
    /// zero-based class code, and `feature_names[feature]` names each column.
    ///
    /// # Errors
    ///
    /// - [`RfError::EmptyDataset`] for a matrix without rows.
    /// - [`RfError::ZeroFeatures`] when the first row is empty.
    /// - [`RfError::FeatureCountMismatch`] when a row is shorter or longer than the first.
    /// - [`RfError::LabelCountMismatch`] and [`RfError::FeatureNameMismatch`] when
    ///   `labels` or `feature_names` do not line up with the matrix.
    /// - [`RfError::NonFiniteValue`] for a NaN or infinite cell.
    /// - [`RfError::InvalidMaxFeatures`] when the candidate count resolves to
    ///   zero or to more than the column count.
    /// - [`RfError::InvalidBootstrapFraction`] outside `(0.0, 1.0]`.
    /// - [`RfError::OobEvaluationFailed`] when out-of-bag scoring is on but
    ///   every row landed in every bootstrap sample.
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<RandomForestResult, RfError> {
        crate::forest::train(self, features, labels, feature_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_rounds_down() {
        assert_eq!(MaxFeatures::Sqrt.resolve(52).unwrap(), 7);
        assert_eq!(MaxFeatures::Sqrt.resolve(15).unwrap(), 3);
        assert_eq!(MaxFeatures::Sqrt.resolve(1).unwrap(), 1);
    }

    #[test]
    fn fixed_beyond_width_is_rejected() {
        let err = MaxFeatures::Fixed(9).resolve(4).unwrap_err();
        assert!(matches!(err, RfError::InvalidMaxFeatures { max_features: 9, n_features: 4 }));
    }

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            RandomForestConfig::new(0),
            Err(RfError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn builder_keeps_settings() {
        let config = RandomForestConfig::new(25)
            .unwrap()
            .with_seed(7)
            .with_max_depth(Some(4))
            .with_oob_mode(OobMode::Enabled);
        assert_eq!(config.n_trees(), 25);
        assert_eq!(config.seed(), 7);
        assert_eq!(config.max_depth(), Some(4));
        assert_eq!(config.oob_mode(), OobMode::Enabled);
        assert_eq!(config.max_features(), MaxFeatures::Sqrt);
    }
}
