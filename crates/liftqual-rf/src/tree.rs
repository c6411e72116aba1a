use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::RfError;
use crate::node::{Node, NodeIndex};
use crate::split::{SplitContext, SplitCriterion};

/// Configuration for a single CART classification tree.
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all columns)  |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Limit the depth of the tree; the root sits at depth 0.
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

    /// Number of randomly drawn candidate columns per node; `None` uses all.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the hyperparameters against a dataset with `n_features` columns
    /// and return the resolved number of candidate columns per node.
    pub(crate) fn validate(&self, n_features: usize) -> Result<usize, RfError> {
        if self.max_depth == Some(0) {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(max_features)
    }

    /// Fit a tree on a row-major dataset.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                             |
    /// |--------------------------------------|--------------------------------------------------|
    /// | [`RfError::EmptyDataset`]            | `features` is empty                              |
    /// | [`RfError::ZeroFeatures`]            | rows have no columns                             |
    /// | [`RfError::FeatureCountMismatch`]    | rows have inconsistent lengths                   |
    /// | [`RfError::LabelCountMismatch`]      | `labels.len() != features.len()`                 |
    /// | [`RfError::NonFiniteValue`]          | a value is NaN or infinite                       |
    /// | [`RfError::InvalidMaxDepth`]         | `max_depth` is `Some(0)`                         |
    /// | [`RfError::InvalidMinSamplesSplit`]  | `min_samples_split < 2`                          |
    /// | [`RfError::InvalidMinSamplesLeaf`]   | `min_samples_leaf < 1`                           |
    /// | [`RfError::InvalidMaxFeatures`]      | `max_features` outside `[1, n_features]`         |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let n_features = crate::forest::validate_dataset(features, labels)?;
        let max_features = self.validate(n_features)?;
        let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;

        let columns = crate::forest::to_columns(features, n_features);
        let rows: Vec<usize> = (0..features.len()).collect();
        Ok(self.grow(&columns, labels, &rows, n_classes, max_features))
    }

    /// Grow a tree over `rows` of pre-validated column-major data.
    ///
    /// `rows` may repeat indices, which is how bootstrap samples are passed in.
    pub(crate) fn grow(
        &self,
        columns: &[Vec<f64>],
        labels: &[usize],
        rows: &[usize],
        n_classes: usize,
        max_features: usize,
    ) -> DecisionTree {
        let mut builder = TreeBuilder {
            config: self,
            split: SplitContext {
                columns,
                labels,
                n_classes,
                criterion: self.criterion,
                min_samples_leaf: self.min_samples_leaf,
            },
            max_features,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            arena: Vec::new(),
        };
        builder.build(rows, 0);

        debug!(n_nodes = builder.arena.len(), "decision tree grown");

        DecisionTree {
            nodes: builder.arena,
            n_features: columns.len(),
            n_classes,
        }
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct TreeBuilder<'a> {
    config: &'a DecisionTreeConfig,
    split: SplitContext<'a>,
    max_features: usize,
    rng: ChaCha8Rng,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn build(&mut self, rows: &[usize], depth: usize) -> NodeIndex {
        let n_classes = self.split.n_classes;
        let mut counts = vec![0usize; n_classes];
        for &row in rows {
            counts[self.split.labels[row]] += 1;
        }
        let impurity = self.config.criterion.impurity(&counts, rows.len());

        let at_depth_limit = self.config.max_depth.is_some_and(|d| depth >= d);
        let stop =
            rows.len() < self.config.min_samples_split || impurity.is_pure() || at_depth_limit;

        let split = if stop {
            None
        } else {
            self.split.best_split(rows, self.max_features, &mut self.rng)
        };

        let Some(split) = split else {
            return self.push_leaf(&counts, rows.len(), impurity);
        };

        // Reserve the slot so the children land after their parent.
        let slot = self.arena.len();
        self.arena.push(Node::Leaf {
            prediction: 0,
            distribution: Vec::new(),
            impurity,
            n_samples: rows.len(),
        });

        let left = self.build(&split.left_indices, depth + 1);
        let right = self.build(&split.right_indices, depth + 1);

        self.arena[slot] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity,
            n_samples: rows.len(),
            impurity_decrease: split.impurity_decrease,
        };
        NodeIndex::new(slot)
    }

    fn push_leaf(
        &mut self,
        counts: &[usize],
        n_samples: usize,
        impurity: crate::node::Impurity,
    ) -> NodeIndex {
        let total = n_samples.max(1) as f64;
        let distribution = counts.iter().map(|&c| c as f64 / total).collect();
        let prediction = majority(counts);
        self.arena.push(Node::Leaf {
            prediction,
            distribution,
            impurity,
            n_samples,
        });
        NodeIndex::new(self.arena.len() - 1)
    }
}

/// Index of the largest count; ties go to the lowest class index.
pub(crate) fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

/// A fitted CART tree stored as a node arena rooted at index 0.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the class of one row.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if the row is not as wide as the training matrix.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        self.check_width(sample)?;
        Ok(self.predict_unchecked(sample))
    }

    /// Class distribution of the leaf `sample` falls into (length `n_classes`).
    ///
    /// # Errors
    ///
    /// Fails like [`predict`](Self::predict) on a row of the wrong width.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<&[f64], RfError> {
        self.check_width(sample)?;
        match &self.nodes[self.leaf_for(sample)] {
            Node::Leaf { distribution, .. } => Ok(distribution),
            Node::Split { .. } => unreachable!("leaf_for always stops at a leaf"),
        }
    }

    pub(crate) fn predict_unchecked(&self, sample: &[f64]) -> usize {
        match &self.nodes[self.leaf_for(sample)] {
            Node::Leaf { prediction, .. } => *prediction,
            Node::Split { .. } => unreachable!("leaf_for always stops at a leaf"),
        }
    }

    /// Mean decrease in impurity per column, normalized to sum to 1.
    ///
    /// All zeros for a single-leaf tree.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Longest root-to-leaf path; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => deepest = deepest.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), depth + 1));
                    stack.push((right.index(), depth + 1));
                }
            }
        }
        deepest
    }

    fn check_width(&self, sample: &[f64]) -> Result<(), RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(())
    }

    fn leaf_for(&self, sample: &[f64]) -> usize {
        let mut idx = 0;
        while let Node::Split {
            feature,
            threshold,
            left,
            right,
            ..
        } = &self.nodes[idx]
        {
            idx = if sample[feature.index()] <= *threshold {
                left.index()
            } else {
                right.index()
            };
        }
        idx
    }
}
