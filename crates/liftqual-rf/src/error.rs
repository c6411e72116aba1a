/// Errors from forest training, prediction, and evaluation.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount { n_trees: usize },

    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth { max_depth: usize },

    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit { min_samples_split: usize },

    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf { min_samples_leaf: usize },

    /// The resolved per-node candidate count is outside `[1, n_features]`.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        max_features: usize,
        n_features: usize,
    },

    #[error("bootstrap_fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidBootstrapFraction { fraction: f64 },

    #[error("training dataset has zero samples")]
    EmptyDataset,

    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        expected: usize,
        got: usize,
        sample_index: usize,
    },

    #[error("got {labels} labels for {samples} samples")]
    LabelCountMismatch { samples: usize, labels: usize },

    #[error("{names} feature names for {n_features} feature columns")]
    FeatureNameMismatch { n_features: usize, names: usize },

    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        sample_index: usize,
        feature_index: usize,
    },

    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch { expected: usize, got: usize },

    /// Every row landed in every bootstrap sample.
    #[error("OOB evaluation failed: {reason}")]
    OobEvaluationFailed { reason: String },

    #[error("requested top {k} features, but k must be at least 1")]
    InvalidTopK { k: usize },

    /// Two prediction sequences being compared, or a truth/prediction pair, differ in length.
    #[error("prediction sequences differ in length: {left} vs {right}")]
    PredictionLengthMismatch { left: usize, right: usize },

    #[error("label {label} is out of range for {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },
}
