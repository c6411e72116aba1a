//! Random forest classification: train, evaluate, predict.
//!
//! Bagged CART trees grown in parallel with rayon, out-of-bag error with a
//! per-tree-count error curve, mean-decrease-in-impurity importances, a
//! confusion matrix, and an element-wise agreement check between two
//! prediction sequences.

mod agreement;
mod config;
mod confusion;
mod error;
mod forest;
mod importance;
mod node;
mod oob;
mod predict;
mod result;
mod split;
mod tree;

pub use agreement::Agreement;
pub use config::{MaxFeatures, OobMode, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix, LabelledConfusion};
pub use error::RfError;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use oob::OobScore;
pub use predict::ClassDistribution;
pub use result::{RandomForestResult, TrainingMetadata};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
