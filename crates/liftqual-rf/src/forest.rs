//! Random forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{OobMode, RandomForestConfig};
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::oob::{OobVotes, compute_oob};
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted random forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

/// Check shape and finiteness of a row-major dataset; returns the column count.
pub(crate) fn validate_dataset(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    if labels.len() != features.len() {
        return Err(RfError::LabelCountMismatch {
            samples: features.len(),
            labels: labels.len(),
        });
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Transpose row-major data into `columns[feature][sample]`.
pub(crate) fn to_columns(features: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect()
}

/// Draw `draw_count` rows with replacement; returns the drawn rows and the rows never drawn.
fn bootstrap_sample(
    n_samples: usize,
    draw_count: usize,
    rng: &mut impl Rng,
) -> (Vec<usize>, Vec<usize>) {
    let mut in_bag = vec![false; n_samples];
    let drawn: Vec<usize> = (0..draw_count)
        .map(|_| {
            let row = rng.gen_range(0..n_samples);
            in_bag[row] = true;
            row
        })
        .collect();
    let out_of_bag = (0..n_samples).filter(|&row| !in_bag[row]).collect();
    (drawn, out_of_bag)
}

#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, RfError> {
    let n_features = validate_dataset(features, labels)?;
    if feature_names.len() != n_features {
        return Err(RfError::FeatureNameMismatch {
            n_features,
            names: feature_names.len(),
        });
    }
    if config.bootstrap_fraction <= 0.0 || config.bootstrap_fraction > 1.0 {
        return Err(RfError::InvalidBootstrapFraction {
            fraction: config.bootstrap_fraction,
        });
    }

    let max_features = config.max_features.resolve(n_features)?;
    let tree_config = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features));
    tree_config.validate(n_features)?;

    let n_samples = features.len();
    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
    let draw_count = ((n_samples as f64) * config.bootstrap_fraction).ceil() as usize;
    let track_oob = config.oob_mode == OobMode::Enabled;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        draw_count,
        "training random forest"
    );

    let columns = to_columns(features, n_features);

    // Per-tree seeds come from the master seed up front so the forest does
    // not depend on rayon's scheduling.
    let mut master = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master.r#gen()).collect();

    let grown: Vec<(DecisionTree, OobVotes)> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (in_bag, out_of_bag) = bootstrap_sample(n_samples, draw_count, &mut rng);
            let tree = tree_config.clone().with_seed(rng.r#gen()).grow(
                &columns,
                labels,
                &in_bag,
                n_classes,
                max_features,
            );
            let votes = if track_oob {
                out_of_bag
                    .into_iter()
                    .map(|row| (row, tree.predict_unchecked(&features[row])))
                    .collect()
            } else {
                Vec::new()
            };
            (tree, votes)
        })
        .collect();

    let (trees, oob_votes): (Vec<DecisionTree>, Vec<OobVotes>) = grown.into_iter().unzip();
    debug!(n_trees_grown = trees.len(), "tree construction complete");

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree, feature_names);

    let oob_score = if track_oob {
        Some(compute_oob(labels, n_classes, &oob_votes)?)
    } else {
        None
    };

    info!(
        oob_error = oob_score.as_ref().map(|s| s.error),
        "random forest training complete"
    );

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
    };
    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved: max_features,
    };

    Ok(RandomForestResult::new(forest, importances, oob_score, metadata))
}
