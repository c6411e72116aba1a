//! Training result types for random forest.

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::importance::RankedFeature;
use crate::oob::OobScore;

/// Shape of a training run.
#[derive(Debug, Clone)]
pub struct TrainingMetadata {
    pub n_trees: usize,
    pub n_features: usize,
    pub n_classes: usize,
    pub n_samples: usize,
    /// Candidate columns drawn at each node.
    pub max_features_resolved: usize,
}

/// Fitted forest plus everything learned while fitting it.
#[derive(Debug)]
pub struct RandomForestResult {
    forest: RandomForest,
    importances: Vec<RankedFeature>,
    oob_score: Option<OobScore>,
    metadata: TrainingMetadata,
}

impl RandomForestResult {
    pub(crate) fn new(
        forest: RandomForest,
        importances: Vec<RankedFeature>,
        oob_score: Option<OobScore>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            importances,
            oob_score,
            metadata,
        }
    }

    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Predictors ranked by importance, most important first.
    #[must_use]
    pub fn importances(&self) -> &[RankedFeature] {
        &self.importances
    }

    /// Names of the `k` most important predictors, or all of them if fewer exist.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTopK`] when `k` is zero.
    pub fn top_features(&self, k: usize) -> Result<Vec<String>, RfError> {
        if k == 0 {
            return Err(RfError::InvalidTopK { k });
        }
        Ok(self
            .importances
            .iter()
            .take(k)
            .map(|f| f.name.clone())
            .collect())
    }

    /// OOB evaluation, present when training ran with [`OobMode::Enabled`](crate::OobMode::Enabled).
    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore> {
        self.oob_score.as_ref()
    }

    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use crate::RfError;
    use crate::config::RandomForestConfig;

    #[test]
    fn top_features_truncates_and_validates() {
        let features: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, (i % 3) as f64, 1.0])
            .collect();
        let labels: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let result = RandomForestConfig::new(5)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();

        assert_eq!(result.top_features(2).unwrap().len(), 2);
        assert_eq!(result.top_features(15).unwrap().len(), 3);
        assert!(matches!(result.top_features(0), Err(RfError::InvalidTopK { k: 0 })));
        assert_eq!(result.metadata().n_features, 3);
        assert_eq!(result.metadata().max_features_resolved, 1);
    }
}
