//! End-to-end analysis: filter, encode, split, fit the full and minimized
//! forests, validate both, and compare their test-set predictions.

use liftqual_io::{IoError, Table};
use liftqual_prep::{
    ColumnFilter, FeatureEncoder, FilterReport, LabelEncoder, PrepError, Split, StratifiedSplit,
    DEFAULT_FREQ_CUT, DEFAULT_NAME_PATTERN, DEFAULT_UNIQUE_CUT,
};
use liftqual_rf::{
    Agreement, ClassMetrics, ConfusionMatrix, OobMode, RandomForestConfig, RandomForestResult,
    RankedFeature, RfError,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Prep(#[from] PrepError),

    #[error(transparent)]
    Rf(#[from] RfError),
}

/// Settings for [`run_analysis`].
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    label: String,
    split_fraction: f64,
    n_trees: usize,
    top_k: usize,
    seed: u64,
    max_depth: Option<usize>,
    freq_cut: f64,
    unique_cut: f64,
    name_pattern: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            label: "classe".to_string(),
            split_fraction: 0.75,
            n_trees: 100,
            top_k: 15,
            seed: 42,
            max_depth: None,
            freq_cut: DEFAULT_FREQ_CUT,
            unique_cut: DEFAULT_UNIQUE_CUT,
            name_pattern: DEFAULT_NAME_PATTERN.to_string(),
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_split_fraction(mut self, split_fraction: f64) -> Self {
        self.split_fraction = split_fraction;
        self
    }

    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Predictor count of the minimized model.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_freq_cut(mut self, freq_cut: f64) -> Self {
        self.freq_cut = freq_cut;
        self
    }

    #[must_use]
    pub fn with_unique_cut(mut self, unique_cut: f64) -> Self {
        self.unique_cut = unique_cut;
        self
    }

    #[must_use]
    pub fn with_name_pattern(mut self, name_pattern: impl Into<String>) -> Self {
        self.name_pattern = name_pattern.into();
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Column filter with these thresholds, protecting the label.
    #[must_use]
    pub fn column_filter(&self) -> ColumnFilter {
        ColumnFilter::new()
            .with_freq_cut(self.freq_cut)
            .with_unique_cut(self.unique_cut)
            .with_name_pattern(self.name_pattern.clone())
            .with_protected(self.label.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitSizes {
    pub n_train: usize,
    pub n_validation: usize,
}

impl From<&Split> for SplitSizes {
    fn from(split: &Split) -> Self {
        Self {
            n_train: split.n_train(),
            n_validation: split.n_validation(),
        }
    }
}

/// Fit and validation results for one forest.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub n_predictors: usize,
    pub predictors: Vec<String>,
    pub seed: u64,
    pub split: SplitSizes,
    pub oob_error: Option<f64>,
    /// OOB error after 1, 2, ..., n_trees trees.
    pub oob_error_curve: Vec<f64>,
    pub validation_accuracy_percent: f64,
    pub misclassification_percent: f64,
    pub confusion: ConfusionMatrix,
    pub class_metrics: Vec<ClassMetrics>,
    pub importances: Vec<RankedFeature>,
}

/// Predicted labels for the unlabeled rows from both models.
#[derive(Debug, Clone, Serialize)]
pub struct TestPredictions {
    pub n_rows: usize,
    pub full_model: Vec<String>,
    pub minimized_model: Vec<String>,
    pub agreement: Agreement,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub label: String,
    pub classes: Vec<String>,
    pub n_rows: usize,
    pub filter: FilterReport,
    pub full_model: ModelSummary,
    pub minimized_model: ModelSummary,
    pub test: Option<TestPredictions>,
}

/// Encoded design matrix and its predictor names.
struct Design {
    encoder: FeatureEncoder,
    features: Vec<Vec<f64>>,
    names: Vec<String>,
}

impl Design {
    fn new<S: AsRef<str>>(table: &Table, predictors: &[S]) -> Result<Self, PrepError> {
        let encoder = FeatureEncoder::fit(table, predictors)?;
        let features = encoder.encode(table)?;
        let names = encoder.feature_names();
        Ok(Self {
            encoder,
            features,
            names,
        })
    }
}

fn take<T: Clone>(items: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().map(|&r| items[r].clone()).collect()
}

/// Run the whole analysis on a labeled table and an optional unlabeled one.
///
/// The full model is fit with `seed` on a split drawn with `seed`; the
/// minimized model keeps the `top_k` most important predictors of the full
/// model and uses `seed + 1` for both its split and its fit. Identical
/// inputs give an identical report.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PipelineError::Prep`] | filtering, encoding, or splitting fails (bad thresholds, label missing, singleton class, unseen test level) |
/// | [`PipelineError::Rf`] | forest configuration or fitting fails (zero trees, `top_k == 0`) |
/// | [`PipelineError::Io`] | a table operation fails |
#[instrument(skip_all, fields(n_rows = train.n_rows(), label = %config.label, seed = config.seed))]
pub fn run_analysis(
    train: &Table,
    test: Option<&Table>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, PipelineError> {
    let outcome = config.column_filter().apply(train)?;
    let table = &outcome.table;
    let predictors = outcome.predictors();

    let label_column = table.require(&config.label)?;
    let labels = LabelEncoder::fit(label_column)?;
    let y = labels.encode(label_column)?;
    info!(
        n_predictors = predictors.len(),
        classes = ?labels.classes(),
        "training table prepared"
    );

    // Full model: every retained predictor.
    let full_design = Design::new(table, &predictors)?;
    let (full_result, full_model) =
        fit_and_validate(&full_design, &y, &labels, config, config.seed)?;

    // Minimized model: top predictors of the full model, fresh split.
    let top = full_result.top_features(config.top_k)?;
    debug!(?top, "minimized predictor set");
    let min_design = Design::new(table, &top)?;
    let min_seed = config.seed.wrapping_add(1);
    let (min_result, minimized_model) = fit_and_validate(&min_design, &y, &labels, config, min_seed)?;

    let test = match test {
        Some(test) => Some(predict_test(
            test,
            &labels,
            (&full_design, &full_result),
            (&min_design, &min_result),
        )?),
        None => None,
    };

    Ok(AnalysisReport {
        label: config.label.clone(),
        classes: labels.classes().to_vec(),
        n_rows: train.n_rows(),
        filter: outcome.report,
        full_model,
        minimized_model,
        test,
    })
}

#[instrument(skip_all, fields(n_predictors = design.names.len(), seed = seed))]
fn fit_and_validate(
    design: &Design,
    y: &[usize],
    labels: &LabelEncoder,
    config: &AnalysisConfig,
    seed: u64,
) -> Result<(RandomForestResult, ModelSummary), PipelineError> {
    let split = StratifiedSplit::new(config.split_fraction)?
        .with_seed(seed)
        .split(y)?;

    let rf_config = RandomForestConfig::new(config.n_trees)?
        .with_max_depth(config.max_depth)
        .with_oob_mode(OobMode::Enabled)
        .with_seed(seed);
    let result = rf_config.fit(
        &take(&design.features, &split.train),
        &take(y, &split.train),
        &design.names,
    )?;

    let predicted = result
        .forest()
        .predict_batch(&take(&design.features, &split.validation))?;
    let confusion =
        ConfusionMatrix::from_labels(&take(y, &split.validation), &predicted, labels.n_classes())?;
    let accuracy_percent = 100.0 * confusion.accuracy();

    let oob = result.oob_score();
    info!(
        validation_accuracy_percent = accuracy_percent,
        oob_error = ?oob.map(|s| s.error),
        "model validated"
    );
    debug!("validation confusion matrix\n{}", confusion.display_with(labels.classes()));

    let summary = ModelSummary {
        n_predictors: design.names.len(),
        predictors: design.names.clone(),
        seed,
        split: SplitSizes::from(&split),
        oob_error: oob.map(|s| s.error),
        oob_error_curve: oob.map(|s| s.error_curve.clone()).unwrap_or_default(),
        validation_accuracy_percent: accuracy_percent,
        misclassification_percent: 100.0 - accuracy_percent,
        class_metrics: confusion.class_metrics(),
        confusion,
        importances: result.importances().to_vec(),
    };
    Ok((result, summary))
}

#[instrument(skip_all, fields(n_rows = test.n_rows()))]
fn predict_test(
    test: &Table,
    labels: &LabelEncoder,
    full: (&Design, &RandomForestResult),
    minimized: (&Design, &RandomForestResult),
) -> Result<TestPredictions, PipelineError> {
    let predict = |(design, result): (&Design, &RandomForestResult)| -> Result<Vec<String>, PipelineError> {
        let x = design.encoder.encode(test)?;
        let codes = result.forest().predict_batch(&x)?;
        Ok(labels.decode_all(&codes)?)
    };
    let full_model = predict(full)?;
    let minimized_model = predict(minimized)?;
    let agreement = Agreement::compare(&full_model, &minimized_model)?;
    info!(
        identical = agreement.identical,
        n_disagreements = agreement.n_disagreements,
        "test predictions compared"
    );
    Ok(TestPredictions {
        n_rows: test.n_rows(),
        full_model,
        minimized_model,
        agreement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftqual_io::{Column, ColumnData};
    use liftqual_prep::FilterRule;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const CLASSES: [&str; 5] = ["A", "B", "C", "D", "E"];
    const USERS: [&str; 3] = ["adelmo", "carlitos", "pedro"];

    /// Raw-export-shaped table: bookkeeping columns, a sparse summary
    /// column, three informative sensors, three noise sensors.
    fn sensor_table(per_class: usize, seed: u64, labeled: bool) -> Table {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n = per_class * CLASSES.len();
        let class_of = |i: usize| i % CLASSES.len();

        let mut columns = vec![
            Column::numeric("X", (1..=n).map(|i| i as f64)),
            Column::text("user_name", (0..n).map(|i| USERS[i % USERS.len()])),
            Column::numeric("raw_timestamp_part_1", (0..n).map(|i| 1.32e9 + i as f64)),
            Column::text("new_window", (0..n).map(|i| if i == 0 { "yes" } else { "no" })),
            Column::numeric("num_window", (0..n).map(|i| (i / 3) as f64)),
            Column::new(
                "max_roll_belt",
                ColumnData::Numeric((0..n).map(|i| (i == 0).then_some(1.0)).collect()),
            ),
        ];
        for (s, name) in ["roll_belt", "pitch_forearm", "magnet_dumbbell_z"].iter().enumerate() {
            let values: Vec<f64> = (0..n)
                .map(|i| class_of(i) as f64 * (3.0 + s as f64) + rng.gen_range(0.0..1.0))
                .collect();
            columns.push(Column::numeric(*name, values));
        }
        for name in ["gyros_arm_x", "accel_belt_y", "yaw_arm"] {
            let values: Vec<f64> = (0..n).map(|_| rng.gen_range(-5.0..5.0)).collect();
            columns.push(Column::numeric(name, values));
        }
        if labeled {
            columns.push(Column::text("classe", (0..n).map(|i| CLASSES[class_of(i)])));
        } else {
            columns.push(Column::numeric("problem_id", (1..=n).map(|i| i as f64)));
        }
        Table::new(columns).unwrap()
    }

    fn quick_config() -> AnalysisConfig {
        AnalysisConfig::default().with_n_trees(30).with_top_k(4)
    }

    #[test]
    fn filter_keeps_sensors_and_subject() {
        let report = run_analysis(&sensor_table(20, 1, true), None, &quick_config()).unwrap();

        assert_eq!(report.filter.stage_counts(), vec![13, 12, 11, 8]);
        assert_eq!(
            report.filter.stage(FilterRule::Missingness).unwrap().dropped,
            vec!["max_roll_belt"]
        );
        assert_eq!(report.full_model.n_predictors, 7);
        assert!(report.full_model.predictors.contains(&"user_name".to_string()));
        assert!(!report.full_model.predictors.iter().any(|p| p == "num_window"));
        assert_eq!(report.classes, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn both_models_validate_well() {
        let report = run_analysis(&sensor_table(20, 1, true), None, &quick_config()).unwrap();
        let full = &report.full_model;
        let min = &report.minimized_model;

        assert!(full.validation_accuracy_percent > 90.0, "{}", full.validation_accuracy_percent);
        assert!((full.validation_accuracy_percent + full.misclassification_percent - 100.0).abs() < 1e-9);
        assert_eq!(full.oob_error_curve.len(), 30);
        assert!(full.oob_error.is_some());

        assert_eq!(min.n_predictors, 4);
        assert!(min.predictors.iter().all(|p| full.predictors.contains(p)));
        assert!(min.validation_accuracy_percent > 90.0, "{}", min.validation_accuracy_percent);
        assert_eq!(min.seed, full.seed + 1);
    }

    #[test]
    fn top_k_larger_than_predictor_count_keeps_all() {
        let config = quick_config().with_top_k(15);
        let report = run_analysis(&sensor_table(10, 2, true), None, &config).unwrap();
        assert_eq!(report.minimized_model.n_predictors, report.full_model.n_predictors);
    }

    #[test]
    fn twenty_rows_split_fifteen_five() {
        let config = quick_config().with_n_trees(25);
        let report = run_analysis(&sensor_table(4, 3, true), None, &config).unwrap();
        assert_eq!(report.n_rows, 20);
        assert_eq!(report.full_model.split.n_train, 15);
        assert_eq!(report.full_model.split.n_validation, 5);
        assert_eq!(report.full_model.confusion.total(), 5);
    }

    #[test]
    fn same_inputs_same_report() {
        let train = sensor_table(15, 4, true);
        let test = sensor_table(4, 5, false);
        let a = run_analysis(&train, Some(&test), &quick_config()).unwrap();
        let b = run_analysis(&train, Some(&test), &quick_config()).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_rows_predicted_by_both_models() {
        let train = sensor_table(20, 6, true);
        let test = sensor_table(4, 7, false);
        let report = run_analysis(&train, Some(&test), &quick_config()).unwrap();

        let predictions = report.test.unwrap();
        assert_eq!(predictions.n_rows, 20);
        assert_eq!(predictions.full_model.len(), 20);
        assert_eq!(predictions.agreement.n_compared, 20);
        assert!(predictions.full_model.iter().all(|l| CLASSES.contains(&l.as_str())));
        // The test rows follow the same class cycle as training.
        let correct = predictions
            .full_model
            .iter()
            .enumerate()
            .filter(|(i, l)| l.as_str() == CLASSES[i % 5])
            .count();
        assert!(correct >= 18, "{correct}/20");
    }

    #[test]
    fn report_written_as_artifact() {
        let report = run_analysis(&sensor_table(10, 11, true), None, &quick_config()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let writer = liftqual_io::ReportWriter::new(
            dir.path(),
            liftqual_io::ExperimentName::new("pml").unwrap(),
        )
        .unwrap();
        let path = writer.write_report(&report).unwrap();

        let content: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(content["label"], "classe");
        assert_eq!(content["filter"]["stages"].as_array().unwrap().len(), 3);
        assert_eq!(content["filter"]["stages"][0]["rule"], "missingness");
        assert_eq!(content["minimized_model"]["n_predictors"], 4);
        assert!(content["test"].is_null());
        assert_eq!(
            content["full_model"]["oob_error_curve"].as_array().unwrap().len(),
            30
        );
    }

    #[test]
    fn missing_label_column_fails() {
        let config = quick_config().with_label("quality");
        let result = run_analysis(&sensor_table(10, 8, true), None, &config);
        assert!(matches!(
            result,
            Err(PipelineError::Prep(PrepError::LabelMissing { .. }))
        ));
    }

    #[test]
    fn zero_top_k_fails() {
        let config = quick_config().with_top_k(0);
        let result = run_analysis(&sensor_table(10, 9, true), None, &config);
        assert!(matches!(result, Err(PipelineError::Rf(RfError::InvalidTopK { .. }))));
    }

    #[test]
    fn test_table_missing_predictor_fails() {
        let train = sensor_table(10, 10, true);
        let test = Table::new(vec![Column::numeric("roll_belt", [1.0])]).unwrap();
        let result = run_analysis(&train, Some(&test), &quick_config());
        assert!(matches!(
            result,
            Err(PipelineError::Prep(PrepError::MissingColumn { .. }))
        ));
    }
}
