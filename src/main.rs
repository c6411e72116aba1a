mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use liftqual_io::{AnswerWriter, ExperimentName, ReportWriter, TableReader};
use liftqual_prep::{ColumnNzv, StageReport, DEFAULT_FREQ_CUT, DEFAULT_NAME_PATTERN, DEFAULT_UNIQUE_CUT};

use crate::pipeline::{run_analysis, AnalysisConfig};

#[derive(Parser)]
#[command(name = "liftqual")]
#[command(about = "Weight-lifting exercise quality classification from wearable sensor data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Column filter thresholds shared by both subcommands.
#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Name of the outcome column
    #[arg(long, default_value = "classe")]
    label: String,

    /// Most-common / second-most-common frequency ratio above which a column may be near-zero variance
    #[arg(long, default_value_t = DEFAULT_FREQ_CUT)]
    freq_cut: f64,

    /// Distinct-value percentage at or below which a column may be near-zero variance
    #[arg(long, default_value_t = DEFAULT_UNIQUE_CUT)]
    unique_cut: f64,

    /// Drop columns whose names match this regex
    #[arg(long, default_value = DEFAULT_NAME_PATTERN)]
    drop_pattern: String,
}

#[derive(Subcommand)]
enum Command {
    /// Filter, split, train the full and minimized forests, and predict the test file
    Analyze {
        /// Path to the labeled training CSV
        #[arg(long)]
        train: PathBuf,

        /// Path to the unlabeled test CSV
        #[arg(long)]
        test: Option<PathBuf>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long, default_value = "liftqual")]
        experiment: String,

        /// Output directory for the report
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Fraction of each class assigned to training
        #[arg(long, default_value_t = 0.75)]
        split_fraction: f64,

        /// Number of trees in each forest
        #[arg(long, default_value_t = 100)]
        n_trees: usize,

        /// Number of most important predictors kept by the minimized model
        #[arg(long, default_value_t = 15)]
        top_k: usize,

        /// Maximum tree depth (unlimited if not set)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Write one problem_id_{i}.txt per test row into this directory
        #[arg(long)]
        answers_dir: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Load a CSV and report what the column filter would drop
    Inspect {
        /// Path to the CSV file
        #[arg(long)]
        data: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct ModelOutput {
    n_predictors: usize,
    validation_accuracy_percent: f64,
    misclassification_percent: f64,
    oob_error: Option<f64>,
}

#[derive(Serialize)]
struct AnalyzeOutput {
    experiment: String,
    report_path: PathBuf,
    n_rows: usize,
    n_classes: usize,
    stage_counts: Vec<usize>,
    full_model: ModelOutput,
    minimized_model: ModelOutput,
    test_predictions: Option<Vec<String>>,
    predictions_identical: Option<bool>,
    answers_written: usize,
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    data: PathBuf,
    n_rows: usize,
    n_columns: usize,
    stage_counts: Vec<usize>,
    stages: &'a [StageReport],
    predictors: Vec<String>,
    nzv: &'a [ColumnNzv],
}

impl FilterArgs {
    fn apply_to(&self, config: AnalysisConfig) -> AnalysisConfig {
        config
            .with_label(self.label.clone())
            .with_freq_cut(self.freq_cut)
            .with_unique_cut(self.unique_cut)
            .with_name_pattern(self.drop_pattern.clone())
    }
}

fn model_output(summary: &pipeline::ModelSummary) -> ModelOutput {
    ModelOutput {
        n_predictors: summary.n_predictors,
        validation_accuracy_percent: summary.validation_accuracy_percent,
        misclassification_percent: summary.misclassification_percent,
        oob_error: summary.oob_error,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Analyze {
            train,
            test,
            experiment,
            output_dir,
            split_fraction,
            n_trees,
            top_k,
            max_depth,
            answers_dir,
            filter,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let config = filter
                .apply_to(AnalysisConfig::default())
                .with_split_fraction(split_fraction)
                .with_n_trees(n_trees)
                .with_top_k(top_k)
                .with_max_depth(max_depth)
                .with_seed(cli.seed);

            // 1. Read inputs
            let train_table = TableReader::new(&train)
                .read()
                .context("failed to read training CSV")?;
            let test_table = test
                .as_deref()
                .map(|path| TableReader::new(path).read())
                .transpose()
                .context("failed to read test CSV")?;

            // 2. Analyze
            let report = run_analysis(&train_table, test_table.as_ref(), &config)
                .with_context(|| format!("analysis of label \"{}\" failed", config.label()))?;

            // 3. Write report artifact
            let writer = ReportWriter::new(&output_dir, experiment_name)?;
            let report_path = writer.write_report(&report)?;

            // 4. Optional answer files
            let test_predictions = report.test.as_ref().map(|t| t.full_model.clone());
            let answers_written = match (&answers_dir, &test_predictions) {
                (Some(dir), Some(labels)) => AnswerWriter::new(dir)?
                    .write(labels)
                    .context("failed to write answer files")?
                    .len(),
                (Some(_), None) => {
                    warn!("--answers-dir given without --test; no answer files written");
                    0
                }
                (None, _) => 0,
            };

            // 5. Print summary
            let output = AnalyzeOutput {
                experiment,
                report_path,
                n_rows: report.n_rows,
                n_classes: report.classes.len(),
                stage_counts: report.filter.stage_counts(),
                full_model: model_output(&report.full_model),
                minimized_model: model_output(&report.minimized_model),
                predictions_identical: report.test.as_ref().map(|t| t.agreement.identical),
                test_predictions,
                answers_written,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Inspect { data, filter } => {
            let table = TableReader::new(&data)
                .read()
                .context("failed to read input CSV")?;

            let outcome = filter
                .apply_to(AnalysisConfig::default())
                .column_filter()
                .apply(&table)
                .context("column filtering failed")?;

            let output = InspectOutput {
                data,
                n_rows: table.n_rows(),
                n_columns: table.n_columns(),
                stage_counts: outcome.report.stage_counts(),
                stages: &outcome.report.stages,
                predictors: outcome.predictors(),
                nzv: &outcome.report.nzv,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
