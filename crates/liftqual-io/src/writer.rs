//! JSON report writer and per-row answer-file writer.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::ExperimentName;
use crate::IoError;

fn create_dir(path: &Path) -> Result<(), IoError> {
    fs::create_dir_all(path).map_err(|e| IoError::OutputDirCreate {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), IoError> {
    fs::write(path, contents).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes analysis reports as pretty-printed JSON.
///
/// Creates the output directory on construction if it does not exist.
/// The report lands in `{experiment}_report.json`.
pub struct ReportWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ReportWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        create_dir(output_dir)?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// `{output_dir}/{experiment}_report.json`; nothing is written.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_report.json", self.experiment.as_str()))
    }

    /// Serialize `report` to [`report_path`](Self::report_path).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | `report` fails to serialize |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all, fields(experiment = %self.experiment))]
    pub fn write_report<T: Serialize>(&self, report: &T) -> Result<PathBuf, IoError> {
        let path = self.report_path();
        let json = serde_json::to_string_pretty(report).map_err(|e| IoError::Serialize {
            what: "analysis report".to_string(),
            source: e,
        })?;
        write_file(&path, &json)?;
        info!(path = %path.display(), "report written");
        Ok(path)
    }
}

/// Writes one plain-text file per predicted test row.
///
/// Row `i` (zero-based) goes to `problem_id_{i + 1}.txt`, holding just the
/// predicted label and a trailing newline.
pub struct AnswerWriter {
    output_dir: PathBuf,
}

impl AnswerWriter {
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        create_dir(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Write every label, returning the created paths in row order.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] on the first file that cannot be written.
    #[instrument(skip_all, fields(n_answers = labels.len()))]
    pub fn write<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<PathBuf>, IoError> {
        let mut paths = Vec::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            let path = self.output_dir.join(format!("problem_id_{}.txt", i + 1));
            write_file(&path, &format!("{}\n", label.as_ref()))?;
            paths.push(path);
        }
        info!(n = paths.len(), dir = %self.output_dir.display(), "answer files written");
        Ok(paths)
    }
}
