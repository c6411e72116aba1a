//! Three-rule column filter: missingness, near-zero variance, name pattern.

use liftqual_io::Table;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::nzv::{near_zero_variance, NzvMetrics, DEFAULT_FREQ_CUT, DEFAULT_UNIQUE_CUT};
use crate::PrepError;

/// Columns whose names match this are bookkeeping, not sensor readings.
pub const DEFAULT_NAME_PATTERN: &str = "timestamp|X|num_window";

/// One of the filter's rules, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterRule {
    /// Any missing cell drops the column.
    Missingness,
    NearZeroVariance,
    /// Name matches the configured pattern.
    NamePattern,
}

impl std::fmt::Display for FilterRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Missingness => "missingness",
            Self::NearZeroVariance => "near-zero variance",
            Self::NamePattern => "name pattern",
        })
    }
}

/// Columns dropped by one rule and the column count after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub rule: FilterRule,
    pub dropped: Vec<String>,
    pub remaining: usize,
}

/// Near-zero-variance diagnostics for one column that reached that rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnNzv {
    pub column: String,
    #[serde(flatten)]
    pub metrics: NzvMetrics,
}

/// What the filter did, rule by rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterReport {
    pub initial_columns: usize,
    pub stages: Vec<StageReport>,
    pub nzv: Vec<ColumnNzv>,
}

impl FilterReport {
    /// Column count before any rule, then after each rule.
    #[must_use]
    pub fn stage_counts(&self) -> Vec<usize> {
        std::iter::once(self.initial_columns)
            .chain(self.stages.iter().map(|s| s.remaining))
            .collect()
    }

    #[must_use]
    pub fn stage(&self, rule: FilterRule) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.rule == rule)
    }
}

/// The filtered table plus the report of how it was produced.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: Table,
    pub report: FilterReport,
    protected: Option<String>,
}

impl FilterOutcome {
    /// Surviving column names other than the protected one, in table order.
    #[must_use]
    pub fn predictors(&self) -> Vec<String> {
        self.table
            .column_names()
            .into_iter()
            .filter(|name| Some(*name) != self.protected.as_deref())
            .map(str::to_string)
            .collect()
    }
}

/// Configuration for the column filter.
///
/// Thresholds and the pattern are validated when the filter is applied.
///
/// # Example
///
/// ```
/// use liftqual_io::{Column, Table};
/// use liftqual_prep::ColumnFilter;
///
/// let table = Table::new(vec![
///     Column::numeric("num_window", [1.0, 2.0, 3.0, 4.0]),
///     Column::numeric("roll_belt", [0.1, 0.4, 0.9, 1.3]),
///     Column::text("classe", ["A", "A", "B", "B"]),
/// ])
/// .unwrap();
/// let outcome = ColumnFilter::new().with_protected("classe").apply(&table).unwrap();
/// assert_eq!(outcome.predictors(), vec!["roll_belt"]);
/// ```
#[derive(Debug, Clone)]
pub struct ColumnFilter {
    freq_cut: f64,
    unique_cut: f64,
    name_pattern: String,
    protected: Option<String>,
}

impl Default for ColumnFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnFilter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            freq_cut: DEFAULT_FREQ_CUT,
            unique_cut: DEFAULT_UNIQUE_CUT,
            name_pattern: DEFAULT_NAME_PATTERN.to_string(),
            protected: None,
        }
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
    pub fn with_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = pattern.into();
        self
    }

    /// Exempt `label` from the variance and name rules. It must still pass
    /// the missingness rule.
    #[must_use]
    pub fn with_protected(mut self, label: impl Into<String>) -> Self {
        self.protected = Some(label.into());
        self
    }

    fn validate(&self) -> Result<Regex, PrepError> {
        if !self.freq_cut.is_finite() || self.freq_cut < 1.0 {
            return Err(PrepError::InvalidThreshold {
                name: "freq_cut",
                value: self.freq_cut,
                requirement: ">= 1",
            });
        }
        if !self.unique_cut.is_finite() || !(0.0..=100.0).contains(&self.unique_cut) {
            return Err(PrepError::InvalidThreshold {
                name: "unique_cut",
                value: self.unique_cut,
                requirement: "within [0, 100]",
            });
        }
        Regex::new(&self.name_pattern).map_err(|e| PrepError::InvalidPattern {
            pattern: self.name_pattern.clone(),
            source: e,
        })
    }

    fn is_protected(&self, name: &str) -> bool {
        self.protected.as_deref() == Some(name)
    }

    /// Apply the three rules in order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::InvalidThreshold`] | `freq_cut < 1`, `unique_cut` outside `[0, 100]`, or non-finite |
    /// | [`PrepError::InvalidPattern`] | name pattern is not a valid regex |
    /// | [`PrepError::LabelMissing`] | protected column absent, or dropped for missing values |
    /// | [`PrepError::AllColumnsRemoved`] | no unprotected column survives |
    #[instrument(skip_all, fields(n_columns = table.n_columns(), n_rows = table.n_rows()))]
    pub fn apply(&self, table: &Table) -> Result<FilterOutcome, PrepError> {
        let pattern = self.validate()?;
        if let Some(label) = &self.protected
            && table.column(label).is_none()
        {
            return Err(PrepError::LabelMissing {
                label: label.clone(),
            });
        }

        let mut stages = Vec::with_capacity(3);

        // Rule a: missingness. The protected column gets no exemption here.
        let mask: Vec<bool> = table.columns().iter().map(|c| c.n_missing() == 0).collect();
        let current = self.run_stage(table, &mask, FilterRule::Missingness, &mut stages)?;
        if let Some(label) = &self.protected
            && current.column(label).is_none()
        {
            return Err(PrepError::LabelMissing {
                label: label.clone(),
            });
        }

        // Rule b: near-zero variance.
        let nzv: Vec<ColumnNzv> = current
            .columns()
            .iter()
            .map(|c| ColumnNzv {
                column: c.name().to_string(),
                metrics: near_zero_variance(c, self.freq_cut, self.unique_cut),
            })
            .collect();
        let mask: Vec<bool> = nzv
            .iter()
            .map(|entry| !entry.metrics.nzv || self.is_protected(&entry.column))
            .collect();
        let current = self.run_stage(&current, &mask, FilterRule::NearZeroVariance, &mut stages)?;

        // Rule c: name pattern.
        let mask: Vec<bool> = current
            .columns()
            .iter()
            .map(|c| !pattern.is_match(c.name()) || self.is_protected(c.name()))
            .collect();
        let current = self.run_stage(&current, &mask, FilterRule::NamePattern, &mut stages)?;

        let n_predictors = current
            .column_names()
            .iter()
            .filter(|name| !self.is_protected(name))
            .count();
        if n_predictors == 0 {
            return Err(PrepError::AllColumnsRemoved);
        }

        let report = FilterReport {
            initial_columns: table.n_columns(),
            stages,
            nzv,
        };
        info!(
            stage_counts = ?report.stage_counts(),
            n_predictors,
            "column filter applied"
        );
        Ok(FilterOutcome {
            table: current,
            report,
            protected: self.protected.clone(),
        })
    }

    fn run_stage(
        &self,
        table: &Table,
        mask: &[bool],
        rule: FilterRule,
        stages: &mut Vec<StageReport>,
    ) -> Result<Table, PrepError> {
        let dropped: Vec<String> = table
            .columns()
            .iter()
            .zip(mask)
            .filter(|(_, keep)| !**keep)
            .map(|(c, _)| c.name().to_string())
            .collect();
        let kept = table.retain_columns(mask)?;
        debug!(%rule, n_dropped = dropped.len(), remaining = kept.n_columns(), "rule applied");
        stages.push(StageReport {
            rule,
            dropped,
            remaining: kept.n_columns(),
        });
        Ok(kept)
    }
}
