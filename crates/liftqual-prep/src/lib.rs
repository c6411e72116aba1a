//! Data preparation between loading and model fitting: column filtering,
//! stratified partitioning, and encoding labels and predictors as numbers.

mod encode;
mod error;
mod filter;
mod nzv;
mod partition;

pub use encode::{FeatureEncoder, LabelEncoder};
pub use error::PrepError;
pub use filter::{
    ColumnFilter, ColumnNzv, FilterOutcome, FilterReport, FilterRule, StageReport,
    DEFAULT_NAME_PATTERN,
};
pub use nzv::{near_zero_variance, NzvMetrics, DEFAULT_FREQ_CUT, DEFAULT_UNIQUE_CUT};
pub use partition::{Split, StratifiedSplit};
