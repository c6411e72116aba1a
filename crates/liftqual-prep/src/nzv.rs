//! Near-zero-variance diagnostics for a single column.

use std::collections::HashMap;

use liftqual_io::{Column, ColumnData};
use serde::Serialize;

/// Default most-common / second-most-common frequency ratio cutoff (95/5).
pub const DEFAULT_FREQ_CUT: f64 = 95.0 / 5.0;

/// Default distinct-value percentage cutoff.
pub const DEFAULT_UNIQUE_CUT: f64 = 10.0;

/// Frequency diagnostics of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NzvMetrics {
    /// Count of the most common value over the count of the second most
    /// common; 0 when there are fewer than two distinct values.
    pub freq_ratio: f64,
    /// `100 * distinct / len`, with distinct counted over present cells.
    pub percent_unique: f64,
    /// At most one distinct present value.
    pub zero_var: bool,
    pub nzv: bool,
}

#[derive(PartialEq, Eq, Hash)]
enum ValueKey<'a> {
    Number(u64),
    Text(&'a str),
}

fn value_counts(column: &Column) -> HashMap<ValueKey<'_>, usize> {
    let mut counts = HashMap::new();
    match column.data() {
        ColumnData::Numeric(values) => {
            // +0.0 folds -0.0 into 0.0 so both count as one value.
            for v in values.iter().flatten() {
                *counts.entry(ValueKey::Number((v + 0.0).to_bits())).or_insert(0) += 1;
            }
        }
        ColumnData::Text(values) => {
            for v in values.iter().flatten() {
                *counts.entry(ValueKey::Text(v.as_str())).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Compute frequency diagnostics for `column`.
///
/// The column is near-zero-variance when it is zero-variance, or when
/// `freq_ratio > freq_cut` and `percent_unique <= unique_cut`.
#[must_use]
pub fn near_zero_variance(column: &Column, freq_cut: f64, unique_cut: f64) -> NzvMetrics {
    let counts = value_counts(column);
    let distinct = counts.len();

    let mut top = [0usize; 2];
    for &count in counts.values() {
        if count > top[0] {
            top = [count, top[0]];
        } else if count > top[1] {
            top[1] = count;
        }
    }

    let freq_ratio = if distinct < 2 {
        0.0
    } else {
        top[0] as f64 / top[1] as f64
    };
    let percent_unique = if column.is_empty() {
        0.0
    } else {
        100.0 * distinct as f64 / column.len() as f64
    };
    let zero_var = distinct <= 1;

    NzvMetrics {
        freq_ratio,
        percent_unique,
        zero_var,
        nzv: zero_var || (freq_ratio > freq_cut && percent_unique <= unique_cut),
    }
}
