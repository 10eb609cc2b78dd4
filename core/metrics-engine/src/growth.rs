//! FILENAME: core/metrics-engine/src/growth.rs
//! PURPOSE: Period-over-period and year-over-year growth indicators.
//! CONTEXT: The zero-baseline policy is asymmetric on purpose and must stay
//! that way: growth from nothing is the "+100" sentinel (the true percentage
//! is undefined), while a drop to nothing is a real -100%.

use std::fmt;

use serde::Serialize;

use crate::bucket::BucketPair;
use crate::view::{GroupNode, PivotTree};

/// Growth between two values of the same metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Growth {
    /// Both values are zero; renders as empty.
    None,
    /// Previous is zero and current is not; renders as "+100".
    Sentinel,
    /// Percentage change rounded to one decimal.
    Percent(f64),
}

impl Growth {
    /// Numeric percentage, with the sentinel read as 100.
    pub fn as_percent(&self) -> Option<f64> {
        match self {
            Growth::None => None,
            Growth::Sentinel => Some(100.0),
            Growth::Percent(p) => Some(*p),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Growth::None)
    }
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Growth::None => Ok(()),
            Growth::Sentinel => f.write_str("+100"),
            Growth::Percent(p) => write!(f, "{:.1}", p),
        }
    }
}

/// Growth of `current` over `previous`.
pub fn growth(current: f64, previous: f64) -> Growth {
    let current = if current.is_finite() { current } else { 0.0 };
    let previous = if previous.is_finite() { previous } else { 0.0 };

    if previous == 0.0 {
        return if current == 0.0 {
            Growth::None
        } else {
            Growth::Sentinel
        };
    }

    let pct = (current - previous) / previous * 100.0;
    let rounded = (pct * 10.0).round() / 10.0;
    // Normalize -0.0 so it never renders as "-0.0".
    Growth::Percent(if rounded == 0.0 { 0.0 } else { rounded })
}

/// Growth of each value against the one before it; the first has none.
pub fn period_over_period(values: &[f64]) -> Vec<Growth> {
    let mut out = Vec::with_capacity(values.len());
    if !values.is_empty() {
        out.push(Growth::None);
    }
    out.extend(values.windows(2).map(|w| growth(w[1], w[0])));
    out
}

/// Growth for `(current, previous)` value pairs.
pub fn year_over_year(pairs: &[(f64, f64)]) -> Vec<Growth> {
    pairs.iter().map(|&(current, previous)| growth(current, previous)).collect()
}

/// Year-over-year growth of a node for bucket pairs present in the tree.
/// Pairs whose buckets are not columns of the tree compare zeros.
pub fn node_year_over_year(
    tree: &PivotTree,
    node: &GroupNode,
    pairs: &[BucketPair],
) -> Vec<Growth> {
    let values: Vec<(f64, f64)> = pairs
        .iter()
        .map(|p| {
            (
                tree.bucket_value(node, &p.current.key),
                tree.bucket_value(node, &p.previous.key),
            )
        })
        .collect();
    year_over_year(&values)
}
