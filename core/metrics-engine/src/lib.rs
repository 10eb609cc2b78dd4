//! FILENAME: core/metrics-engine/src/lib.rs
//! Metrics pivot engine for studio records.
//!
//! Every dashboard table is the same computation: records grouped by one or
//! two dimensions, bucketed into calendar months, one catalog metric per
//! cell, growth between buckets, then sorted, collapsed and exported. This
//! crate is that computation once. It depends on `records` for the record
//! shape and date normalization.
//!
//! Layers:
//! - `definition`: Serializable configuration and the metric catalog
//! - `bucket`: Month columns anchored to "now"
//! - `calculator`: One metric over one set of records (HOW we compute)
//! - `engine`: Grouping, per-node aggregation and drill-down
//! - `view`: The computed tree (WHAT we display)
//! - `growth`: Period-over-period and year-over-year indicators
//! - `view_state`: Sort and collapse state, display ordering
//! - `export`: Tab-separated clipboard text
//! - `format`: Display formatting by metric kind

pub mod bucket;
pub mod calculator;
pub mod definition;
pub mod engine;
pub mod error;
pub mod export;
pub mod format;
pub mod growth;
pub mod view;
pub mod view_state;

pub use bucket::{
    flatten_pairs, rolling_months, year_over_year, Bucket, BucketPair, MAX_WINDOW_MONTHS,
};
pub use calculator::{compute_metric, compute_metric_with_basis, MetricAccumulator};
pub use definition::*;
pub use engine::{calculate_pivot, drill_down, PivotCalculator, TOTAL_KEY};
pub use error::EngineError;
pub use export::{serialize_all_metrics, serialize_pivot, ExportOptions};
pub use format::{format_value, FormatOptions};
pub use growth::{growth, node_year_over_year, period_over_period, Growth};
pub use view::*;
pub use view_state::{
    ordered_groups, visible_rows, PivotRow, RowKind, SortDirection, SortKey, ViewState,
};
