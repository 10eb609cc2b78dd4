//! FILENAME: core/metrics-engine/src/calculator.rs
//! Metric Calculator - one scalar per (record set, metric).
//!
//! Values are always computed from the rows themselves. Ratio metrics (ATV,
//! AUV, UPT, ...) are never derived from other already-divided values, so a
//! parent group is computed exactly like a leaf: feed it its rows.
//!
//! Uniqueness rules:
//! - transactions / units count distinct ids, falling back to the row count
//!   when no row carries the id at all
//! - members counts distinct member ids with no fallback
//!
//! Every division by zero yields 0 and no NaN/Infinity ever leaves here.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use records::Record;
use rustc_hash::FxHashSet;

use crate::definition::{MetricId, RevenueBasis};

// ============================================================================
// METRIC ACCUMULATOR
// ============================================================================

/// Accumulator holding everything needed to compute any catalog metric.
/// Rows are consumed once; `compute` can then be called for each metric.
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator<'a> {
    basis: RevenueBasis,
    rows: u64,
    revenue: f64,
    vat: f64,
    discount_amount: f64,
    discounted_rows: u64,
    discount_percentage_sum: f64,
    transactions: FxHashSet<&'a str>,
    members: FxHashSet<&'a str>,
    items: FxHashSet<&'a str>,
    dates: BTreeSet<NaiveDate>,
}

impl<'a> MetricAccumulator<'a> {
    pub fn new(basis: RevenueBasis) -> Self {
        MetricAccumulator {
            basis,
            ..MetricAccumulator::default()
        }
    }

    /// Adds a record, normalizing its date on the way in.
    pub fn add(&mut self, record: &'a Record) {
        self.add_dated(record, record.parsed_date());
    }

    /// Adds a record whose date was already normalized by the caller.
    pub fn add_dated(&mut self, record: &'a Record, date: Option<NaiveDate>) {
        self.rows += 1;

        self.revenue += match self.basis {
            RevenueBasis::Gross => record.amount,
            RevenueBasis::NetOfVat => record.amount - record.vat,
        };
        self.vat += record.vat;
        self.discount_amount += record.discount_amount;

        if record.discount_amount != 0.0 {
            self.discounted_rows += 1;
            self.discount_percentage_sum += record.discount_percentage;
        }

        if let Some(id) = record.transaction_id() {
            self.transactions.insert(id);
        }
        if let Some(id) = record.member_id() {
            self.members.insert(id);
        }
        if let Some(id) = record.item_id() {
            self.items.insert(id);
        }
        if let Some(d) = date {
            self.dates.insert(d);
        }
    }

    /// Number of rows consumed.
    pub fn row_count(&self) -> u64 {
        self.rows
    }

    fn transaction_count(&self) -> f64 {
        if self.transactions.is_empty() {
            self.rows as f64
        } else {
            self.transactions.len() as f64
        }
    }

    fn unit_count(&self) -> f64 {
        if self.items.is_empty() {
            self.rows as f64
        } else {
            self.items.len() as f64
        }
    }

    /// Mean gap in days between consecutive distinct purchase dates.
    fn purchase_frequency(&self) -> f64 {
        let (Some(first), Some(last)) = (self.dates.first(), self.dates.last()) else {
            return 0.0;
        };
        let gaps = self.dates.len() - 1;
        if gaps == 0 {
            return 0.0;
        }
        // Consecutive gaps telescope to last - first.
        (*last - *first).num_days() as f64 / gaps as f64
    }

    /// Computes the final value for a metric.
    pub fn compute(&self, metric: MetricId) -> f64 {
        let value = match metric {
            MetricId::Revenue => self.revenue,
            MetricId::Transactions => self.transaction_count(),
            MetricId::Members => self.members.len() as f64,
            MetricId::Units => self.unit_count(),
            MetricId::Atv => ratio(self.revenue, self.transaction_count()),
            MetricId::Auv | MetricId::Asv => ratio(self.revenue, self.members.len() as f64),
            MetricId::Upt => ratio(self.unit_count(), self.transaction_count()),
            MetricId::Vat => self.vat,
            MetricId::DiscountAmount => self.discount_amount,
            MetricId::DiscountPercentage => {
                ratio(self.discount_percentage_sum, self.discounted_rows as f64)
            }
            MetricId::PurchaseFrequency => self.purchase_frequency(),
        };
        finite_or_zero(value)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Computes one metric over a set of records using gross revenue.
pub fn compute_metric<'a, I>(records: I, metric: MetricId) -> f64
where
    I: IntoIterator<Item = &'a Record>,
{
    compute_metric_with_basis(records, metric, RevenueBasis::Gross)
}

/// Computes one metric over a set of records with an explicit revenue basis.
pub fn compute_metric_with_basis<'a, I>(records: I, metric: MetricId, basis: RevenueBasis) -> f64
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut acc = MetricAccumulator::new(basis);
    for record in records {
        acc.add(record);
    }
    acc.compute(metric)
}
