//! FILENAME: core/metrics-engine/src/bucket.rs
//! PURPOSE: Month bucket generation anchored to "now".
//! CONTEXT: Buckets are the pivot's columns. Lists are generated fresh per
//! view but are deterministic for a given anchor and window; ordering is the
//! caller's choice and is applied last.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::definition::{BucketOrder, BucketWindow, WindowShape};

/// Longest window a view can ask for (ten years of months or month pairs).
/// Window lengths arrive from JSON definitions, so larger counts are clamped.
pub const MAX_WINDOW_MONTHS: u32 = 120;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ============================================================================
// BUCKET
// ============================================================================

/// One calendar month column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bucket {
    /// Canonical "YYYY-MM" key.
    pub key: String,
    /// Short display label, e.g. "Mar 2024".
    pub display: String,
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

impl Bucket {
    /// Bucket for a year and 1-based month. Out-of-range months wrap into
    /// neighbouring years.
    pub fn new(year: i32, month: u32) -> Self {
        Self::from_index(year * 12 + month as i32 - 1)
    }

    /// Bucket of the month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Month index: year * 12 + (month - 1).
    fn index(&self) -> i32 {
        self.year * 12 + self.month as i32 - 1
    }

    fn from_index(index: i32) -> Self {
        let year = index.div_euclid(12);
        let month = index.rem_euclid(12) as u32 + 1;
        Bucket {
            key: format!("{:04}-{:02}", year, month),
            display: format!("{} {}", MONTH_NAMES[(month - 1) as usize], year),
            year,
            month,
        }
    }

    /// Same bucket shifted by a number of months (negative = earlier).
    pub fn shifted(&self, months: i32) -> Self {
        Self::from_index(self.index() + months)
    }

    /// The same month one year earlier.
    pub fn year_ago(&self) -> Self {
        self.shifted(-12)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// A current month paired with its year-ago sibling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPair {
    pub current: Bucket,
    pub previous: Bucket,
}

// ============================================================================
// GENERATORS
// ============================================================================

/// `count` consecutive months ending at the anchor's month, ascending.
/// `count` is clamped to `MAX_WINDOW_MONTHS`.
pub fn rolling_months(count: u32, anchor: NaiveDate) -> Vec<Bucket> {
    if count > MAX_WINDOW_MONTHS {
        log::warn!("window of {} months clamped to {}", count, MAX_WINDOW_MONTHS);
    }
    let count = count.min(MAX_WINDOW_MONTHS);
    let last = Bucket::from_date(anchor);
    (0..count as i32)
        .rev()
        .map(|back| last.shifted(-back))
        .collect()
}

/// Each month of the rolling window paired with the same month a year
/// earlier, ascending by current month.
pub fn year_over_year(count: u32, anchor: NaiveDate) -> Vec<BucketPair> {
    rolling_months(count, anchor)
        .into_iter()
        .map(|current| BucketPair {
            previous: current.year_ago(),
            current,
        })
        .collect()
}

/// Flattens pairs into a column list: current then previous for each pair.
pub fn flatten_pairs(pairs: &[BucketPair]) -> Vec<Bucket> {
    pairs
        .iter()
        .flat_map(|p| [p.current.clone(), p.previous.clone()])
        .collect()
}

impl BucketWindow {
    /// Column buckets for this window. Year-over-year windows yield each
    /// current month followed by its year-ago sibling.
    pub fn buckets(&self, anchor: NaiveDate) -> Vec<Bucket> {
        match self.shape {
            WindowShape::Rolling => {
                let mut buckets = rolling_months(self.months, anchor);
                if self.order == BucketOrder::Descending {
                    buckets.reverse();
                }
                buckets
            }
            WindowShape::YearOverYear => flatten_pairs(&self.pairs(anchor)),
        }
    }

    /// Year-over-year pairs for this window's length, in the window's order.
    pub fn pairs(&self, anchor: NaiveDate) -> Vec<BucketPair> {
        let mut pairs = year_over_year(self.months, anchor);
        if self.order == BucketOrder::Descending {
            pairs.reverse();
        }
        pairs
    }

    pub fn buckets_from_today(&self) -> Vec<Bucket> {
        self.buckets(Local::now().date_naive())
    }

    pub fn pairs_from_today(&self) -> Vec<BucketPair> {
        self.pairs(Local::now().date_naive())
    }
}
