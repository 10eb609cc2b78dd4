//! FILENAME: core/metrics-engine/src/definition.rs
//! Metrics Pivot Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a metrics pivot:
//! - The fixed metric catalog (what can be measured)
//! - The bucket window (which months become columns)
//! - The grouping dimensions (which rows exist)
//!
//! Every dashboard table is a `PivotDefinition` over the shared engine.

use std::fmt;
use std::str::FromStr;

use records::Dimension;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ============================================================================
// METRIC CATALOG
// ============================================================================

/// Identifier of a catalog metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricId {
    Revenue,
    Transactions,
    Members,
    Units,
    Atv,
    Auv,
    Asv,
    Upt,
    Vat,
    DiscountAmount,
    DiscountPercentage,
    PurchaseFrequency,
}

impl MetricId {
    /// The id as it appears in definitions and the UI ("discountAmount").
    pub fn as_str(self) -> &'static str {
        match self {
            MetricId::Revenue => "revenue",
            MetricId::Transactions => "transactions",
            MetricId::Members => "members",
            MetricId::Units => "units",
            MetricId::Atv => "atv",
            MetricId::Auv => "auv",
            MetricId::Asv => "asv",
            MetricId::Upt => "upt",
            MetricId::Vat => "vat",
            MetricId::DiscountAmount => "discountAmount",
            MetricId::DiscountPercentage => "discountPercentage",
            MetricId::PurchaseFrequency => "purchaseFrequency",
        }
    }

    /// Catalog entry for this id.
    pub fn definition(self) -> &'static MetricDefinition {
        // The catalog holds every variant exactly once.
        METRIC_CATALOG
            .iter()
            .find(|m| m.id == self)
            .unwrap_or(&METRIC_CATALOG[0])
    }

    /// Whether parent values equal the sum of child values for disjoint rows.
    pub fn is_additive(self) -> bool {
        matches!(
            self,
            MetricId::Revenue | MetricId::Vat | MetricId::DiscountAmount
        )
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        METRIC_CATALOG
            .iter()
            .map(|m| m.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| EngineError::UnknownMetric(s.to_string()))
    }
}

/// How a metric value is displayed. Never affects computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormatKind {
    Currency,
    Number,
    Percentage,
    Days,
}

/// One entry of the metric catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    pub id: MetricId,
    pub label: &'static str,
    pub format_kind: FormatKind,
}

const fn entry(id: MetricId, label: &'static str, format_kind: FormatKind) -> MetricDefinition {
    MetricDefinition { id, label, format_kind }
}

/// The metric catalog, in tab order.
pub const METRIC_CATALOG: [MetricDefinition; 12] = [
    entry(MetricId::Revenue, "Revenue", FormatKind::Currency),
    entry(MetricId::Transactions, "Transactions", FormatKind::Number),
    entry(MetricId::Members, "Unique Members", FormatKind::Number),
    entry(MetricId::Units, "Units Sold", FormatKind::Number),
    entry(MetricId::Atv, "ATV", FormatKind::Currency),
    entry(MetricId::Auv, "AUV", FormatKind::Currency),
    entry(MetricId::Asv, "ASV", FormatKind::Currency),
    entry(MetricId::Upt, "UPT", FormatKind::Number),
    entry(MetricId::Vat, "VAT", FormatKind::Currency),
    entry(MetricId::DiscountAmount, "Discount Amount", FormatKind::Currency),
    entry(MetricId::DiscountPercentage, "Discount %", FormatKind::Percentage),
    entry(MetricId::PurchaseFrequency, "Purchase Frequency", FormatKind::Days),
];

/// Ordered catalog for UI tab rendering.
pub fn metric_catalog() -> &'static [MetricDefinition] {
    &METRIC_CATALOG
}

// ============================================================================
// REVENUE BASIS
// ============================================================================

/// Whether revenue-derived metrics use gross amounts or amounts net of VAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevenueBasis {
    #[default]
    Gross,
    NetOfVat,
}

// ============================================================================
// BUCKET WINDOW
// ============================================================================

/// Shape of the bucket list a view asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowShape {
    /// N consecutive months ending at the anchor month.
    #[default]
    Rolling,
    /// Each month of the rolling window paired with the same month a year earlier.
    YearOverYear,
}

/// Column order of the generated buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BucketOrder {
    #[default]
    Ascending,
    Descending,
}

/// Which months become pivot columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketWindow {
    /// Number of periods (months, or month pairs for year-over-year).
    pub months: u32,
    pub shape: WindowShape,
    pub order: BucketOrder,
}

impl Default for BucketWindow {
    fn default() -> Self {
        BucketWindow {
            months: 12,
            shape: WindowShape::Rolling,
            order: BucketOrder::Ascending,
        }
    }
}

impl BucketWindow {
    pub fn rolling(months: u32) -> Self {
        BucketWindow {
            months,
            ..BucketWindow::default()
        }
    }

    pub fn year_over_year(months: u32) -> Self {
        BucketWindow {
            months,
            shape: WindowShape::YearOverYear,
            ..BucketWindow::default()
        }
    }

    pub fn descending(mut self) -> Self {
        self.order = BucketOrder::Descending;
        self
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete, serializable definition of one pivot view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotDefinition {
    /// Outer grouping (e.g. category).
    pub primary: Dimension,

    /// Inner grouping (e.g. product). `None` gives a single-level pivot.
    #[serde(default)]
    pub secondary: Option<Dimension>,

    /// The metric shown in every cell.
    #[serde(default = "default_metric")]
    pub metric: MetricId,

    #[serde(default)]
    pub window: BucketWindow,

    #[serde(default)]
    pub revenue_basis: RevenueBasis,
}

fn default_metric() -> MetricId {
    MetricId::Revenue
}

impl PivotDefinition {
    /// Creates a two-level definition showing revenue over the default window.
    pub fn new(primary: Dimension, secondary: Option<Dimension>) -> Self {
        PivotDefinition {
            primary,
            secondary,
            metric: MetricId::Revenue,
            window: BucketWindow::default(),
            revenue_basis: RevenueBasis::Gross,
        }
    }

    pub fn with_metric(mut self, metric: MetricId) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_window(mut self, window: BucketWindow) -> Self {
        self.window = window;
        self
    }

    /// Loads a definition from JSON.
    pub fn from_json(s: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Row header label, e.g. "Category/Product".
    pub fn row_header(&self) -> String {
        match self.secondary {
            Some(secondary) => format!(
                "{}/{}",
                self.primary.display_name(),
                secondary.display_name()
            ),
            None => self.primary.display_name().to_string(),
        }
    }
}
