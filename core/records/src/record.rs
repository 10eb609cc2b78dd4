//! FILENAME: core/records/src/record.rs
//! PURPOSE: The normalized record shape consumed by the metrics engine.
//! CONTEXT: Sales, leads, cancellations and payroll rows are all mapped onto
//! this one struct at ingestion (see `mapping`). Optional text fields are
//! kept as `Option<String>`; readers go through the accessors so blank and
//! absent values behave identically.

use serde::{Deserialize, Serialize};

use crate::date::normalize_date;

// ============================================================================
// DIMENSIONS
// ============================================================================

/// Categorical keys a pivot can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Category,
    Product,
    Source,
    Stage,
    Trainer,
    Location,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Category,
        Dimension::Product,
        Dimension::Source,
        Dimension::Stage,
        Dimension::Trainer,
        Dimension::Location,
    ];

    /// Display name used in pivot headers ("Category/Product").
    pub fn display_name(self) -> &'static str {
        match self {
            Dimension::Category => "Category",
            Dimension::Product => "Product",
            Dimension::Source => "Source",
            Dimension::Stage => "Stage",
            Dimension::Trainer => "Trainer",
            Dimension::Location => "Location",
        }
    }

    /// Label substituted when a record carries no value for this dimension.
    pub fn fallback_label(self) -> &'static str {
        match self {
            Dimension::Category | Dimension::Product => "Uncategorized",
            Dimension::Source | Dimension::Stage | Dimension::Trainer | Dimension::Location => {
                "Unknown"
            }
        }
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// A single transactional row after field mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// Raw date string, format unknown until normalized.
    pub date: Option<String>,

    pub category: Option<String>,
    pub product: Option<String>,
    pub source: Option<String>,
    pub stage: Option<String>,
    pub trainer: Option<String>,
    pub location: Option<String>,

    /// Gross monetary amount.
    pub amount: f64,
    pub vat: f64,
    pub discount_amount: f64,
    pub discount_percentage: f64,

    // Identifiers are only used for distinct counting.
    pub member_id: Option<String>,
    pub transaction_id: Option<String>,
    pub item_id: Option<String>,
}

impl Record {
    /// Creates a record with only an amount set.
    pub fn with_amount(amount: f64) -> Self {
        Record {
            amount,
            ..Record::default()
        }
    }

    /// Value of a dimension, or its fallback label when absent or blank.
    pub fn dimension(&self, dimension: Dimension) -> &str {
        let value = match dimension {
            Dimension::Category => &self.category,
            Dimension::Product => &self.product,
            Dimension::Source => &self.source,
            Dimension::Stage => &self.stage,
            Dimension::Trainer => &self.trainer,
            Dimension::Location => &self.location,
        };
        non_blank(value).unwrap_or_else(|| dimension.fallback_label())
    }

    pub fn member_id(&self) -> Option<&str> {
        non_blank(&self.member_id)
    }

    pub fn transaction_id(&self) -> Option<&str> {
        non_blank(&self.transaction_id)
    }

    pub fn item_id(&self) -> Option<&str> {
        non_blank(&self.item_id)
    }

    /// Normalized calendar date, if the raw field can be parsed.
    pub fn parsed_date(&self) -> Option<chrono::NaiveDate> {
        normalize_date(self.date.as_deref())
    }

    /// Sets a dimension value (builder style, used by tests and fixtures).
    pub fn with_dimension(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match dimension {
            Dimension::Category => self.category = value,
            Dimension::Product => self.product = value,
            Dimension::Source => self.source = value,
            Dimension::Stage => self.stage = value,
            Dimension::Trainer => self.trainer = value,
            Dimension::Location => self.location = value,
        }
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
