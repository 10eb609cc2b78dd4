//! FILENAME: core/records/src/mapping.rs
//! PURPOSE: Per-domain field mapping from raw JSON rows to `Record`.
//! CONTEXT: Raw exports name the same concept differently depending on the
//! source sheet (`salesItemId`, `itemId`, `saleItemId`, ...). A mapping lists
//! the candidate source names for every normalized field, in priority order,
//! and is resolved once per row at ingestion. Nothing downstream probes
//! alternative field names.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RecordsError;
use crate::record::Record;

/// Candidate source field names for each normalized record field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldMapping {
    pub date: Vec<String>,
    pub category: Vec<String>,
    pub product: Vec<String>,
    pub source: Vec<String>,
    pub stage: Vec<String>,
    pub trainer: Vec<String>,
    pub location: Vec<String>,
    pub amount: Vec<String>,
    pub vat: Vec<String>,
    pub discount_amount: Vec<String>,
    pub discount_percentage: Vec<String>,
    pub member_id: Vec<String>,
    pub transaction_id: Vec<String>,
    pub item_id: Vec<String>,
}

fn names(candidates: &[&str]) -> Vec<String> {
    candidates.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// PRESETS
// ============================================================================

impl FieldMapping {
    /// Sales payments export.
    pub fn sales() -> Self {
        FieldMapping {
            date: names(&["paymentDate", "date"]),
            category: names(&["cleanedCategory", "category"]),
            product: names(&["cleanedProduct", "paymentItem", "product"]),
            source: names(&["paymentMethod", "source"]),
            trainer: names(&["soldBy", "trainer"]),
            location: names(&["calculatedLocation", "location"]),
            amount: names(&["paymentValue", "amount"]),
            vat: names(&["paymentVAT", "vat"]),
            discount_amount: names(&["discountAmount"]),
            discount_percentage: names(&["discountPercentage"]),
            member_id: names(&["memberId", "customerId"]),
            transaction_id: names(&["paymentTransactionId", "transactionId"]),
            item_id: names(&["salesItemId", "itemId", "saleItemId"]),
            ..FieldMapping::default()
        }
    }

    /// Lead funnel export.
    pub fn leads() -> Self {
        FieldMapping {
            date: names(&["createdAt", "date"]),
            category: names(&["classType", "category"]),
            source: names(&["source"]),
            stage: names(&["stage", "status"]),
            trainer: names(&["associate", "trainer"]),
            location: names(&["center", "location"]),
            amount: names(&["ltv", "amount"]),
            member_id: names(&["memberId", "id"]),
            ..FieldMapping::default()
        }
    }

    /// Membership cancellations export.
    pub fn cancellations() -> Self {
        FieldMapping {
            date: names(&["cancelledAt", "orderAt", "date"]),
            category: names(&["cleanedCategory", "category"]),
            product: names(&["cleanedProduct", "product"]),
            stage: names(&["status"]),
            trainer: names(&["teacherName", "trainer"]),
            location: names(&["location"]),
            amount: names(&["paymentValue", "amount"]),
            member_id: names(&["memberId"]),
            transaction_id: names(&["orderId"]),
            ..FieldMapping::default()
        }
    }

    /// Trainer payroll export.
    pub fn payroll() -> Self {
        FieldMapping {
            date: names(&["date", "monthYear"]),
            category: names(&["classType", "category"]),
            trainer: names(&["teacherName", "trainer"]),
            location: names(&["location"]),
            amount: names(&["totalPaid", "amount"]),
            member_id: names(&["teacherEmail", "teacherId"]),
            transaction_id: names(&["sessionId"]),
            ..FieldMapping::default()
        }
    }

    /// Loads a mapping from JSON and validates it.
    pub fn from_json(s: &str) -> Result<Self, RecordsError> {
        let mapping: FieldMapping = serde_json::from_str(s)?;
        mapping.validate()?;
        Ok(mapping)
    }

    /// A mapping must at least say where the amount comes from.
    pub fn validate(&self) -> Result<(), RecordsError> {
        if self.amount.iter().all(|n| n.trim().is_empty()) {
            return Err(RecordsError::InvalidMapping(
                "no candidate field names for 'amount'".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// INGESTION
// ============================================================================

impl FieldMapping {
    /// Maps one raw JSON object onto a `Record`.
    pub fn map_record(&self, row: &Map<String, Value>) -> Record {
        Record {
            date: text_field(row, &self.date),
            category: text_field(row, &self.category),
            product: text_field(row, &self.product),
            source: text_field(row, &self.source),
            stage: text_field(row, &self.stage),
            trainer: text_field(row, &self.trainer),
            location: text_field(row, &self.location),
            amount: number_field(row, &self.amount),
            vat: number_field(row, &self.vat),
            discount_amount: number_field(row, &self.discount_amount),
            discount_percentage: number_field(row, &self.discount_percentage),
            member_id: text_field(row, &self.member_id),
            transaction_id: text_field(row, &self.transaction_id),
            item_id: text_field(row, &self.item_id),
        }
    }

    /// Maps a slice of JSON values. Elements that are not objects are skipped.
    pub fn map_values(&self, values: &[Value]) -> Vec<Record> {
        let mut records = Vec::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            match value {
                Value::Object(row) => records.push(self.map_record(row)),
                other => log::warn!("skipping non-object row {} ({})", i, kind_of(other)),
            }
        }
        records
    }

    /// Parses a JSON array of row objects into records.
    pub fn ingest_json(&self, s: &str) -> Result<Vec<Record>, RecordsError> {
        match serde_json::from_str::<Value>(s)? {
            Value::Array(values) => {
                let records = self.map_values(&values);
                log::debug!("ingested {} of {} rows", records.len(), values.len());
                Ok(records)
            }
            _ => Err(RecordsError::NotAnArray),
        }
    }
}

/// First candidate holding a non-blank string or a number.
fn text_field(row: &Map<String, Value>, candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|name| match row.get(name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First candidate that parses as a number; 0 when none does.
fn number_field(row: &Map<String, Value>, candidates: &[String]) -> f64 {
    candidates
        .iter()
        .find_map(|name| match row.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_number(s),
            _ => None,
        })
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// First run of digits with optional thousands separators and decimals.
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?|\.\d+").unwrap());

/// Lenient numeric parse: takes the first number in the text, ignoring
/// currency prefixes and suffixes ("Rs. 1,200", "12.5%", "1,200 each").
/// A minus sign before the number or accounting parentheses around it
/// make it negative.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let found = NUMBER.find(s)?;
    let magnitude: f64 = found.as_str().replace(',', "").parse().ok()?;

    let prefix = &s[..found.start()];
    let suffix = &s[found.end()..];
    let negative = prefix.contains('-') || (prefix.contains('(') && suffix.contains(')'));
    Some(if negative { -magnitude } else { magnitude })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
