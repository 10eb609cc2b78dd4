//! FILENAME: tests/common/mod.rs
//! Shared fixtures for metrics-engine integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use metrics_engine::{calculate_pivot, rolling_months, Bucket, MetricId, PivotDefinition, PivotTree};
use records::{Dimension, Record};

pub type SaleRow = (&'static str, &'static str, &'static str, f64, &'static str, &'static str);

/// Sales rows spanning Jan-Mar 2024 plus a few year-ago and undated rows.
pub struct SalesFixture;

impl SalesFixture {
    /// (category, product, date, amount, transaction, member)
    pub fn data() -> Vec<SaleRow> {
        vec![
            ("Memberships", "Annual", "2024-01-05", 1200.0, "T01", "M1"),
            ("Memberships", "Annual", "15/02/2024", 1200.0, "T02", "M2"),
            ("Memberships", "Monthly", "2024-02-03", 150.0, "T03", "M3"),
            ("Memberships", "Monthly", "2024-03-03", 150.0, "T04", "M3"),
            ("Memberships", "Monthly", "03/03/2024", 150.0, "T05", "M4"),
            ("Class Packs", "10 Pack", "2024-01-20", 250.0, "T06", "M1"),
            ("Class Packs", "10 Pack", "2024-03-21", 250.0, "T07", "M5"),
            ("Class Packs", "Drop In", "2024-03-22", 30.0, "T07", "M5"),
            ("Class Packs", "Drop In", "2023-03-10", 30.0, "T08", "M6"),
            ("Retail", "Water", "2024-03-01", 2.0, "T09", "M2"),
            ("Retail", "Water", "2023-02-11", 2.0, "T10", "M7"),
            ("Retail", "Towel", "not-a-date", 10.0, "T11", "M8"),
        ]
    }

    pub fn records() -> Vec<Record> {
        Self::data()
            .into_iter()
            .map(|(category, product, date, amount, txn, member)| Record {
                date: Some(date.to_string()),
                category: Some(category.to_string()),
                product: Some(product.to_string()),
                amount,
                vat: amount / 10.0,
                discount_amount: if amount >= 1000.0 { 100.0 } else { 0.0 },
                discount_percentage: if amount >= 1000.0 { 8.0 } else { 0.0 },
                transaction_id: Some(txn.to_string()),
                member_id: Some(member.to_string()),
                ..Record::default()
            })
            .collect()
    }
}

/// "Now" for every fixture window.
pub fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
}

/// Jan, Feb and Mar 2024.
pub fn quarter_buckets() -> Vec<Bucket> {
    rolling_months(3, anchor())
}

pub fn category_product() -> PivotDefinition {
    PivotDefinition::new(Dimension::Category, Some(Dimension::Product))
}

/// Fixture records pivoted by category/product over the quarter.
pub fn build_tree(metric: MetricId) -> (Vec<Record>, PivotTree) {
    let records = SalesFixture::records();
    let def = category_product().with_metric(metric);
    let tree = calculate_pivot(&records, &def, &quarter_buckets());
    (records, tree)
}

/// Assert two floats are equal within rounding noise.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
