//! FILENAME: core/metrics-engine/src/export.rs
//! PURPOSE: Tab-separated clipboard export of a pivot view.
//! CONTEXT: Spreadsheets split pasted text on literal tabs and newlines, so
//! column order must match the header exactly and cell text must never
//! contain either character. Row selection is driven by `RowKind`; expanded
//! group rows are pure headers and are skipped unless subtotals are asked for.

use records::Record;
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::definition::{PivotDefinition, METRIC_CATALOG};
use crate::engine::calculate_pivot;
use crate::format::{format_value, FormatOptions};
use crate::view::PivotTree;
use crate::view_state::{visible_rows, PivotRow, RowKind, ViewState};

/// Export options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Render values with the metric's display format; otherwise plain
    /// two-decimal numbers.
    pub formatted: bool,
    /// Also export expanded group rows (their pooled subtotals).
    pub include_group_subtotals: bool,
    pub format: FormatOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            formatted: true,
            include_group_subtotals: false,
            format: FormatOptions::default(),
        }
    }
}

impl ExportOptions {
    pub fn raw() -> Self {
        ExportOptions {
            formatted: false,
            ..ExportOptions::default()
        }
    }
}

/// Renders one metric's pivot as tab-separated text: title, header,
/// separator, data rows and the totals row.
pub fn serialize_pivot(tree: &PivotTree, state: &ViewState, options: &ExportOptions) -> String {
    let metric = tree.metric().definition();
    let row_header = tree.definition.row_header();

    let mut header: Vec<String> = Vec::with_capacity(tree.buckets.len() + 1);
    header.push(clean_cell(&row_header));
    header.extend(tree.buckets.iter().map(|b| clean_cell(&b.display)));

    let mut lines = Vec::new();
    lines.push(format!("{} by {}", metric.label, row_header));
    lines.push(header.join("\t"));
    lines.push(
        header
            .iter()
            .map(|h| "-".repeat(h.chars().count().max(3)))
            .collect::<Vec<_>>()
            .join("\t"),
    );

    let rows = visible_rows(tree, state);
    let exported = rows.iter().filter(|r| is_exported(r, options)).count();
    for row in rows.iter().filter(|r| is_exported(r, options)) {
        let mut cells = Vec::with_capacity(row.values.len() + 1);
        cells.push(clean_cell(&row_label(row)));
        cells.extend(row.values.iter().map(|&v| cell_value(v, tree, options)));
        lines.push(cells.join("\t"));
    }

    log::debug!(
        "exported {} by {}: {} of {} rows",
        tree.metric(),
        row_header,
        exported,
        rows.len()
    );
    lines.join("\n")
}

/// Re-aggregates `records` once per catalog metric and joins the blocks,
/// each preceded by a "=== Label ===" banner and separated by a blank line.
pub fn serialize_all_metrics(
    records: &[Record],
    definition: &PivotDefinition,
    buckets: &[Bucket],
    state: &ViewState,
    options: &ExportOptions,
) -> String {
    METRIC_CATALOG
        .iter()
        .map(|metric| {
            let definition = definition.clone().with_metric(metric.id);
            let tree = calculate_pivot(records, &definition, buckets);
            format!(
                "=== {} ===\n{}",
                metric.label,
                serialize_pivot(&tree, state, options)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn is_exported(row: &PivotRow, options: &ExportOptions) -> bool {
    match row.kind {
        RowKind::Leaf | RowKind::Total => true,
        RowKind::Group => !row.expanded || options.include_group_subtotals,
    }
}

/// "Group/Child" for subgroups, the key otherwise.
fn row_label(row: &PivotRow) -> String {
    match &row.parent_key {
        Some(parent) => format!("{}/{}", parent, row.key),
        None => row.key.clone(),
    }
}

fn cell_value(value: f64, tree: &PivotTree, options: &ExportOptions) -> String {
    if options.formatted {
        let kind = tree.metric().definition().format_kind;
        clean_cell(&format_value(value, kind, &options.format))
    } else {
        let value = if value.is_finite() { value } else { 0.0 };
        format!("{:.2}", value)
    }
}

fn clean_cell(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}
