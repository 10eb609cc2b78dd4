//! FILENAME: core/metrics-engine/src/engine.rs
//! Pivot Engine - Turns flat records into a bucketed two-level tree.
//!
//! Algorithm:
//! 1. One pass over the records: normalize each date once, resolve its
//!    bucket index, and file the record index into an arena keyed by
//!    primary then secondary dimension value
//! 2. Freeze the arena into immutable nodes sorted by key
//! 3. For every node (subgroup, group and grand total) partition the node's
//!    own rows by bucket once and run the metric calculator per bucket
//!
//! Parent values are never sums of child values. A group's March value is
//! the metric over the union of its subgroups' March rows, which is the only
//! correct answer for ratio metrics such as ATV.

use chrono::NaiveDate;
use records::{month_key, Record};
use rustc_hash::FxHashMap;

use crate::bucket::Bucket;
use crate::calculator::MetricAccumulator;
use crate::definition::PivotDefinition;
use crate::view::{DrillDownRequest, DrillDownResult, GroupNode, NodeKind, PivotTree};

/// Key and label of the grand-total node.
pub const TOTAL_KEY: &str = "Total";

// ============================================================================
// GROUPING ARENA
// ============================================================================

/// Mutable accumulation state for one top-level group during the pass.
#[derive(Debug)]
struct GroupEntry {
    key: String,
    rows: Vec<usize>,
    child_index: FxHashMap<String, usize>,
    children: Vec<SubgroupEntry>,
}

#[derive(Debug)]
struct SubgroupEntry {
    key: String,
    rows: Vec<usize>,
}

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// The calculation engine for one aggregation run.
pub struct PivotCalculator<'a> {
    records: &'a [Record],
    definition: &'a PivotDefinition,
    buckets: &'a [Bucket],

    /// Normalized date of every record.
    dates: Vec<Option<NaiveDate>>,

    /// Bucket index of every record.
    record_buckets: Vec<Option<usize>>,
}

impl<'a> PivotCalculator<'a> {
    pub fn new(
        records: &'a [Record],
        definition: &'a PivotDefinition,
        buckets: &'a [Bucket],
    ) -> Self {
        PivotCalculator {
            records,
            definition,
            buckets,
            dates: Vec::new(),
            record_buckets: Vec::new(),
        }
    }

    /// Executes the full calculation and returns the tree.
    pub fn calculate(mut self) -> PivotTree {
        // Step 1: normalize dates and resolve buckets
        self.index_dates();

        // Step 2: group record indices
        let arena = self.group_records();

        // Step 3: freeze into nodes, computing values from each node's rows
        let groups = self.freeze(arena);
        let all_rows: Vec<usize> = (0..self.records.len()).collect();
        let totals = self.build_node(
            TOTAL_KEY.to_string(),
            None,
            NodeKind::Total,
            0,
            all_rows,
            Vec::new(),
        );

        let undated_count = self.dates.iter().filter(|d| d.is_none()).count();
        log::debug!(
            "pivot {} by {}: {} records ({} undated), {} groups, {} buckets",
            self.definition.metric,
            self.definition.row_header(),
            self.records.len(),
            undated_count,
            groups.len(),
            self.buckets.len()
        );

        PivotTree {
            definition: self.definition.clone(),
            buckets: self.buckets.to_vec(),
            groups,
            totals,
            record_buckets: self.record_buckets,
            undated_count,
        }
    }

    fn index_dates(&mut self) {
        let bucket_lookup: FxHashMap<&str, usize> = self
            .buckets
            .iter()
            .enumerate()
            .rev() // first occurrence wins on duplicate keys
            .map(|(i, b)| (b.key.as_str(), i))
            .collect();

        self.dates = Vec::with_capacity(self.records.len());
        self.record_buckets = Vec::with_capacity(self.records.len());

        for record in self.records {
            let date = record.parsed_date();
            let bucket = date.and_then(|d| bucket_lookup.get(month_key(d).as_str()).copied());
            self.dates.push(date);
            self.record_buckets.push(bucket);
        }
    }

    fn group_records(&self) -> Vec<GroupEntry> {
        let mut group_index: FxHashMap<String, usize> = FxHashMap::default();
        let mut groups: Vec<GroupEntry> = Vec::new();

        for (i, record) in self.records.iter().enumerate() {
            let primary = record.dimension(self.definition.primary);
            let gi = match group_index.get(primary) {
                Some(&gi) => gi,
                None => {
                    groups.push(GroupEntry {
                        key: primary.to_string(),
                        rows: Vec::new(),
                        child_index: FxHashMap::default(),
                        children: Vec::new(),
                    });
                    group_index.insert(primary.to_string(), groups.len() - 1);
                    groups.len() - 1
                }
            };
            let group = &mut groups[gi];
            group.rows.push(i);

            if let Some(secondary) = self.definition.secondary {
                let sub = record.dimension(secondary);
                let ci = match group.child_index.get(sub) {
                    Some(&ci) => ci,
                    None => {
                        group.children.push(SubgroupEntry {
                            key: sub.to_string(),
                            rows: Vec::new(),
                        });
                        group.child_index.insert(sub.to_string(), group.children.len() - 1);
                        group.children.len() - 1
                    }
                };
                group.children[ci].rows.push(i);
            }
        }

        groups
    }

    fn freeze(&self, mut arena: Vec<GroupEntry>) -> Vec<GroupNode> {
        arena.sort_by(|a, b| a.key.cmp(&b.key));

        arena
            .into_iter()
            .map(|mut entry| {
                entry.children.sort_by(|a, b| a.key.cmp(&b.key));
                let children: Vec<GroupNode> = entry
                    .children
                    .into_iter()
                    .map(|sub| {
                        let parent = Some(entry.key.clone());
                        self.build_node(sub.key, parent, NodeKind::Leaf, 1, sub.rows, Vec::new())
                    })
                    .collect();
                let kind = if self.definition.secondary.is_some() {
                    NodeKind::Group
                } else {
                    NodeKind::Leaf
                };
                self.build_node(entry.key, None, kind, 0, entry.rows, children)
            })
            .collect()
    }

    /// Builds one node, computing its values from `rows` alone.
    fn build_node(
        &self,
        key: String,
        parent_key: Option<String>,
        kind: NodeKind,
        depth: u8,
        rows: Vec<usize>,
        children: Vec<GroupNode>,
    ) -> GroupNode {
        // Partition once instead of re-filtering the rows per bucket.
        let mut per_bucket: Vec<Vec<usize>> = vec![Vec::new(); self.buckets.len()];
        for &i in &rows {
            if let Some(b) = self.record_buckets[i] {
                per_bucket[b].push(i);
            }
        }

        let bucket_values: Vec<f64> = per_bucket.iter().map(|r| self.metric_over(r)).collect();
        let total_value = self.metric_over(&rows);

        log::trace!("node {:?} {} rows={} total={}", kind, key, rows.len(), total_value);

        GroupNode {
            key,
            parent_key,
            kind,
            depth,
            children,
            rows,
            bucket_values,
            total_value,
        }
    }

    fn metric_over(&self, rows: &[usize]) -> f64 {
        metric_over_rows(self.records, &self.dates, rows, self.definition)
    }
}

fn metric_over_rows(
    records: &[Record],
    dates: &[Option<NaiveDate>],
    rows: &[usize],
    definition: &PivotDefinition,
) -> f64 {
    let mut acc = MetricAccumulator::new(definition.revenue_basis);
    for &i in rows {
        acc.add_dated(&records[i], dates[i]);
    }
    acc.compute(definition.metric)
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Aggregates records into a pivot tree.
/// This is the main entry point for the calculation engine.
pub fn calculate_pivot(
    records: &[Record],
    definition: &PivotDefinition,
    buckets: &[Bucket],
) -> PivotTree {
    PivotCalculator::new(records, definition, buckets).calculate()
}

/// Returns the source records behind a node or node/bucket cell.
///
/// `records` must be the slice the tree was built from. Unknown keys give an
/// empty result rather than an error.
pub fn drill_down(
    tree: &PivotTree,
    records: &[Record],
    request: &DrillDownRequest,
) -> DrillDownResult {
    let metric = tree.metric();
    let node = tree.node(request.group.as_deref(), request.subgroup.as_deref());

    let (bucket, bucket_known) = match request.bucket.as_deref() {
        Some(key) => match tree.bucket_index(key) {
            Some(i) => (Some((i, tree.buckets[i].clone())), true),
            None => (None, false),
        },
        None => (None, true),
    };

    let rows: Vec<usize> = match (node, &bucket) {
        (Some(node), Some((i, _))) => tree.bucket_rows(node, *i),
        (Some(node), None) if bucket_known => node.rows.clone(),
        _ => Vec::new(),
    };

    // Only the selected rows are touched; their dates are parsed on the way in.
    let value = if rows.iter().all(|&i| i < records.len()) {
        let mut acc = MetricAccumulator::new(tree.definition.revenue_basis);
        for &i in &rows {
            acc.add(&records[i]);
        }
        acc.compute(metric)
    } else {
        log::warn!("drill-down records do not match the tree; value set to 0");
        0.0
    };

    let bucket = bucket.map(|(_, b)| b);
    let description = describe_selection(tree, request, bucket.as_ref(), rows.len());
    let total_count = rows.len();
    let max_records = request.max_records;
    let mut source_rows = rows;
    source_rows.truncate(max_records);

    DrillDownResult {
        group: request.group.clone(),
        subgroup: request.subgroup.clone(),
        bucket,
        metric,
        value,
        source_rows,
        total_count,
        max_records,
        is_truncated: total_count > max_records,
        description,
    }
}

fn describe_selection(
    tree: &PivotTree,
    request: &DrillDownRequest,
    bucket: Option<&Bucket>,
    count: usize,
) -> String {
    let label = tree.metric().definition().label;
    let target = match (request.group.as_deref(), request.subgroup.as_deref()) {
        (None, _) => TOTAL_KEY.to_string(),
        (Some(g), None) => g.to_string(),
        (Some(g), Some(s)) => format!("{} > {}", g, s),
    };
    let period = match (bucket, request.bucket.as_deref()) {
        (Some(b), _) => format!("in {}", b.display),
        (None, Some(key)) => format!("in {}", key),
        (None, None) => "(all time)".to_string(),
    };
    let noun = if count == 1 { "record" } else { "records" };
    format!("{} for {} {}: {} {}", label, target, period, count, noun)
}
