//! FILENAME: core/metrics-engine/src/view.rs
//! Pivot View - The computed tree handed to the rendering layer.
//!
//! Nodes are immutable value objects. They have no identity across rebuilds
//! other than their key strings, and every number they carry was computed
//! from the node's own rows.

use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::definition::{MetricId, PivotDefinition};
use crate::growth::{period_over_period, Growth};

// ============================================================================
// NODES
// ============================================================================

/// Structural kind of a node. Exporters and renderers key on this rather
/// than on any presentation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// Top-level node with subgroups.
    Group,
    /// Node without children (a subgroup, or a top-level node in a
    /// single-level pivot).
    Leaf,
    /// Grand total over every input row.
    Total,
}

/// One node of the pivot tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    /// Dimension value of this node (unique among its siblings).
    pub key: String,

    /// Key of the enclosing group for subgroups.
    pub parent_key: Option<String>,

    pub kind: NodeKind,

    /// 0 for top-level nodes and the total, 1 for subgroups.
    pub depth: u8,

    pub children: Vec<GroupNode>,

    /// Indices into the input record slice, in input order.
    pub rows: Vec<usize>,

    /// One value per bucket, aligned with `PivotTree::buckets`.
    pub bucket_values: Vec<f64>,

    /// Metric over all of this node's rows, dated or not.
    pub total_value: f64,
}

impl GroupNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child(&self, key: &str) -> Option<&GroupNode> {
        self.children.iter().find(|c| c.key == key)
    }

    /// Growth of each bucket against the bucket before it.
    pub fn growth_series(&self) -> Vec<Growth> {
        period_over_period(&self.bucket_values)
    }
}

// ============================================================================
// TREE
// ============================================================================

/// The complete result of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTree {
    pub definition: PivotDefinition,
    pub buckets: Vec<Bucket>,
    /// Top-level nodes, sorted by key.
    pub groups: Vec<GroupNode>,
    pub totals: GroupNode,
    /// Bucket index of every input record (`None` when undated or outside
    /// the window).
    pub record_buckets: Vec<Option<usize>>,
    /// Records whose date could not be normalized.
    pub undated_count: usize,
}

impl PivotTree {
    pub fn metric(&self) -> MetricId {
        self.definition.metric
    }

    pub fn bucket_index(&self, key: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b.key == key)
    }

    /// Value of a node in the bucket with the given key (0 when unknown).
    pub fn bucket_value(&self, node: &GroupNode, key: &str) -> f64 {
        self.bucket_index(key)
            .and_then(|i| node.bucket_values.get(i).copied())
            .unwrap_or(0.0)
    }

    pub fn group(&self, key: &str) -> Option<&GroupNode> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Finds a node by group and optional subgroup key; no group means the
    /// grand total.
    pub fn node(&self, group: Option<&str>, subgroup: Option<&str>) -> Option<&GroupNode> {
        match (group, subgroup) {
            (None, _) => Some(&self.totals),
            (Some(g), None) => self.group(g),
            (Some(g), Some(s)) => self.group(g)?.child(s),
        }
    }

    /// Rows of a node falling in one bucket.
    pub fn bucket_rows(&self, node: &GroupNode, bucket_index: usize) -> Vec<usize> {
        node.rows
            .iter()
            .copied()
            .filter(|&i| self.record_buckets.get(i).copied().flatten() == Some(bucket_index))
            .collect()
    }

    /// Keys of every top-level node, for "collapse all".
    pub fn group_keys(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.key.clone()).collect()
    }
}

// ============================================================================
// DRILL-DOWN
// ============================================================================

/// A click on a node or a node/bucket cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDownRequest {
    /// Top-level key; `None` selects the totals row.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub subgroup: Option<String>,
    /// Bucket key; `None` selects the node's all-time rows.
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_records() -> usize {
    1000
}

impl DrillDownRequest {
    pub fn node(group: impl Into<String>, subgroup: Option<&str>) -> Self {
        DrillDownRequest {
            group: Some(group.into()),
            subgroup: subgroup.map(str::to_string),
            bucket: None,
            max_records: default_max_records(),
        }
    }

    pub fn in_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }
}

/// The leaf rows behind one pivot value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDownResult {
    pub group: Option<String>,
    pub subgroup: Option<String>,
    pub bucket: Option<Bucket>,
    pub metric: MetricId,
    /// Metric recomputed over exactly the returned selection.
    pub value: f64,
    /// Record indices, at most `max_records` of them.
    pub source_rows: Vec<usize>,
    pub total_count: usize,
    pub max_records: usize,
    pub is_truncated: bool,
    pub description: String,
}
