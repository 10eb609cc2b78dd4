//! FILENAME: core/metrics-engine/src/view_state.rs
//! PURPOSE: Sort and collapse state for a pivot view, and the display
//! ordering step that applies it.
//! CONTEXT: The state is owned by the view, not by the tree. Aggregation
//! never reads it; `visible_rows` combines a finished tree with the state.
//! Sorting and collapsing are independent: neither operation touches the
//! other's fields.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::view::{GroupNode, NodeKind, PivotTree};

// ============================================================================
// STATE
// ============================================================================

/// Column the top-level groups are ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Total,
    /// A bucket key ("YYYY-MM").
    Bucket(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Externally owned view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewState {
    pub sort_key: SortKey,
    pub direction: SortDirection,
    /// Keys of collapsed top-level groups.
    pub collapsed: FxHashSet<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            sort_key: SortKey::Total,
            direction: SortDirection::Descending,
            collapsed: FxHashSet::default(),
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selecting the current key flips direction; a new key sorts descending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction = self.direction.flipped();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Descending;
        }
    }

    pub fn is_collapsed(&self, key: &str) -> bool {
        self.collapsed.contains(key)
    }

    pub fn toggle_collapsed(&mut self, key: &str) {
        if !self.collapsed.remove(key) {
            self.collapsed.insert(key.to_string());
        }
    }

    pub fn collapse_all<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collapsed = keys.into_iter().map(Into::into).collect();
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }
}

// ============================================================================
// DISPLAY ROWS
// ============================================================================

/// Structural kind of a display row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowKind {
    /// A top-level node that has subgroups.
    Group,
    /// A subgroup, or a top-level node of a single-level pivot.
    Leaf,
    /// The grand-total row; always last.
    Total,
}

impl From<NodeKind> for RowKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Group => RowKind::Group,
            NodeKind::Leaf => RowKind::Leaf,
            NodeKind::Total => RowKind::Total,
        }
    }
}

/// A flattened, ordered row ready for rendering or export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotRow {
    pub kind: RowKind,
    pub key: String,
    pub parent_key: Option<String>,
    pub depth: u8,
    pub has_children: bool,
    /// Children of this row are visible.
    pub expanded: bool,
    pub values: Vec<f64>,
    pub total: f64,
}

impl PivotRow {
    fn from_node(node: &GroupNode, expanded: bool) -> Self {
        PivotRow {
            kind: node.kind.into(),
            key: node.key.clone(),
            parent_key: node.parent_key.clone(),
            depth: node.depth,
            has_children: node.has_children(),
            expanded,
            values: node.bucket_values.clone(),
            total: node.total_value,
        }
    }
}

/// Value a node is sorted by under `key`.
fn sort_value(tree: &PivotTree, node: &GroupNode, key: &SortKey) -> f64 {
    match key {
        SortKey::Total => node.total_value,
        SortKey::Bucket(bucket) => tree.bucket_value(node, bucket),
    }
}

/// Top-level groups in display order. Ties fall back to key order.
pub fn ordered_groups<'t>(tree: &'t PivotTree, state: &ViewState) -> Vec<&'t GroupNode> {
    let mut groups: Vec<&GroupNode> = tree.groups.iter().collect();
    groups.sort_by(|a, b| {
        let va = sort_value(tree, a, &state.sort_key);
        let vb = sort_value(tree, b, &state.sort_key);
        let by_value = va.partial_cmp(&vb).unwrap_or(Ordering::Equal);
        let by_value = match state.direction {
            SortDirection::Ascending => by_value,
            SortDirection::Descending => by_value.reverse(),
        };
        by_value.then_with(|| a.key.cmp(&b.key))
    });
    groups
}

/// Flattens the tree into display rows: each group, its subgroups unless
/// collapsed, and the totals row last.
pub fn visible_rows(tree: &PivotTree, state: &ViewState) -> Vec<PivotRow> {
    let mut rows = Vec::with_capacity(tree.groups.len() + 1);

    for group in ordered_groups(tree, state) {
        let expanded = group.has_children() && !state.is_collapsed(&group.key);
        rows.push(PivotRow::from_node(group, expanded));
        if expanded {
            rows.extend(group.children.iter().map(|c| PivotRow::from_node(c, false)));
        }
    }

    rows.push(PivotRow::from_node(&tree.totals, false));
    rows
}
