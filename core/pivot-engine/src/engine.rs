//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - The calculation core that reshapes flat rows.
//!
//! This module takes a PivotConfig (configuration) and a flat row list and
//! produces a PivotResult (hierarchical tree plus cross-tab totals).
//!
//! Algorithm:
//! 1. Collect the distinct column keys (cross-tab axis)
//! 2. Recursively partition rows by the row group fields, one level per field
//! 3. Aggregate every (column key, value field) pair per group node
//! 4. Compute grand totals from leaf nodes only (no double counting)
//! 5. Flatten on demand, respecting expand/collapse state

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::{AggregatorRegistry, PivotConfig, ValueField};
use grid_model::{RowHandle, RowValue};

/// Column key used when no column group fields are configured.
pub const VALUE_COLUMN_KEY: &str = "value";

/// Label used for empty group values.
pub const BLANK_LABEL: &str = "(blank)";

// ============================================================================
// RESULT STRUCTURES
// ============================================================================

/// A node of the pivot tree. `row_key` joins the ancestor group values with
/// `|`, which doubles as the synthetic row identity downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub row_key: String,
    pub row_label: String,
    pub depth: usize,

    /// Aggregates keyed by `column_key|value_field`. `None` means the
    /// matching subset was empty, which is distinct from a real zero.
    pub values: FxHashMap<String, Option<f64>>,

    /// Sum of this row's non-empty aggregates; `None` when every cell is.
    pub total: Option<f64>,

    pub is_group: bool,
    pub children: Vec<PivotRow>,

    /// Number of source rows in this group's subset.
    pub row_count: usize,
}

/// Output of a full pivot calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotResult {
    /// Top-level group nodes.
    pub rows: Vec<PivotRow>,

    /// Distinct column keys, `|`-joined and sorted lexically. `["value"]`
    /// when no column group fields are configured.
    pub column_keys: Vec<String>,

    /// Grand total per `column_key|value_field`, summed over leaf nodes.
    pub grand_totals: FxHashMap<String, Option<f64>>,

    /// Scalar grand total across every value key.
    pub grand_total: Option<f64>,
}

/// One emitted row from flattening the tree for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatPivotRow {
    pub row_key: String,
    pub row_label: String,
    pub depth: usize,
    pub values: FxHashMap<String, Option<f64>>,
    pub total: Option<f64>,
    pub is_group: bool,
    pub has_children: bool,
    pub expanded: bool,
    pub row_count: usize,
}

// ============================================================================
// PIVOT CALCULATION
// ============================================================================

/// Builds the full pivot tree for `rows`. Pure: the input is never mutated
/// and malformed data degrades per value (`coerce_number`) instead of
/// failing. Callers validate the config first; an unusable config here
/// simply produces an empty tree.
pub fn build_pivot(
    rows: &[RowHandle],
    config: &PivotConfig,
    registry: &AggregatorRegistry,
) -> PivotResult {
    let column_keys = collect_column_keys(rows, &config.column_group_fields);
    let tree = build_hierarchical_pivot_rows(rows, config, registry, &column_keys, 0, "");
    let (grand_totals, grand_total) =
        calculate_totals(&tree, rows, config, registry, &column_keys);

    PivotResult {
        rows: tree,
        column_keys,
        grand_totals,
        grand_total,
    }
}

/// Display label for one group value; blanks render as `(blank)`.
fn group_value_label(value: &RowValue) -> String {
    if value.is_empty() {
        BLANK_LABEL.to_string()
    } else {
        value.display()
    }
}

/// The `|`-joined composite of a row's column-group values.
fn composite_column_key(row: &RowHandle, column_fields: &[String]) -> String {
    let parts: SmallVec<[String; 4]> = column_fields
        .iter()
        .map(|f| group_value_label(row.value(f)))
        .collect();
    parts.join("|")
}

/// Distinct column keys over the input, sorted lexically.
fn collect_column_keys(rows: &[RowHandle], column_fields: &[String]) -> Vec<String> {
    if column_fields.is_empty() {
        return vec![VALUE_COLUMN_KEY.to_string()];
    }
    let mut seen: FxHashSet<String> = FxHashSet::default();
    for row in rows {
        seen.insert(composite_column_key(row, column_fields));
    }
    let mut keys: Vec<String> = seen.into_iter().collect();
    keys.sort();
    keys
}

/// Recursively partitions `rows` by the row group fields, one nesting level
/// per field. Group keys at each level are ordered lexically by label.
fn build_hierarchical_pivot_rows(
    rows: &[RowHandle],
    config: &PivotConfig,
    registry: &AggregatorRegistry,
    column_keys: &[String],
    depth: usize,
    parent_key: &str,
) -> Vec<PivotRow> {
    let Some(field) = config.row_group_fields.get(depth) else {
        return Vec::new();
    };

    let mut buckets: FxHashMap<String, Vec<RowHandle>> = FxHashMap::default();
    for row in rows {
        let label = group_value_label(row.value(field));
        buckets.entry(label).or_default().push(row.clone());
    }

    let mut labels: Vec<String> = buckets.keys().cloned().collect();
    labels.sort();

    labels
        .into_iter()
        .map(|label| {
            let subset = &buckets[&label];
            let row_key = if parent_key.is_empty() {
                label.clone()
            } else {
                format!("{}|{}", parent_key, label)
            };

            let children = if depth + 1 < config.row_group_fields.len() {
                build_hierarchical_pivot_rows(
                    subset,
                    config,
                    registry,
                    column_keys,
                    depth + 1,
                    &row_key,
                )
            } else {
                Vec::new()
            };

            let values = aggregate_values(
                subset,
                &config.column_group_fields,
                column_keys,
                &config.value_fields,
                registry,
            );
            let total = sum_row_values(&values);

            PivotRow {
                row_key,
                row_label: label,
                depth,
                values,
                total,
                is_group: true,
                children,
                row_count: subset.len(),
            }
        })
        .collect()
}

/// Aggregates every `(column_key, value_field)` pair over `rows`.
///
/// Values are extracted with the lossy numeric coercion (non-numeric
/// becomes `0`, never an error); an empty matching subset yields `None`,
/// preserving the "no data" signal distinct from "summed to zero".
pub fn aggregate_values(
    rows: &[RowHandle],
    column_fields: &[String],
    column_keys: &[String],
    value_fields: &[ValueField],
    registry: &AggregatorRegistry,
) -> FxHashMap<String, Option<f64>> {
    let mut out: FxHashMap<String, Option<f64>> = FxHashMap::default();

    for column_key in column_keys {
        let subset: Vec<&RowHandle> = if column_fields.is_empty() {
            rows.iter().collect()
        } else {
            rows.iter()
                .filter(|r| composite_column_key(r, column_fields) == *column_key)
                .collect()
        };

        for vf in value_fields {
            let numbers: Vec<f64> = subset
                .iter()
                .map(|r| r.value(&vf.field).coerce_number())
                .collect();
            let aggregate = if numbers.is_empty() {
                None
            } else {
                Some(registry.aggregate(&vf.aggregation, &numbers))
            };
            out.insert(value_key(column_key, &vf.field), aggregate);
        }
    }

    out
}

/// Map key for one aggregate cell: the column key joined to the source
/// field name.
pub fn value_key(column_key: &str, field: &str) -> String {
    format!("{}|{}", column_key, field)
}

fn sum_row_values(values: &FxHashMap<String, Option<f64>>) -> Option<f64> {
    let mut total = None;
    for v in values.values().flatten() {
        total = Some(total.unwrap_or(0.0) + v);
    }
    total
}

/// Grand totals per value key, summing **leaf** nodes only so intermediate
/// group aggregates are never double-counted. A degenerate config with no
/// row group fields has no tree; totals then come from one aggregation pass
/// over the raw input.
fn calculate_totals(
    tree: &[PivotRow],
    rows: &[RowHandle],
    config: &PivotConfig,
    registry: &AggregatorRegistry,
    column_keys: &[String],
) -> (FxHashMap<String, Option<f64>>, Option<f64>) {
    let mut totals: FxHashMap<String, Option<f64>> = FxHashMap::default();

    if tree.is_empty() {
        totals = aggregate_values(
            rows,
            &config.column_group_fields,
            column_keys,
            &config.value_fields,
            registry,
        );
    } else {
        accumulate_leaf_totals(tree, &mut totals);
    }

    let mut grand_total = None;
    for v in totals.values().flatten() {
        grand_total = Some(grand_total.unwrap_or(0.0) + v);
    }
    (totals, grand_total)
}

fn accumulate_leaf_totals(nodes: &[PivotRow], totals: &mut FxHashMap<String, Option<f64>>) {
    for node in nodes {
        if node.children.is_empty() {
            for (key, value) in &node.values {
                let slot = totals.entry(key.clone()).or_insert(None);
                if let Some(v) = value {
                    *slot = Some(slot.unwrap_or(0.0) + v);
                }
            }
        } else {
            accumulate_leaf_totals(&node.children, totals);
        }
    }
}

// ============================================================================
// FLATTENING
// ============================================================================

/// Depth-first pre-order walk of the tree. A node's children are emitted
/// only when its key is in `expanded` (or `default_expanded` stands in when
/// no explicit set is given); collapsed nodes contribute themselves alone.
pub fn flatten_pivot_rows(
    rows: &[PivotRow],
    expanded: Option<&FxHashSet<String>>,
    default_expanded: bool,
) -> Vec<FlatPivotRow> {
    let mut out = Vec::new();
    flatten_into(rows, expanded, default_expanded, &mut out);
    out
}

fn flatten_into(
    nodes: &[PivotRow],
    expanded: Option<&FxHashSet<String>>,
    default_expanded: bool,
    out: &mut Vec<FlatPivotRow>,
) {
    for node in nodes {
        let is_expanded = match expanded {
            Some(set) => set.contains(&node.row_key),
            None => default_expanded,
        };

        out.push(FlatPivotRow {
            row_key: node.row_key.clone(),
            row_label: node.row_label.clone(),
            depth: node.depth,
            values: node.values.clone(),
            total: node.total,
            is_group: node.is_group,
            has_children: !node.children.is_empty(),
            expanded: is_expanded,
            row_count: node.row_count,
        });

        if is_expanded && !node.children.is_empty() {
            flatten_into(&node.children, expanded, default_expanded, out);
        }
    }
}

/// Every group node's key, recursively. Used for expand-all.
pub fn collect_group_keys(rows: &[PivotRow]) -> Vec<String> {
    let mut keys = Vec::new();
    collect_keys_into(rows, &mut keys);
    keys
}

fn collect_keys_into(nodes: &[PivotRow], keys: &mut Vec<String>) {
    for node in nodes {
        if node.is_group {
            keys.push(node.row_key.clone());
        }
        collect_keys_into(&node.children, keys);
    }
}
