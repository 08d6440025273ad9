//! FILENAME: core/sort-engine/src/comparator.rs
//! PURPOSE: Type-aware value ordering shared by both sort engines.
//! CONTEXT: One typed dispatch, two entry points that differ only in where
//! empty values land. The single-column engine places them before
//! everything (so the direction multiplier moves them); the multi-sort
//! engine pushes them to the end regardless of key direction.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use grid_model::RowValue;

/// Direction of a single-column sort. `signum` gives the `1`/`-1` form
/// used in event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn signum(&self) -> i8 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    /// Applies the direction multiplier to a comparator result.
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// Ordering for two non-empty values: numbers numerically, dates by
/// timestamp, booleans with `true` first, anything else by display string.
fn compare_typed(a: &RowValue, b: &RowValue) -> Ordering {
    match (a, b) {
        (RowValue::Number(na), RowValue::Number(nb)) => {
            na.partial_cmp(nb).unwrap_or(Ordering::Equal)
        }
        (RowValue::Date(da), RowValue::Date(db)) => da.cmp(db),
        (RowValue::Boolean(ba), RowValue::Boolean(bb)) => bb.cmp(ba),
        _ => a.display().cmp(&b.display()),
    }
}

/// Single-sort default: an empty value compares less than everything, so
/// the direction multiplier is what decides where blanks end up.
pub fn compare_nulls_first(a: &RowValue, b: &RowValue) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare_typed(a, b),
    }
}

/// Multi-sort default: empty values sort to the end ahead of the direction
/// multiplier; two empties tie.
pub fn compare_nulls_last(a: &RowValue, b: &RowValue) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_typed(a, b),
    }
}
