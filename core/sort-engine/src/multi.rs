//! FILENAME: core/sort-engine/src/multi.rs
//! PURPOSE: Multi-column sorting with priority and shift-click semantics.
//! CONTEXT: The sort model is an ordered criteria list; index 0 is the
//! primary key. Unlike the single-column engine, `apply_sorts` never
//! mutates its input and always returns a fresh array, and empty values
//! sort to the end.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::comparator::compare_nulls_last;
use grid_model::{Column, RowHandle};

/// Direction of one multi-sort criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKeyDirection {
    Asc,
    Desc,
}

/// One entry of the sort model; priority is the entry's array index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortKeyDirection,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        SortKey {
            field: field.to_string(),
            direction: SortKeyDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        SortKey {
            field: field.to_string(),
            direction: SortKeyDirection::Desc,
        }
    }
}

pub type SortModel = Vec<SortKey>;

/// Configuration for the multi-sort plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSortConfig {
    /// Silent cap on how many criteria shift-click may accumulate.
    pub max_sort_columns: usize,
    /// Whether headers display the 1-based priority badge.
    pub show_sort_index: bool,
}

impl Default for MultiSortConfig {
    fn default() -> Self {
        MultiSortConfig {
            max_sort_columns: 3,
            show_sort_index: true,
        }
    }
}

/// Stable multi-key sort. Returns a new array; ties on every criterion
/// preserve the relative input order. Each criterion resolves the column's
/// comparator override, falling back to the nulls-last default.
pub fn apply_sorts(rows: &[RowHandle], sorts: &[SortKey], columns: &[Column]) -> Vec<RowHandle> {
    let mut sorted: Vec<RowHandle> = rows.to_vec();
    if sorts.is_empty() {
        return sorted;
    }

    let resolved: Vec<_> = sorts
        .iter()
        .map(|key| {
            let comparator = columns
                .iter()
                .find(|c| c.field == key.field)
                .and_then(|c| c.sort_comparator.clone());
            (key, comparator)
        })
        .collect();

    sorted.sort_by(|a, b| {
        for (key, comparator) in &resolved {
            let va = a.value(&key.field);
            let vb = b.value(&key.field);
            let ord = match comparator {
                Some(c) => c.compare(va, vb),
                None => compare_nulls_last(va, vb),
            };
            let ord = match key.direction {
                SortKeyDirection::Asc => ord,
                SortKeyDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    sorted
}

/// Advances the sort model for a header click.
///
/// Without shift the whole model is replaced by a single entry cycling
/// unset -> asc -> desc -> unset on the clicked field. With shift the
/// clicked field is appended (ascending, only while under `max_columns`),
/// flipped to descending, or removed; other entries keep their order.
pub fn toggle(current: &[SortKey], field: &str, shift_key: bool, max_columns: usize) -> SortModel {
    if !shift_key {
        let active = current
            .iter()
            .find(|k| k.field == field)
            .map(|k| k.direction);
        return match active {
            None => vec![SortKey::asc(field)],
            Some(SortKeyDirection::Asc) => vec![SortKey::desc(field)],
            Some(SortKeyDirection::Desc) => Vec::new(),
        };
    }

    match current.iter().position(|k| k.field == field) {
        None => {
            if current.len() >= max_columns {
                return current.to_vec();
            }
            let mut next = current.to_vec();
            next.push(SortKey::asc(field));
            next
        }
        Some(i) => {
            let mut next = current.to_vec();
            match next[i].direction {
                SortKeyDirection::Asc => next[i].direction = SortKeyDirection::Desc,
                SortKeyDirection::Desc => {
                    next.remove(i);
                }
            }
            next
        }
    }
}

/// 1-based priority of `field` in the model, if present.
pub fn sort_index(model: &[SortKey], field: &str) -> Option<usize> {
    model.iter().position(|k| k.field == field).map(|i| i + 1)
}

pub fn sort_direction(model: &[SortKey], field: &str) -> Option<SortKeyDirection> {
    model
        .iter()
        .find(|k| k.field == field)
        .map(|k| k.direction)
}
