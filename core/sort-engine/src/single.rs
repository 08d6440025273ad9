//! FILENAME: core/sort-engine/src/single.rs
//! PURPOSE: The single-column sort toggle state machine.
//! CONTEXT: Cycles Unsorted -> Ascending -> Descending -> Unsorted per
//! column; switching columns resets to Ascending on the new column. Sorting
//! physically reorders the backing row array; clearing restores a snapshot
//! taken when sorting first began. Epoch bumps and event dispatch are the
//! host's job, driven by the returned `SortEffect`.

use serde::{Deserialize, Serialize};

use crate::comparator::{compare_nulls_first, SortDirection};
use grid_model::{Column, RowHandle};

/// Active sort, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

/// What a toggle/apply did, for the host to relay as a `sort-change` event
/// (direction `0` means the sort was cleared).
#[derive(Debug, Clone, PartialEq)]
pub struct SortEffect {
    pub field: String,
    pub direction: i8,
}

/// Controller for the single-column sort lifecycle.
#[derive(Debug, Default)]
pub struct SingleSort {
    state: Option<SortState>,
    original_order: Option<Vec<RowHandle>>,
}

impl SingleSort {
    pub fn new() -> Self {
        SingleSort::default()
    }

    pub fn state(&self) -> Option<&SortState> {
        self.state.as_ref()
    }

    /// Advances the state machine for a click on `column`.
    pub fn toggle(&mut self, rows: &mut Vec<RowHandle>, column: &Column) -> SortEffect {
        let same_field = self
            .state
            .as_ref()
            .map(|s| s.field == column.field)
            .unwrap_or(false);

        if !same_field {
            // First toggle on this column. Snapshot only when no sort is
            // active anywhere; switching columns keeps the existing
            // snapshot (the rows are already reordered by the old sort).
            if self.original_order.is_none() {
                self.original_order = Some(rows.clone());
            }
            return self.apply(rows, column, SortDirection::Ascending);
        }

        match self.state.as_ref().map(|s| s.direction) {
            Some(SortDirection::Ascending) => self.apply(rows, column, SortDirection::Descending),
            _ => self.clear(rows, &column.field),
        }
    }

    /// Sets the sort state and sorts `rows` in place using the column's
    /// comparator override or the nulls-first default, multiplied by
    /// `direction`.
    pub fn apply(
        &mut self,
        rows: &mut [RowHandle],
        column: &Column,
        direction: SortDirection,
    ) -> SortEffect {
        self.state = Some(SortState {
            field: column.field.clone(),
            direction,
        });

        let comparator = column.sort_comparator.clone();
        let field = column.field.clone();
        rows.sort_by(|a, b| {
            let va = a.value(&field);
            let vb = b.value(&field);
            let ord = match &comparator {
                Some(c) => c.compare(va, vb),
                None => compare_nulls_first(va, vb),
            };
            direction.apply(ord)
        });

        SortEffect {
            field,
            direction: direction.signum(),
        }
    }

    /// Clears the sort and restores the original row order.
    pub fn clear(&mut self, rows: &mut Vec<RowHandle>, field: &str) -> SortEffect {
        self.state = None;
        if let Some(original) = self.original_order.take() {
            *rows = original;
        }
        SortEffect {
            field: field.to_string(),
            direction: 0,
        }
    }
}
