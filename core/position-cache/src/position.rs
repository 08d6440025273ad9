//! FILENAME: core/position-cache/src/position.rs
//! PURPOSE: Per-row offsets and heights with binary-search lookup.
//! CONTEXT: The offset array is a prefix sum over heights. Single-row
//! updates (the scroll-measurement hot path) fix up only the suffix;
//! pipeline changes (sort/filter/pivot) pay one full linear rebuild.
//! Invariant after any mutation: `offset[i+1] == offset[i] + height[i]`.

use serde::{Deserialize, Serialize};

use crate::height::HeightCache;
use grid_model::RowHandle;

/// Optional per-row height override supplied by a plugin (group header
/// rows, detail panels). A `Some` return wins over the measurement cache.
pub type PluginHeightFn<'a> = dyn Fn(&RowHandle, usize) -> Option<f64> + 'a;

/// Offset, height and measurement state for one visible row index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowPosition {
    pub offset: f64,
    pub height: f64,
    /// `false` means `height` is an estimate subject to relaxation.
    pub measured: bool,
}

/// Contiguous position entries for the current row list.
#[derive(Debug, Clone, Default)]
pub struct PositionMap {
    entries: Vec<RowPosition>,
}

impl PositionMap {
    pub fn new() -> Self {
        PositionMap::default()
    }

    /// Initializes `row_count` entries, every one an estimate at
    /// `default_height`.
    pub fn with_estimates(row_count: usize, default_height: f64) -> Self {
        let mut map = PositionMap::new();
        let mut offset = 0.0;
        map.entries.reserve(row_count);
        for _ in 0..row_count {
            map.entries.push(RowPosition {
                offset,
                height: default_height,
                measured: false,
            });
            offset += default_height;
        }
        map
    }

    /// Rebuilds all entries for a new row list in a single linear pass.
    ///
    /// Height priority per row: plugin override, then cached measurement,
    /// then `default_height` as an estimate. Must be called whenever the
    /// row identity list changes (sort, filter, pivot).
    pub fn rebuild(
        &mut self,
        rows: &[RowHandle],
        heights: &HeightCache,
        default_height: f64,
        plugin_height: Option<&PluginHeightFn<'_>>,
    ) {
        self.entries.clear();
        self.entries.reserve(rows.len());
        let mut offset = 0.0;
        for (index, row) in rows.iter().enumerate() {
            let (height, measured) = match plugin_height.and_then(|f| f(row, index)) {
                Some(h) => (h, true),
                None => match heights.get(row) {
                    Some(h) => (h, true),
                    None => (default_height, false),
                },
            };
            self.entries.push(RowPosition {
                offset,
                height,
                measured,
            });
            offset += height;
        }
    }

    /// Records a real measurement for one row and fixes up the offsets of
    /// every row after it. Out-of-bounds indices are ignored: this sits on
    /// the render hot path and favors availability over strictness.
    pub fn update_row_height(&mut self, index: usize, new_height: f64) {
        if index >= self.entries.len() {
            return;
        }
        self.entries[index].height = new_height;
        self.entries[index].measured = true;
        for i in (index + 1)..self.entries.len() {
            self.entries[i].offset = self.entries[i - 1].offset + self.entries[i - 1].height;
        }
    }

    pub fn total_height(&self) -> f64 {
        match self.entries.last() {
            Some(last) => last.offset + last.height,
            None => 0.0,
        }
    }

    /// Binary-searches the row index containing `offset`.
    ///
    /// Returns `None` only when the map is empty. Offsets at or below zero
    /// clamp to the first row, offsets at or past the total height clamp to
    /// the last; an offset exactly on a row boundary resolves to the row
    /// that starts there.
    pub fn index_at_offset(&self, offset: f64) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        if offset <= 0.0 {
            return Some(0);
        }
        if offset >= self.total_height() {
            return Some(self.entries.len() - 1);
        }

        // Last entry whose offset is <= the probe.
        let mut lo = 0;
        let mut hi = self.entries.len();
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            if self.entries[mid].offset <= offset {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Some(lo)
    }

    /// Mean of measured heights, or `default_height` when nothing has been
    /// measured yet.
    pub fn average_measured_height(&self, default_height: f64) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for entry in &self.entries {
            if entry.measured {
                sum += entry.height;
                count += 1;
            }
        }
        if count == 0 {
            default_height
        } else {
            sum / count as f64
        }
    }

    /// Re-estimates every unmeasured row at `average_height` and recomputes
    /// all offsets. Measured flags are untouched. Called periodically as
    /// more rows are measured, to reduce offset jitter while scrolling.
    pub fn relax_estimates(&mut self, average_height: f64) {
        for entry in &mut self.entries {
            if !entry.measured {
                entry.height = average_height;
            }
        }
        let mut offset = 0.0;
        for entry in &mut self.entries {
            entry.offset = offset;
            offset += entry.height;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RowPosition> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[RowPosition] {
        &self.entries
    }
}
