//! FILENAME: core/grid-host/src/view.rs
//! PURPOSE: The renderable output of the grid for one paint.
//! CONTEXT: A headless view model: header cells, an optional spanning
//! group-header row, and a pool of row slots covering the visible range.
//! Slots carry the epoch their content was built in; a slot whose epoch
//! does not match the current one must be fully rebuilt, never diffed.

use serde::{Deserialize, Serialize};

use crate::column_groups::{compute_column_groups, GroupingColumnsConfig};
use grid_model::Column;

/// Epoch value that never matches a live epoch; stamped onto pooled slots
/// when the pipeline output changes.
pub const STALE_EPOCH: u64 = 0;

/// One column header cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderCell {
    pub field: String,
    pub label: String,
    pub sortable: bool,
    /// `1` ascending, `-1` descending, absent when unsorted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<i8>,
    /// 1-based multi-sort priority badge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_css: Option<String>,
}

/// One cell of the secondary group-header row, spanning several columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupHeaderCell {
    pub label: String,
    pub span: usize,
    pub implicit: bool,
    pub bordered: bool,
}

/// A pooled row slot: one reusable display row positioned in the scroll
/// area. `epoch` records when `cells` was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSlot {
    pub row_index: usize,
    pub offset: f64,
    pub height: f64,
    pub cells: Vec<String>,
    pub epoch: u64,
}

/// The grid's renderable state for the current epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridView {
    pub epoch: u64,
    pub header: Vec<HeaderCell>,
    /// Empty unless a grouping-columns plugin inserted one.
    pub group_header: Vec<GroupHeaderCell>,
    pub slots: Vec<RowSlot>,
    /// Row index of the first slot.
    pub first_index: usize,
    pub total_height: f64,
}

impl GridView {
    /// Marks every pooled slot stale so the next paint rebuilds content
    /// even where the visible range did not move.
    pub fn invalidate_slots(&mut self) {
        for slot in &mut self.slots {
            slot.epoch = STALE_EPOCH;
        }
    }
}

/// Builds the spanning group-header row for a column list; empty when the
/// grouping computation reports nothing worth rendering.
pub fn build_group_header_row(
    columns: &[Column],
    config: &GroupingColumnsConfig,
) -> Vec<GroupHeaderCell> {
    compute_column_groups(columns)
        .iter()
        .map(|group| GroupHeaderCell {
            label: group.header_label().to_string(),
            span: group.span(),
            implicit: group.implicit,
            bordered: config.show_group_borders && !group.implicit,
        })
        .collect()
}
