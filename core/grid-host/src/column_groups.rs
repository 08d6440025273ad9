//! FILENAME: core/grid-host/src/column_groups.rs
//! PURPOSE: Computes contiguous column groups for the secondary header row.
//! CONTEXT: Explicit groups come from column `group` assignments; runs of
//! ungrouped columns between them become implicit groups so the header row
//! always spans the full width. Independent of the row pipeline.

use serde::{Deserialize, Serialize};

use grid_model::Column;

/// Configuration for the grouping-columns plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingColumnsConfig {
    /// Draw separators between adjacent groups.
    pub show_group_borders: bool,

    /// Keep same-group columns contiguous even if the incoming column
    /// order splits them.
    pub lock_group_order: bool,
}

impl Default for GroupingColumnsConfig {
    fn default() -> Self {
        GroupingColumnsConfig {
            show_group_borders: true,
            lock_group_order: false,
        }
    }
}

/// One contiguous run of columns under a shared header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub id: String,
    pub label: Option<String>,
    pub columns: Vec<Column>,
    /// Index of the group's first column in the column array.
    pub first_index: usize,
    /// Synthetic group covering a run of ungrouped columns.
    pub implicit: bool,
}

impl ColumnGroup {
    pub fn span(&self) -> usize {
        self.columns.len()
    }

    /// Header text: explicit groups show their label (falling back to the
    /// id); implicit groups render blank.
    pub fn header_label(&self) -> &str {
        if self.implicit {
            ""
        } else {
            self.label.as_deref().unwrap_or(&self.id)
        }
    }
}

/// True iff any column declares a group assignment.
pub fn has_column_groups(columns: &[Column]) -> bool {
    columns.iter().any(|c| c.group.is_some())
}

/// Computes the group list in a single linear pass.
///
/// Consecutive ungrouped columns accumulate into a pending run; hitting a
/// grouped column flushes the run as an implicit group (merged into an
/// adjacent preceding implicit group rather than fragmenting), then starts
/// or continues an explicit group keyed by the group id. The trailing run
/// flushes at the end.
///
/// Returns an empty list when there is nothing worth rendering: no groups
/// at all, or a single implicit group spanning every column. A non-empty
/// result always partitions the column array into contiguous runs.
pub fn compute_column_groups(columns: &[Column]) -> Vec<ColumnGroup> {
    let mut groups: Vec<ColumnGroup> = Vec::new();
    let mut run: Vec<(usize, Column)> = Vec::new();

    for (index, column) in columns.iter().enumerate() {
        match &column.group {
            None => run.push((index, column.clone())),
            Some(spec) => {
                flush_run(&mut groups, &mut run);

                let continues = groups.last().map_or(false, |last| {
                    !last.implicit
                        && last.id == spec.id
                        && last.first_index + last.columns.len() == index
                });
                if continues {
                    let last = groups.last_mut().unwrap();
                    if last.label.is_none() {
                        last.label = spec.label.clone();
                    }
                    last.columns.push(column.clone());
                } else {
                    groups.push(ColumnGroup {
                        id: spec.id.clone(),
                        label: spec.label.clone(),
                        columns: vec![column.clone()],
                        first_index: index,
                        implicit: false,
                    });
                }
            }
        }
    }
    flush_run(&mut groups, &mut run);

    if groups.len() == 1 && groups[0].implicit {
        return Vec::new();
    }
    groups
}

fn flush_run(groups: &mut Vec<ColumnGroup>, run: &mut Vec<(usize, Column)>) {
    if run.is_empty() {
        return;
    }
    let first_index = run[0].0;

    let merges = groups.last().map_or(false, |last| {
        last.implicit && last.first_index + last.columns.len() == first_index
    });
    if merges {
        let last = groups.last_mut().unwrap();
        last.columns.extend(run.drain(..).map(|(_, c)| c));
    } else {
        groups.push(ColumnGroup {
            id: format!("implicit-{}", first_index),
            label: None,
            columns: run.drain(..).map(|(_, c)| c).collect(),
            first_index,
            implicit: true,
        });
    }
}
