//! FILENAME: core/grid-host/src/plugins/grouping_columns.rs
//! PURPOSE: Column-grouping plugin - renders the spanning group header row.
//! CONTEXT: Group computation happens during the column pass; the header
//! row is inserted in `after_render`, when rows and columns are frozen and
//! only the view may change.

use std::any::Any;

use crate::column_groups::{compute_column_groups, ColumnGroup, GroupingColumnsConfig};
use crate::plugin::GridPlugin;
use crate::view::{GridView, GroupHeaderCell};
use grid_model::Column;

pub struct GroupingColumnsPlugin {
    config: GroupingColumnsConfig,
    groups: Vec<ColumnGroup>,
}

impl GroupingColumnsPlugin {
    pub fn new(config: GroupingColumnsConfig) -> Self {
        GroupingColumnsPlugin {
            config,
            groups: Vec::new(),
        }
    }

    pub fn config(&self) -> &GroupingColumnsConfig {
        &self.config
    }

    /// Groups computed on the latest column pass.
    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }
}

/// Reorders columns so members of the same group sit together: each
/// group's first column anchors its position and pulls the stragglers in
/// behind it. Ungrouped columns keep their relative order.
fn enforce_contiguous_groups(columns: Vec<Column>) -> Vec<Column> {
    let mut slots: Vec<Option<Column>> = columns.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(slots.len());

    for i in 0..slots.len() {
        let Some(column) = slots[i].take() else {
            continue;
        };
        let group_id = column.group.as_ref().map(|g| g.id.clone());
        out.push(column);

        if let Some(id) = group_id {
            for j in (i + 1)..slots.len() {
                let same_group = slots[j]
                    .as_ref()
                    .and_then(|c| c.group.as_ref())
                    .map_or(false, |g| g.id == id);
                if same_group {
                    out.push(slots[j].take().unwrap());
                }
            }
        }
    }
    out
}

impl GridPlugin for GroupingColumnsPlugin {
    fn name(&self) -> &str {
        "grouping-columns"
    }

    fn process_columns(&mut self, columns: Vec<Column>) -> Vec<Column> {
        let columns = if self.config.lock_group_order {
            enforce_contiguous_groups(columns)
        } else {
            columns
        };
        self.groups = compute_column_groups(&columns);
        columns
    }

    fn after_render(&mut self, view: &mut GridView) {
        view.group_header = self
            .groups
            .iter()
            .map(|group| GroupHeaderCell {
                label: group.header_label().to_string(),
                span: group.span(),
                implicit: group.implicit,
                bordered: self.config.show_group_borders && !group.implicit,
            })
            .collect();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_the_group_header_into_the_view() {
        let mut plugin = GroupingColumnsPlugin::new(GroupingColumnsConfig::default());
        plugin.process_columns(vec![
            Column::new("a").with_group("G1"),
            Column::new("b").with_group("G1"),
            Column::new("c"),
        ]);

        let mut view = GridView::default();
        plugin.after_render(&mut view);
        assert_eq!(view.group_header.len(), 2);
        assert_eq!(view.group_header[0].span, 2);
        assert!(view.group_header[0].bordered);
    }

    #[test]
    fn lock_group_order_pulls_split_groups_together() {
        let config = GroupingColumnsConfig {
            lock_group_order: true,
            ..GroupingColumnsConfig::default()
        };
        let mut plugin = GroupingColumnsPlugin::new(config);
        let columns = plugin.process_columns(vec![
            Column::new("a").with_group("G1"),
            Column::new("b"),
            Column::new("c").with_group("G1"),
        ]);

        let fields: Vec<&str> = columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "c", "b"]);
        assert_eq!(plugin.groups().len(), 2);
        assert_eq!(plugin.groups()[0].span(), 2);
    }

    #[test]
    fn without_lock_split_groups_stay_split() {
        let mut plugin = GroupingColumnsPlugin::new(GroupingColumnsConfig::default());
        plugin.process_columns(vec![
            Column::new("a").with_group("G1"),
            Column::new("b"),
            Column::new("c").with_group("G1"),
        ]);
        assert_eq!(plugin.groups().len(), 3);
    }
}
