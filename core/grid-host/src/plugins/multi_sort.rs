//! FILENAME: core/grid-host/src/plugins/multi_sort.rs
//! PURPOSE: Multi-column sort plugin.
//! CONTEXT: Replaces the grid's default single-column sort when
//! registered: it claims every header click on a sortable column, keeps an
//! ordered sort model with shift-click accumulation, and sorts the
//! pipeline's row output non-destructively (the source array order is
//! never touched).

use std::any::Any;

use crate::event::GridEvent;
use crate::plugin::{ColumnState, GridPlugin, HeaderClick, PluginContext};
use grid_model::{Column, RowHandle};
use sort_engine::{
    apply_sorts, sort_direction, sort_index, toggle_multi_sort, MultiSortConfig, SortKey,
    SortKeyDirection, SortModel,
};

pub struct MultiSortPlugin {
    config: MultiSortConfig,
    model: SortModel,

    /// Columns seen on the latest column pass, kept for comparator
    /// override lookup during the row pass.
    columns: Vec<Column>,
}

impl MultiSortPlugin {
    pub fn new(config: MultiSortConfig) -> Self {
        MultiSortPlugin {
            config,
            model: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn config(&self) -> &MultiSortConfig {
        &self.config
    }

    pub fn model(&self) -> &SortModel {
        &self.model
    }

    pub fn set_model(&mut self, model: SortModel) {
        self.model = model;
    }
}

impl GridPlugin for MultiSortPlugin {
    fn name(&self) -> &str {
        "multi-sort"
    }

    fn process_columns(&mut self, columns: Vec<Column>) -> Vec<Column> {
        self.columns = columns.clone();
        columns
    }

    fn process_rows(&mut self, rows: Vec<RowHandle>) -> Vec<RowHandle> {
        if self.model.is_empty() {
            return rows;
        }
        apply_sorts(&rows, &self.model, &self.columns)
    }

    fn on_header_click(&mut self, click: &HeaderClick, ctx: &mut PluginContext) -> bool {
        let sortable = self
            .columns
            .iter()
            .find(|c| c.field == click.field)
            .map(|c| c.sortable);
        if sortable != Some(true) {
            return false;
        }

        self.model = toggle_multi_sort(
            &self.model,
            &click.field,
            click.shift_key,
            self.config.max_sort_columns,
        );
        log::debug!(
            "multi-sort: model now has {} entries after click on '{}'",
            self.model.len(),
            click.field
        );
        ctx.emit(GridEvent::MultiSortChange {
            sort_model: self.model.clone(),
        });
        true
    }

    fn column_state(&self, field: &str) -> Option<ColumnState> {
        let direction = sort_direction(&self.model, field)?;
        Some(ColumnState {
            sort_direction: Some(match direction {
                SortKeyDirection::Asc => 1,
                SortKeyDirection::Desc => -1,
            }),
            sort_index: if self.config.show_sort_index {
                sort_index(&self.model, field)
            } else {
                None
            },
            ..ColumnState::default()
        })
    }

    fn apply_column_state(&mut self, field: &str, state: &ColumnState) {
        if let Some(pos) = self.model.iter().position(|k| k.field == field) {
            self.model.remove(pos);
        }
        let Some(direction) = state.sort_direction else {
            return;
        };
        let key = SortKey {
            field: field.to_string(),
            direction: if direction < 0 {
                SortKeyDirection::Desc
            } else {
                SortKeyDirection::Asc
            },
        };
        let at = state
            .sort_index
            .map(|i| i.saturating_sub(1))
            .unwrap_or(self.model.len())
            .min(self.model.len());
        self.model.insert(at, key);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
