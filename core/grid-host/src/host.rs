//! FILENAME: core/grid-host/src/host.rs
//! PURPOSE: The grid host: owns the data, the plugin pipeline, and the
//! virtualization state.
//! CONTEXT: Everything here is synchronous. A refresh folds the source
//! rows and columns through every plugin in registration order, rebuilds
//! the position cache for the new row list, and bumps the render epoch;
//! events announcing a change are dispatched only after the epoch bump so
//! listeners always observe a consistent epoch.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::event::{EventEmitter, GridEvent};
use crate::plugin::{ColumnState, GridPlugin, HeaderClick, PluginContext, PluginSet};
use crate::view::{GridView, HeaderCell, RowSlot};
use grid_model::{Column, GridError, RowHandle, RowRecord};
use position_cache::{HeightCache, PositionMap};
use sort_engine::SingleSort;

/// Measurements between automatic estimate relaxations.
const RELAX_EVERY: usize = 32;

/// Host-level options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Estimated height for rows that have never been measured.
    pub default_row_height: f64,

    /// Extra rows rendered above and below the viewport.
    pub overscan: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            default_row_height: 28.0,
            overscan: 3,
        }
    }
}

/// Half-open row index range `[start, end)` to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A framework-agnostic data grid over in-memory rows.
pub struct DataGrid {
    options: GridOptions,

    /// Application rows in their current physical order. Single-column
    /// sorting reorders this array in place.
    source_rows: Vec<RowHandle>,

    /// Application column configuration.
    columns: Vec<Column>,

    plugins: PluginSet,
    single_sort: SingleSort,

    /// Measured heights; survives every pipeline re-run.
    height_cache: HeightCache,
    positions: PositionMap,

    /// Monotonically increasing pipeline-output generation. Starts at 1;
    /// 0 is reserved as the stale marker for pooled slots.
    epoch: u64,

    emitter: EventEmitter,
    view: GridView,

    /// Current pipeline output.
    derived_rows: Vec<RowHandle>,
    derived_columns: Vec<Column>,

    measure_count: usize,
}

impl DataGrid {
    pub fn new(options: GridOptions) -> Self {
        DataGrid {
            options,
            source_rows: Vec::new(),
            columns: Vec::new(),
            plugins: PluginSet::new(),
            single_sort: SingleSort::new(),
            height_cache: HeightCache::new(),
            positions: PositionMap::new(),
            epoch: 1,
            emitter: EventEmitter::new(),
            view: GridView::default(),
            derived_rows: Vec::new(),
            derived_columns: Vec::new(),
            measure_count: 0,
        }
    }

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    /// Attaches a plugin. Order of registration is the order hooks run in.
    pub fn register_plugin(&mut self, plugin: Box<dyn GridPlugin>) -> Result<(), GridError> {
        self.plugins.register(plugin)?;
        self.refresh();
        Ok(())
    }

    /// Replaces the column configuration. Field names must be unique, and
    /// column properties that need a plugin are rejected while that plugin
    /// is absent; register plugins first.
    pub fn set_columns(&mut self, columns: Vec<Column>) -> Result<(), GridError> {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for column in &columns {
            if !seen.insert(column.field.clone()) {
                return Err(GridError::DuplicateColumnField(column.field.clone()));
            }
        }
        if columns.iter().any(|c| c.group.is_some())
            && !self.plugins.is_registered("grouping-columns")
        {
            return Err(GridError::MissingPlugin {
                property: "group".to_string(),
                plugin: "grouping-columns".to_string(),
            });
        }

        self.columns = columns;
        self.refresh();
        Ok(())
    }

    /// Replaces the data set. Any active single-column sort is dropped
    /// along with its original-order snapshot.
    pub fn set_rows(&mut self, rows: Vec<RowRecord>) {
        self.source_rows = rows.into_iter().map(RowHandle::new).collect();
        self.single_sort = SingleSort::new();
        self.refresh();
    }

    pub fn subscribe(&mut self, listener: impl Fn(&GridEvent) + Send + Sync + 'static) {
        self.emitter.subscribe(listener);
    }

    // ========================================================================
    // PIPELINE
    // ========================================================================

    /// Re-runs the plugin pipeline over the source rows and columns,
    /// rebuilds the position cache, and bumps the render epoch.
    ///
    /// Rows fold before columns so a plugin whose column set depends on
    /// the data (pivot) settles within a single refresh.
    pub fn refresh(&mut self) {
        let mut rows: Vec<RowHandle> = self.source_rows.clone();
        for plugin in self.plugins.iter_mut() {
            rows = plugin.process_rows(rows);
        }
        let mut columns: Vec<Column> = self.columns.clone();
        for plugin in self.plugins.iter_mut() {
            columns = plugin.process_columns(columns);
        }

        self.derived_rows = rows;
        self.derived_columns = columns;
        self.rebuild_positions();
        self.bump_epoch();

        log::debug!(
            "grid: pipeline refreshed, {} rows, {} columns, epoch {}",
            self.derived_rows.len(),
            self.derived_columns.len(),
            self.epoch
        );
    }

    fn rebuild_positions(&mut self) {
        let mut positions = std::mem::take(&mut self.positions);
        {
            let plugins = &self.plugins;
            let plugin_height = |row: &RowHandle, index: usize| -> Option<f64> {
                plugins.iter().find_map(|p| p.row_height(row, index))
            };
            positions.rebuild(
                &self.derived_rows,
                &self.height_cache,
                self.options.default_row_height,
                Some(&plugin_height),
            );
        }
        self.positions = positions;
    }

    /// Increments the epoch and stamps every pooled slot stale. Must run
    /// before any event announcing the change is dispatched.
    fn bump_epoch(&mut self) {
        self.epoch += 1;
        self.view.invalidate_slots();
    }

    // ========================================================================
    // INTERACTION
    // ========================================================================

    /// Routes a header click: plugins get the first refusal (a `true`
    /// return suppresses the default), then the built-in single-column
    /// sort toggle runs on sortable columns.
    pub fn header_click(&mut self, field: &str, shift_key: bool) {
        let click = HeaderClick {
            field: field.to_string(),
            shift_key,
        };
        let mut ctx = PluginContext::new();
        let mut handled = false;
        for plugin in self.plugins.iter_mut() {
            if plugin.on_header_click(&click, &mut ctx) {
                handled = true;
                break;
            }
        }

        if handled {
            self.refresh();
            for event in ctx.take_events() {
                self.emitter.emit(&event);
            }
            return;
        }

        let Some(column) = self.columns.iter().find(|c| c.field == field).cloned() else {
            return;
        };
        if !column.sortable {
            return;
        }

        let effect = self.single_sort.toggle(&mut self.source_rows, &column);
        log::debug!(
            "grid: sort toggled on '{}', direction {}",
            effect.field,
            effect.direction
        );
        self.refresh();
        self.emitter.emit(&GridEvent::SortChange {
            field: effect.field,
            direction: effect.direction,
        });
    }

    // ========================================================================
    // VIRTUALIZATION
    // ========================================================================

    /// Row indices to render for the given scroll position, padded by the
    /// configured overscan.
    pub fn visible_range(&self, scroll_offset: f64, viewport_height: f64) -> VisibleRange {
        let Some(first) = self.positions.index_at_offset(scroll_offset) else {
            return VisibleRange { start: 0, end: 0 };
        };
        let bottom = scroll_offset + viewport_height.max(0.0);
        let last = self.positions.index_at_offset(bottom).unwrap_or(first);

        VisibleRange {
            start: first.saturating_sub(self.options.overscan),
            end: (last + 1 + self.options.overscan).min(self.positions.len()),
        }
    }

    /// Rebuilds the view for the given scroll position, recycling pooled
    /// slots whose content is from the current epoch. `after_render` hooks
    /// run last and may mutate the view, but not rows or columns.
    pub fn render(&mut self, scroll_offset: f64, viewport_height: f64) -> &GridView {
        let range = self.visible_range(scroll_offset, viewport_height);
        let header = self.build_header();

        let mut slots = Vec::with_capacity(range.len());
        for index in range.start..range.end {
            let Some(position) = self.positions.get(index).copied() else {
                break;
            };
            let reusable = self
                .view
                .slots
                .iter()
                .find(|s| s.row_index == index && s.epoch == self.epoch);
            let slot = match reusable {
                Some(existing) => {
                    let mut slot = existing.clone();
                    slot.offset = position.offset;
                    slot.height = position.height;
                    slot
                }
                None => RowSlot {
                    row_index: index,
                    offset: position.offset,
                    height: position.height,
                    cells: self.build_cells(index),
                    epoch: self.epoch,
                },
            };
            slots.push(slot);
        }

        self.view.header = header;
        self.view.group_header.clear();
        self.view.slots = slots;
        self.view.epoch = self.epoch;
        self.view.first_index = range.start;
        self.view.total_height = self.positions.total_height();

        let mut view = std::mem::take(&mut self.view);
        for plugin in self.plugins.iter_mut() {
            plugin.after_render(&mut view);
        }
        self.view = view;
        &self.view
    }

    fn build_header(&self) -> Vec<HeaderCell> {
        self.derived_columns
            .iter()
            .map(|column| {
                let mut cell = HeaderCell {
                    field: column.field.clone(),
                    label: column.header_label().to_string(),
                    sortable: column.sortable,
                    sort_direction: None,
                    sort_index: None,
                    width_css: column.width.as_ref().map(|w| w.css()),
                };
                if let Some(state) = self.single_sort.state() {
                    if state.field == column.field {
                        cell.sort_direction = Some(state.direction.signum());
                    }
                }
                for plugin in self.plugins.iter() {
                    if let Some(state) = plugin.column_state(&column.field) {
                        if cell.sort_direction.is_none() {
                            cell.sort_direction = state.sort_direction;
                        }
                        if cell.sort_index.is_none() {
                            cell.sort_index = state.sort_index;
                        }
                    }
                }
                cell
            })
            .collect()
    }

    fn build_cells(&self, index: usize) -> Vec<String> {
        let Some(row) = self.derived_rows.get(index) else {
            return Vec::new();
        };
        self.derived_columns
            .iter()
            .map(|column| row.value(&column.field).display())
            .collect()
    }

    /// Records a real DOM measurement for a rendered row. The hot path:
    /// one height-cache write plus a suffix offset fixup. Estimates are
    /// periodically relaxed toward the running measured average.
    pub fn measure_row(&mut self, index: usize, height: f64) {
        if let Some(row) = self.derived_rows.get(index) {
            self.height_cache.set(row, height);
        }
        self.positions.update_row_height(index, height);

        self.measure_count += 1;
        if self.measure_count % RELAX_EVERY == 0 {
            self.relax_estimates();
        }
    }

    /// Re-estimates unmeasured rows at the current measured average.
    pub fn relax_estimates(&mut self) {
        let average = self
            .positions
            .average_measured_height(self.options.default_row_height);
        self.positions.relax_estimates(average);
    }

    // ========================================================================
    // COLUMN STATE ROUND-TRIP
    // ========================================================================

    /// Serializable per-field state: the host's own sort state merged with
    /// every plugin's contribution. Only non-default entries are included.
    pub fn column_state(&self) -> FxHashMap<String, ColumnState> {
        let mut out = FxHashMap::default();
        for column in &self.columns {
            let mut state = ColumnState::default();
            if let Some(s) = self.single_sort.state() {
                if s.field == column.field {
                    state.sort_direction = Some(s.direction.signum());
                }
            }
            for plugin in self.plugins.iter() {
                if let Some(ps) = plugin.column_state(&column.field) {
                    state.merge(&ps);
                }
            }
            if !state.is_default() {
                out.insert(column.field.clone(), state);
            }
        }
        out
    }

    /// Applies previously captured column state. Plugins receive every
    /// entry; when no multi-sort plugin is registered, a sort direction is
    /// replayed through the single-sort toggle so the original-order
    /// snapshot semantics are preserved.
    pub fn apply_column_state(&mut self, state: &FxHashMap<String, ColumnState>) {
        for (field, column_state) in state {
            for plugin in self.plugins.iter_mut() {
                plugin.apply_column_state(field, column_state);
            }
        }

        if !self.plugins.is_registered("multi-sort") {
            for (field, column_state) in state {
                let Some(direction) = column_state.sort_direction else {
                    continue;
                };
                let Some(column) = self.columns.iter().find(|c| c.field == *field).cloned()
                else {
                    continue;
                };
                let _ = self.single_sort.toggle(&mut self.source_rows, &column);
                if direction < 0 {
                    let _ = self.single_sort.toggle(&mut self.source_rows, &column);
                }
            }
        }

        self.refresh();
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Pipeline output rows for the current epoch.
    pub fn rows(&self) -> &[RowHandle] {
        &self.derived_rows
    }

    /// The application's rows in their current physical order.
    pub fn source_rows(&self) -> &[RowHandle] {
        &self.source_rows
    }

    /// Pipeline output columns for the current epoch.
    pub fn columns(&self) -> &[Column] {
        &self.derived_columns
    }

    pub fn sort_state(&self) -> Option<&sort_engine::SortState> {
        self.single_sort.state()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn view(&self) -> &GridView {
        &self.view
    }

    /// Typed access to a registered plugin.
    pub fn plugin<P: GridPlugin>(&self, name: &str) -> Option<&P> {
        self.plugins.get::<P>(name)
    }

    pub fn plugin_mut<P: GridPlugin>(&mut self, name: &str) -> Option<&mut P> {
        self.plugins.get_mut::<P>(name)
    }
}

impl Default for DataGrid {
    fn default() -> Self {
        DataGrid::new(GridOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_model::RowValue;

    fn grid_with_rows(count: usize) -> DataGrid {
        let mut grid = DataGrid::default();
        grid.set_columns(vec![Column::new("id"), Column::new("name")])
            .unwrap();
        grid.set_rows(
            (0..count)
                .map(|i| {
                    RowRecord::new()
                        .with_row_id(&i.to_string())
                        .with_value("id", RowValue::Number(i as f64))
                        .with_value("name", RowValue::Text(format!("row {}", i)))
                })
                .collect(),
        );
        grid
    }

    #[test]
    fn visible_range_covers_viewport_with_overscan() {
        let grid = grid_with_rows(100);
        // 28px rows, viewport 280px at offset 0: rows 0..=10 visible,
        // plus 3 overscan below.
        let range = grid.visible_range(0.0, 280.0);
        assert_eq!(range.start, 0);
        assert_eq!(range.end, 14);

        let range = grid.visible_range(28.0 * 50.0, 280.0);
        assert_eq!(range.start, 47);
        assert_eq!(range.end, 64);

        // Past the end clamps.
        let range = grid.visible_range(1.0e9, 280.0);
        assert_eq!(range.end, 100);
    }

    #[test]
    fn render_pools_slots_within_an_epoch() {
        let mut grid = grid_with_rows(50);
        grid.render(0.0, 140.0);
        let epoch = grid.view().epoch;
        let first_cells = grid.view().slots[0].cells.clone();

        // Scrolling within the same epoch keeps overlapping slot content.
        let view = grid.render(28.0, 140.0);
        assert_eq!(view.epoch, epoch);
        let slot0 = view.slots.iter().find(|s| s.row_index == 0).unwrap();
        assert_eq!(slot0.cells, first_cells);
        assert_eq!(slot0.epoch, epoch);
    }

    #[test]
    fn sorting_bumps_the_epoch_and_invalidates_slots() {
        let mut grid = grid_with_rows(10);
        grid.render(0.0, 140.0);
        let before = grid.epoch();

        grid.header_click("id", false);
        assert!(grid.epoch() > before);

        // The pooled content from the old epoch may not be reused.
        let current_epoch = grid.epoch();
        let view = grid.render(0.0, 140.0);
        assert!(view.slots.iter().all(|s| s.epoch == current_epoch));
    }

    #[test]
    fn epoch_bump_precedes_event_dispatch() {
        use std::sync::{Arc, Mutex};

        let mut grid = grid_with_rows(5);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            grid.subscribe(move |event| {
                seen.lock().unwrap().push(event.clone());
            });
        }

        grid.header_click("id", false);
        grid.header_click("id", false);
        grid.header_click("id", false);

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            *events,
            vec![
                GridEvent::SortChange { field: "id".to_string(), direction: 1 },
                GridEvent::SortChange { field: "id".to_string(), direction: -1 },
                GridEvent::SortChange { field: "id".to_string(), direction: 0 },
            ]
        );
    }

    #[test]
    fn measure_row_survives_resorting() {
        let mut grid = grid_with_rows(10);
        grid.measure_row(0, 60.0);
        assert_eq!(grid.positions().get(0).unwrap().height, 60.0);

        // Descending sort moves row 0 to the end; its height follows.
        grid.header_click("id", false);
        grid.header_click("id", false);
        assert_eq!(grid.rows()[9].value("id"), &RowValue::Number(0.0));
        assert_eq!(grid.positions().get(9).unwrap().height, 60.0);
        assert!(grid.positions().get(9).unwrap().measured);
    }

    #[test]
    fn duplicate_column_fields_are_rejected() {
        let mut grid = DataGrid::default();
        let err = grid
            .set_columns(vec![Column::new("a"), Column::new("a")])
            .unwrap_err();
        assert_eq!(err, GridError::DuplicateColumnField("a".to_string()));
    }

    #[test]
    fn grouped_columns_require_the_plugin() {
        let mut grid = DataGrid::default();
        let err = grid
            .set_columns(vec![Column::new("a").with_group("G1")])
            .unwrap_err();
        assert!(matches!(err, GridError::MissingPlugin { .. }));
    }

    #[test]
    fn unsortable_columns_ignore_clicks() {
        let mut grid = DataGrid::default();
        grid.set_columns(vec![Column::new("id").not_sortable()]).unwrap();
        grid.set_rows(vec![
            RowRecord::new().with_value("id", RowValue::Number(2.0)),
            RowRecord::new().with_value("id", RowValue::Number(1.0)),
        ]);
        let before = grid.epoch();
        grid.header_click("id", false);
        assert_eq!(grid.epoch(), before);
        assert!(grid.sort_state().is_none());
    }
}
