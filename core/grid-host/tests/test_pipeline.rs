//! FILENAME: tests/test_pipeline.rs
//! Integration tests for the plugin pipeline: hook ordering, output
//! threading, epoch invalidation, and the column-state round trip.

mod common;

use std::any::Any;
use std::sync::{Arc, Mutex};

use common::{sales_grid, SalesFixture};
use grid_host::{
    ColumnState, DataGrid, GridError, GridPlugin, GridView, GroupingColumnsConfig,
    GroupingColumnsPlugin, MultiSortPlugin,
};
use grid_model::{Column, RowHandle, RowRecord, RowValue};
use sort_engine::MultiSortConfig;

// ============================================================================
// HELPER PLUGINS
// ============================================================================

/// Records which of its hooks ran, in order, into a shared trace.
struct TracePlugin {
    name: String,
    trace: Arc<Mutex<Vec<String>>>,
}

impl TracePlugin {
    fn new(name: &str, trace: Arc<Mutex<Vec<String>>>) -> Box<Self> {
        Box::new(TracePlugin {
            name: name.to_string(),
            trace,
        })
    }

    fn record(&self, hook: &str) {
        self.trace
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, hook));
    }
}

impl GridPlugin for TracePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_rows(&mut self, rows: Vec<RowHandle>) -> Vec<RowHandle> {
        self.record("rows");
        rows
    }

    fn process_columns(&mut self, columns: Vec<Column>) -> Vec<Column> {
        self.record("columns");
        columns
    }

    fn after_render(&mut self, _view: &mut GridView) {
        self.record("after_render");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Appends one synthetic footer row so downstream plugins see its output.
struct FooterPlugin;

impl GridPlugin for FooterPlugin {
    fn name(&self) -> &str {
        "footer"
    }

    fn process_rows(&mut self, mut rows: Vec<RowHandle>) -> Vec<RowHandle> {
        rows.push(RowHandle::new(
            RowRecord::new()
                .with_cache_key("__footer__")
                .with_value("region", RowValue::Text("footer".to_string())),
        ));
        rows
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Counts the rows it was handed.
struct CountPlugin {
    seen: Arc<Mutex<usize>>,
}

impl GridPlugin for CountPlugin {
    fn name(&self) -> &str {
        "count"
    }

    fn process_rows(&mut self, rows: Vec<RowHandle>) -> Vec<RowHandle> {
        *self.seen.lock().unwrap() = rows.len();
        rows
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ============================================================================
// PIPELINE ORDER AND THREADING
// ============================================================================

#[test]
fn test_hooks_run_in_registration_order() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let mut grid = DataGrid::default();
    grid.register_plugin(TracePlugin::new("first", Arc::clone(&trace)))
        .unwrap();
    grid.register_plugin(TracePlugin::new("second", Arc::clone(&trace)))
        .unwrap();

    trace.lock().unwrap().clear();
    grid.refresh();
    grid.render(0.0, 100.0);

    assert_eq!(
        *trace.lock().unwrap(),
        vec![
            "first:rows",
            "second:rows",
            "first:columns",
            "second:columns",
            "first:after_render",
            "second:after_render",
        ]
    );
}

#[test]
fn test_each_plugin_receives_the_previous_output() {
    let seen = Arc::new(Mutex::new(0));
    let mut grid = sales_grid();
    grid.register_plugin(Box::new(FooterPlugin)).unwrap();
    grid.register_plugin(Box::new(CountPlugin {
        seen: Arc::clone(&seen),
    }))
    .unwrap();
    grid.refresh();

    // The counter saw the fixture rows plus the appended footer.
    assert_eq!(*seen.lock().unwrap(), SalesFixture::rows().len() + 1);
    assert_eq!(grid.rows().len(), SalesFixture::rows().len() + 1);
    // The source rows are untouched by the pipeline.
    assert_eq!(grid.source_rows().len(), SalesFixture::rows().len());
}

#[test]
fn test_duplicate_plugin_registration_fails() {
    let mut grid = DataGrid::default();
    grid.register_plugin(Box::new(FooterPlugin)).unwrap();
    let err = grid.register_plugin(Box::new(FooterPlugin)).unwrap_err();
    assert_eq!(err, GridError::DuplicatePlugin("footer".to_string()));
}

#[test]
fn test_refresh_bumps_epoch_and_stales_slots() {
    let mut grid = sales_grid();
    grid.render(0.0, 200.0);
    let first_epoch = grid.view().epoch;

    grid.refresh();
    assert!(grid.epoch() > first_epoch);
    // Slots still hold the old content but are stamped stale.
    assert!(grid.view().slots.iter().all(|s| s.epoch == grid_host::STALE_EPOCH));

    let view = grid.render(0.0, 200.0);
    assert!(view.slots.iter().all(|s| s.epoch == view.epoch));
}

// ============================================================================
// GROUP HEADER ROW
// ============================================================================

#[test]
fn test_group_header_row_appears_after_render() {
    let mut grid = DataGrid::default();
    grid.register_plugin(Box::new(GroupingColumnsPlugin::new(
        GroupingColumnsConfig::default(),
    )))
    .unwrap();
    grid.set_columns(vec![
        Column::new("a").with_group("G1"),
        Column::new("b").with_group("G1"),
        Column::new("c"),
    ])
    .unwrap();
    grid.set_rows(vec![RowRecord::new().with_value("a", RowValue::Number(1.0))]);

    let view = grid.render(0.0, 100.0);
    assert_eq!(view.group_header.len(), 2);
    assert_eq!(view.group_header[0].label, "G1");
    assert_eq!(view.group_header[0].span, 2);

    // Without the plugin, declaring groups is a configuration error.
    let mut bare = DataGrid::default();
    let err = bare
        .set_columns(vec![Column::new("a").with_group("G1")])
        .unwrap_err();
    assert!(matches!(err, GridError::MissingPlugin { .. }));
}

// ============================================================================
// COLUMN STATE ROUND TRIP
// ============================================================================

#[test]
fn test_column_state_round_trips_through_json() {
    let mut grid = sales_grid();
    grid.register_plugin(Box::new(MultiSortPlugin::new(MultiSortConfig::default())))
        .unwrap();
    grid.header_click("region", false);
    grid.header_click("sales", true);

    let state = grid.column_state();
    let json = serde_json::to_string(&state).unwrap();
    let restored: rustc_hash::FxHashMap<String, ColumnState> =
        serde_json::from_str(&json).unwrap();

    let mut fresh = sales_grid();
    fresh
        .register_plugin(Box::new(MultiSortPlugin::new(MultiSortConfig::default())))
        .unwrap();
    fresh.apply_column_state(&restored);

    let original: Vec<f64> = grid
        .rows()
        .iter()
        .map(|r| r.value("sales").coerce_number())
        .collect();
    let replayed: Vec<f64> = fresh
        .rows()
        .iter()
        .map(|r| r.value("sales").coerce_number())
        .collect();
    assert_eq!(original, replayed);
}
