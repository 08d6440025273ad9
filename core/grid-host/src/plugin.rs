//! FILENAME: core/grid-host/src/plugin.rs
//! PURPOSE: The plugin capability interface and the ordered plugin set.
//! CONTEXT: Plugins customize the grid through a fixed hook contract
//! rather than inheritance: a trait with identity/no-op defaults, so a
//! plugin implements only the hooks it needs. Hooks consume and return
//! owned vectors, which makes the "never return a mutated alias of your
//! input" rule structural rather than a convention.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::event::GridEvent;
use crate::view::GridView;
use grid_model::{Column, GridError, RowHandle};

/// A header click offered to plugins before the default sort toggle runs.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderClick {
    pub field: String,
    pub shift_key: bool,
}

/// Side-channel for hooks that need to announce changes. The host
/// dispatches collected events only after the epoch bump and pool
/// invalidation, preserving the ordering contract.
#[derive(Debug, Default)]
pub struct PluginContext {
    events: Vec<GridEvent>,
}

impl PluginContext {
    pub fn new() -> Self {
        PluginContext::default()
    }

    pub fn emit(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    pub(crate) fn take_events(self) -> Vec<GridEvent> {
        self.events
    }
}

/// Per-field state a plugin exposes for serialization round-trips. All
/// fields optional; states from several plugins merge per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnState {
    /// `1` ascending, `-1` descending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<i8>,

    /// 1-based multi-sort priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<usize>,

    /// Whether the field is a pivot row group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_group: Option<bool>,

    /// Whether the field is an aggregated pivot value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_field: Option<bool>,
}

impl ColumnState {
    pub fn is_default(&self) -> bool {
        *self == ColumnState::default()
    }

    /// Fills unset fields of `self` from `other`.
    pub fn merge(&mut self, other: &ColumnState) {
        if self.sort_direction.is_none() {
            self.sort_direction = other.sort_direction;
        }
        if self.sort_index.is_none() {
            self.sort_index = other.sort_index;
        }
        if self.row_group.is_none() {
            self.row_group = other.row_group;
        }
        if self.value_field.is_none() {
            self.value_field = other.value_field;
        }
    }
}

/// The hook contract plugins implement. Applied in registration order;
/// each hook receives the previous plugin's output.
pub trait GridPlugin: Any {
    /// Stable name used for duplicate detection and lookup.
    fn name(&self) -> &str;

    /// Reshapes the column list. Runs after `process_rows` within one
    /// pipeline pass, so data-driven column sets (pivot) settle in a
    /// single refresh.
    fn process_columns(&mut self, columns: Vec<Column>) -> Vec<Column> {
        columns
    }

    /// Reshapes the row list.
    fn process_rows(&mut self, rows: Vec<RowHandle>) -> Vec<RowHandle> {
        rows
    }

    /// Runs after the view has been rebuilt for the current epoch. May
    /// mutate the view (e.g. insert a group header row); rows and columns
    /// are frozen by this point.
    fn after_render(&mut self, _view: &mut GridView) {}

    /// Return `true` to suppress the grid's default sort toggle.
    fn on_header_click(&mut self, _click: &HeaderClick, _ctx: &mut PluginContext) -> bool {
        false
    }

    /// Per-row height override consulted when the position cache rebuilds.
    fn row_height(&self, _row: &RowHandle, _index: usize) -> Option<f64> {
        None
    }

    fn column_state(&self, _field: &str) -> Option<ColumnState> {
        None
    }

    fn apply_column_state(&mut self, _field: &str, _state: &ColumnState) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Registration-ordered plugin list.
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Box<dyn GridPlugin>>,
}

impl PluginSet {
    pub fn new() -> Self {
        PluginSet::default()
    }

    /// Attaches a plugin. Registering two plugins with the same name is a
    /// configuration error, caught here rather than surfacing as doubled
    /// transforms at render time.
    pub fn register(&mut self, plugin: Box<dyn GridPlugin>) -> Result<(), GridError> {
        if self.is_registered(plugin.name()) {
            return Err(GridError::DuplicatePlugin(plugin.name().to_string()));
        }
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn GridPlugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn GridPlugin>> {
        self.plugins.iter_mut()
    }

    /// Typed access to a registered plugin, for plugin-specific operations
    /// like toggling pivot expansion.
    pub fn get_mut<P: GridPlugin>(&mut self, name: &str) -> Option<&mut P> {
        self.plugins
            .iter_mut()
            .find(|p| p.name() == name)
            .and_then(|p| p.as_any_mut().downcast_mut::<P>())
    }

    pub fn get<P: GridPlugin>(&self, name: &str) -> Option<&P> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .and_then(|p| p.as_any().downcast_ref::<P>())
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name()))
            .finish()
    }
}
