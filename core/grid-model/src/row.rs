//! FILENAME: core/grid-model/src/row.rs
//! PURPOSE: Row records and the three-tier row identity resolution.
//! CONTEXT: Rows are opaque field->value records. They circulate as
//! `Arc<RowRecord>` handles so sorted copies and pipeline outputs share
//! storage; only the ordering of the backing `Vec` ever changes.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::value::RowValue;

/// Shared handle to a row record. Cloning is cheap; the record itself is
/// immutable once handed to the grid.
pub type RowHandle = Arc<RowRecord>;

/// An application data row: a mapping from field name to value, plus the
/// optional identity fields the grid uses to track it across transforms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowRecord {
    /// Field values keyed by column field name.
    pub values: FxHashMap<String, RowValue>,

    /// Natural identity supplied by the application, if any.
    pub row_id: Option<String>,

    /// Synthetic identity assigned by a grouping/pivot transform. Synthetic
    /// rows are recreated on every pipeline run, so a stable key is the only
    /// way measured heights survive a rebuild.
    pub cache_key: Option<String>,
}

static EMPTY: RowValue = RowValue::Empty;

impl RowRecord {
    pub fn new() -> Self {
        RowRecord::default()
    }

    pub fn with_value(mut self, field: &str, value: RowValue) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    pub fn with_row_id(mut self, row_id: &str) -> Self {
        self.row_id = Some(row_id.to_string());
        self
    }

    pub fn with_cache_key(mut self, cache_key: &str) -> Self {
        self.cache_key = Some(cache_key.to_string());
        self
    }

    pub fn get(&self, field: &str) -> Option<&RowValue> {
        self.values.get(field)
    }

    /// Returns the value for `field`, treating missing fields as `Empty`.
    pub fn value(&self, field: &str) -> &RowValue {
        self.values.get(field).unwrap_or(&EMPTY)
    }
}

/// Resolved identity of a row, used to key measured heights and expansion
/// state across pipeline re-runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowIdentity {
    /// String identity: either a synthetic cache key, or `"id:" + row_id`.
    Key(String),
    /// Allocation identity for rows with no stable key. Valid only while the
    /// handle is alive; callers must not persist it past grid teardown.
    Ref(usize),
}

/// Resolves a row's identity with the documented priority: synthetic cache
/// key, then explicit row id, then the handle's allocation address.
///
/// The `"id:"` prefix keeps natural ids from colliding with synthetic cache
/// keys in the same map. The tier asymmetry is deliberate: synthetic rows
/// need a stable key because they are recreated each pipeline run, while
/// real rows may or may not carry a natural id.
pub fn resolve_row_identity(row: &RowHandle) -> RowIdentity {
    if let Some(key) = &row.cache_key {
        return RowIdentity::Key(key.clone());
    }
    if let Some(id) = &row.row_id {
        return RowIdentity::Key(format!("id:{}", id));
    }
    RowIdentity::Ref(Arc::as_ptr(row) as usize)
}
