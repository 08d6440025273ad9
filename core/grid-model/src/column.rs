//! FILENAME: core/grid-model/src/column.rs
//! PURPOSE: Column descriptors and their group/width/comparator options.
//! CONTEXT: Columns are configuration, not data. Field names are unique
//! within one grid instance; order is significant and may change (reorder,
//! pivot regeneration).

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::RowValue;

/// A custom ordering function attached to a column, overriding the engine
/// default. Wrapped so `Column` stays `Clone` and `Debug`.
#[derive(Clone)]
pub struct SortComparator(pub Arc<dyn Fn(&RowValue, &RowValue) -> Ordering + Send + Sync>);

impl SortComparator {
    pub fn new(f: impl Fn(&RowValue, &RowValue) -> Ordering + Send + Sync + 'static) -> Self {
        SortComparator(Arc::new(f))
    }

    pub fn compare(&self, a: &RowValue, b: &RowValue) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for SortComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SortComparator(..)")
    }
}

/// Column width: a number is pixels, a string passes through as a raw unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnWidth {
    Px(f64),
    Raw(String),
}

impl ColumnWidth {
    pub fn css(&self) -> String {
        match self {
            ColumnWidth::Px(px) => format!("{}px", px),
            ColumnWidth::Raw(unit) => unit.clone(),
        }
    }
}

/// Group assignment for a column: a bare id, or an id with a display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGroupSpec {
    pub id: String,
    pub label: Option<String>,
}

impl ColumnGroupSpec {
    pub fn new(id: &str) -> Self {
        ColumnGroupSpec {
            id: id.to_string(),
            label: None,
        }
    }

    pub fn with_label(id: &str, label: &str) -> Self {
        ColumnGroupSpec {
            id: id.to_string(),
            label: Some(label.to_string()),
        }
    }
}

impl From<&str> for ColumnGroupSpec {
    fn from(id: &str) -> Self {
        ColumnGroupSpec::new(id)
    }
}

/// Descriptor for one grid column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Unique key, stable across renders.
    pub field: String,

    /// Display label; falls back to `field` when absent.
    pub header: Option<String>,

    pub sortable: bool,
    pub resizable: bool,

    pub width: Option<ColumnWidth>,
    pub min_width: Option<f64>,

    /// Optional column-group assignment.
    pub group: Option<ColumnGroupSpec>,

    /// Optional comparator override used by both sort engines.
    #[serde(skip)]
    pub sort_comparator: Option<SortComparator>,
}

impl Column {
    pub fn new(field: &str) -> Self {
        Column {
            field: field.to_string(),
            header: None,
            sortable: true,
            resizable: true,
            width: None,
            min_width: None,
            group: None,
            sort_comparator: None,
        }
    }

    pub fn with_header(mut self, header: &str) -> Self {
        self.header = Some(header.to_string());
        self
    }

    pub fn with_group(mut self, group: impl Into<ColumnGroupSpec>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_width(mut self, width: ColumnWidth) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_comparator(mut self, comparator: SortComparator) -> Self {
        self.sort_comparator = Some(comparator);
        self
    }

    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Display label for headers.
    pub fn header_label(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.field)
    }
}
