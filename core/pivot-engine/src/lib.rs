//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot subsystem for the grid core.
//!
//! This crate provides the pivot calculation engine as a standalone module,
//! separate from the render host. It depends on `grid-model` only for the
//! shared row/value types.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot IS)
//! - `engine`: Calculation engine (HOW we compute)
//!
//! The transform is pure: input rows are never mutated, and the whole tree
//! is rebuilt from scratch on every run. Expansion state lives with the
//! caller and survives rebuilds.

pub mod definition;
pub mod engine;

pub use definition::{
    validate_pivot_config, Aggregation, AggregatorRegistry, PivotConfig, ValueField,
};
pub use engine::{
    aggregate_values, build_pivot, collect_group_keys, flatten_pivot_rows, value_key,
    FlatPivotRow, PivotResult, PivotRow, BLANK_LABEL, VALUE_COLUMN_KEY,
};
