//! FILENAME: core/position-cache/src/lib.rs
//! PURPOSE: Virtualization geometry for variable-height rows.
//! CONTEXT: Two pieces of state with different lifetimes: `HeightCache`
//! remembers measured heights per row identity and survives pipeline
//! re-runs; `PositionMap` is the per-render offset array rebuilt whenever
//! the row list changes. Both are owned by the render host and passed
//! explicitly, so concurrent grid instances share nothing.

pub mod height;
pub mod position;

pub use height::HeightCache;
pub use position::{PluginHeightFn, PositionMap, RowPosition};
