//! FILENAME: core/grid-model/src/error.rs
//! PURPOSE: Configuration-time errors shared across the workspace.
//! CONTEXT: These surface programmer misuse at setup ("this will never
//! work"), distinct from malformed row data, which the engines degrade on
//! silently. None of the hot-path transforms return these.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid: plugin '{0}' is already registered; each plugin may be attached at most once")]
    DuplicatePlugin(String),

    #[error("grid: column property '{property}' requires the '{plugin}' plugin; register it before refreshing the grid")]
    MissingPlugin { property: String, plugin: String },

    #[error("grid: duplicate column field '{0}'; field names must be unique within one grid instance")]
    DuplicateColumnField(String),

    #[error("pivot: unknown aggregator '{0}'; register it on the AggregatorRegistry or use a built-in name")]
    UnknownAggregator(String),

    #[error("pivot: unknown formatter '{0}'; register it on the AggregatorRegistry")]
    UnknownFormatter(String),
}
