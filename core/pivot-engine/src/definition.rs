//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a pivot: which fields
//! group rows and columns, which fields are aggregated and how, and the
//! display options. These structures are designed to be:
//! - Serializable (for persisting grid state)
//! - Immutable snapshots of user intent
//!
//! Custom aggregators and display formatters are functions and therefore
//! live outside the serializable config, registered by name on an
//! `AggregatorRegistry` the engine resolves against.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use grid_model::GridError;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for value fields. `Custom` names an
/// entry registered on the `AggregatorRegistry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    First,
    Last,
    Custom(String),
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Sum
    }
}

type AggregatorFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;
type FormatterFn = Arc<dyn Fn(f64) -> String + Send + Sync>;

/// Named custom aggregators and display formatters.
///
/// Built-ins are matched directly by the engine; only `Custom` aggregations
/// and `ValueField::formatter` names go through the registry. Formatters
/// post-process an aggregate into a display string and never affect the
/// numeric value used for totals.
#[derive(Clone, Default)]
pub struct AggregatorRegistry {
    aggregators: FxHashMap<String, AggregatorFn>,
    formatters: FxHashMap<String, FormatterFn>,
}

impl AggregatorRegistry {
    pub fn new() -> Self {
        AggregatorRegistry::default()
    }

    pub fn register_aggregator(
        &mut self,
        name: &str,
        f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static,
    ) {
        self.aggregators.insert(name.to_string(), Arc::new(f));
    }

    pub fn register_formatter(
        &mut self,
        name: &str,
        f: impl Fn(f64) -> String + Send + Sync + 'static,
    ) {
        self.formatters.insert(name.to_string(), Arc::new(f));
    }

    /// Checks that `aggregation` is resolvable. Configuration-time only.
    pub fn resolve(&self, aggregation: &Aggregation) -> Result<(), GridError> {
        match aggregation {
            Aggregation::Custom(name) if !self.aggregators.contains_key(name) => {
                Err(GridError::UnknownAggregator(name.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Checks that a named formatter exists. Configuration-time only.
    pub fn resolve_formatter(&self, name: &str) -> Result<(), GridError> {
        if self.formatters.contains_key(name) {
            Ok(())
        } else {
            Err(GridError::UnknownFormatter(name.to_string()))
        }
    }

    /// Applies `aggregation` to a value slice. An empty slice yields `0.0`
    /// (callers distinguish "no data" before getting here), and an
    /// unresolvable custom name degrades to `Sum` with a warning rather
    /// than failing: aggregation sits on the render path.
    pub fn aggregate(&self, aggregation: &Aggregation, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match aggregation {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Avg => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Count => values.len() as f64,
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::First => values[0],
            Aggregation::Last => values[values.len() - 1],
            Aggregation::Custom(name) => match self.aggregators.get(name) {
                Some(f) => f(values),
                None => {
                    log::warn!("pivot: custom aggregator '{}' not registered, using sum", name);
                    values.iter().sum()
                }
            },
        }
    }

    /// Formats an aggregate for display using the value field's named
    /// formatter, falling back to the plain number rendering.
    pub fn format(&self, value_field: &ValueField, value: f64) -> String {
        if let Some(name) = &value_field.formatter {
            if let Some(f) = self.formatters.get(name) {
                return f(value);
            }
        }
        format!("{}", value)
    }
}

impl std::fmt::Debug for AggregatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatorRegistry")
            .field("aggregators", &self.aggregators.keys().collect::<Vec<_>>())
            .field("formatters", &self.formatters.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// A value field: which source field is aggregated, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueField {
    /// Source field name.
    pub field: String,

    /// The aggregation function to apply.
    #[serde(default)]
    pub aggregation: Aggregation,

    /// Display name (e.g. "Sum of Sales"); falls back to the field name.
    #[serde(default)]
    pub name: Option<String>,

    /// Named display formatter registered on the `AggregatorRegistry`.
    #[serde(default)]
    pub formatter: Option<String>,
}

impl ValueField {
    pub fn new(field: &str, aggregation: Aggregation) -> Self {
        ValueField {
            field: field.to_string(),
            aggregation,
            name: None,
            formatter: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_formatter(mut self, formatter: &str) -> Self {
        self.formatter = Some(formatter.to_string());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.field)
    }
}

// ============================================================================
// MAIN CONFIG STRUCT
// ============================================================================

/// The complete, serializable pivot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    /// Fields that group rows, outer to inner (one tree level per field).
    pub row_group_fields: Vec<String>,

    /// Fields that cross-tabulate columns.
    pub column_group_fields: Vec<String>,

    /// Aggregated value fields.
    pub value_fields: Vec<ValueField>,

    /// Show per-group totals.
    pub show_totals: bool,

    /// Show the grand total row.
    pub show_grand_total: bool,

    /// Whether groups start expanded when no explicit expansion state exists.
    pub default_expanded: bool,

    /// Indentation per depth level, in pixels.
    pub indent_width: u32,
}

impl Default for PivotConfig {
    fn default() -> Self {
        PivotConfig {
            row_group_fields: Vec::new(),
            column_group_fields: Vec::new(),
            value_fields: Vec::new(),
            show_totals: true,
            show_grand_total: true,
            default_expanded: true,
            indent_width: 20,
        }
    }
}

/// Validates a pivot configuration, returning human-readable problems.
///
/// An empty result means the config is usable. The engine itself never
/// rejects input; callers are expected to validate first and fall back to
/// passing rows through unmodified when this returns errors.
pub fn validate_pivot_config(config: &PivotConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.row_group_fields.is_empty() && config.column_group_fields.is_empty() {
        errors.push(
            "pivot config has no row or column group fields; nothing to group by".to_string(),
        );
    }
    if config.value_fields.is_empty() {
        errors.push("pivot config has no value fields; nothing to aggregate".to_string());
    }
    for vf in &config.value_fields {
        if vf.field.is_empty() {
            errors.push("pivot value field has an empty field name".to_string());
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_json() {
        let config = PivotConfig {
            row_group_fields: vec!["region".to_string()],
            value_fields: vec![
                ValueField::new("sales", Aggregation::Sum).with_name("Sum of Sales")
            ],
            ..PivotConfig::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: PivotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.indent_width, 20);
        assert!(back.default_expanded);
    }

    #[test]
    fn validation_reports_missing_pieces() {
        let errors = validate_pivot_config(&PivotConfig::default());
        assert_eq!(errors.len(), 2);

        let ok = PivotConfig {
            row_group_fields: vec!["region".to_string()],
            value_fields: vec![ValueField::new("sales", Aggregation::Sum)],
            ..PivotConfig::default()
        };
        assert!(validate_pivot_config(&ok).is_empty());
    }

    #[test]
    fn registry_resolves_custom_names() {
        let mut registry = AggregatorRegistry::new();
        assert!(registry
            .resolve(&Aggregation::Custom("p95".to_string()))
            .is_err());
        assert!(registry.resolve(&Aggregation::Sum).is_ok());

        registry.register_aggregator("p95", |values| {
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            sorted[(sorted.len() * 95 / 100).min(sorted.len() - 1)]
        });
        assert!(registry
            .resolve(&Aggregation::Custom("p95".to_string()))
            .is_ok());
    }

    #[test]
    fn formatter_does_not_touch_the_numeric_value() {
        let mut registry = AggregatorRegistry::new();
        registry.register_formatter("usd", |v| format!("${:.2}", v));

        let vf = ValueField::new("sales", Aggregation::Sum).with_formatter("usd");
        assert_eq!(registry.format(&vf, 1234.5), "$1234.50");

        let plain = ValueField::new("sales", Aggregation::Sum);
        assert_eq!(registry.format(&plain, 1234.5), "1234.5");
    }
}
