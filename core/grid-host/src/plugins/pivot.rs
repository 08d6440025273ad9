//! FILENAME: core/grid-host/src/plugins/pivot.rs
//! PURPOSE: Pivot plugin - swaps the flat row/column set for a pivoted one.
//! CONTEXT: Each pipeline run rebuilds the pivot from scratch; expansion
//! state is long-lived plugin state keyed by row key, so it survives
//! rebuilds. Flattened nodes become synthetic rows whose cache key is the
//! pivot row key, which is what lets measured heights find regenerated
//! rows. An invalid config never breaks the pipeline: rows pass through
//! unmodified with a warning.

use std::any::Any;

use rustc_hash::FxHashSet;

use crate::plugin::{ColumnState, GridPlugin};
use grid_model::{Column, GridError, RowHandle, RowRecord, RowValue};
use pivot_engine::{
    build_pivot, collect_group_keys, flatten_pivot_rows, validate_pivot_config, value_key,
    Aggregation, AggregatorRegistry, FlatPivotRow, PivotConfig, PivotResult, ValueField,
    VALUE_COLUMN_KEY,
};

/// Cache key of the synthetic grand total row.
pub const GRAND_TOTAL_KEY: &str = "__grand_total__";

#[derive(Debug)]
pub struct PivotPlugin {
    config: PivotConfig,
    registry: AggregatorRegistry,

    /// Explicit expansion state; `None` until the first toggle, meaning
    /// `config.default_expanded` decides for every group.
    expanded: Option<FxHashSet<String>>,

    last_result: Option<PivotResult>,
}

impl PivotPlugin {
    /// Creates the plugin, checking that every configured aggregation and
    /// formatter resolves against the registry. This is the one-shot
    /// configuration check; nothing past this point fails.
    pub fn new(config: PivotConfig, registry: AggregatorRegistry) -> Result<Self, GridError> {
        for vf in &config.value_fields {
            registry.resolve(&vf.aggregation)?;
            if let Some(name) = &vf.formatter {
                registry.resolve_formatter(name)?;
            }
        }
        Ok(PivotPlugin {
            config,
            registry,
            expanded: None,
            last_result: None,
        })
    }

    pub fn config(&self) -> &PivotConfig {
        &self.config
    }

    /// The result of the latest pipeline run, if the config was valid.
    pub fn result(&self) -> Option<&PivotResult> {
        self.last_result.as_ref()
    }

    pub fn is_expanded(&self, row_key: &str) -> bool {
        match &self.expanded {
            Some(set) => set.contains(row_key),
            None => self.config.default_expanded,
        }
    }

    /// Flips one group's expansion. The first explicit toggle materializes
    /// the implicit default state so the other groups keep their behavior.
    pub fn toggle_expand(&mut self, row_key: &str) {
        let set = self.materialized_expanded();
        if !set.remove(row_key) {
            set.insert(row_key.to_string());
        }
    }

    pub fn expand_all(&mut self) {
        let keys: FxHashSet<String> = self
            .last_result
            .as_ref()
            .map(|r| collect_group_keys(&r.rows).into_iter().collect())
            .unwrap_or_default();
        self.expanded = Some(keys);
    }

    pub fn collapse_all(&mut self) {
        self.expanded = Some(FxHashSet::default());
    }

    fn materialized_expanded(&mut self) -> &mut FxHashSet<String> {
        if self.expanded.is_none() {
            let mut set = FxHashSet::default();
            if self.config.default_expanded {
                if let Some(result) = &self.last_result {
                    set.extend(collect_group_keys(&result.rows));
                }
            }
            self.expanded = Some(set);
        }
        self.expanded.as_mut().unwrap()
    }

    /// Cell value for one aggregate: formatted text when the value field
    /// carries a formatter, the raw number otherwise.
    fn cell_value(&self, key: &str, value: f64) -> RowValue {
        let vf = self
            .config
            .value_fields
            .iter()
            .find(|vf| key.ends_with(&format!("|{}", vf.field)));
        match vf {
            Some(vf) if vf.formatter.is_some() => {
                RowValue::Text(self.registry.format(vf, value))
            }
            _ => RowValue::Number(value),
        }
    }

    fn materialize_row(&self, flat: &FlatPivotRow) -> RowHandle {
        let mut record = RowRecord::new().with_cache_key(&flat.row_key);
        record
            .values
            .insert("label".to_string(), RowValue::Text(flat.row_label.clone()));
        record
            .values
            .insert("depth".to_string(), RowValue::Number(flat.depth as f64));
        for (key, value) in &flat.values {
            let cell = match value {
                Some(v) => self.cell_value(key, *v),
                None => RowValue::Empty,
            };
            record.values.insert(key.clone(), cell);
        }
        if self.config.show_totals {
            let total = flat.total.map(RowValue::Number).unwrap_or(RowValue::Empty);
            record.values.insert("total".to_string(), total);
        }
        RowHandle::new(record)
    }

    fn materialize_grand_total(&self, result: &PivotResult) -> RowHandle {
        let mut record = RowRecord::new().with_cache_key(GRAND_TOTAL_KEY);
        record.values.insert(
            "label".to_string(),
            RowValue::Text("Grand Total".to_string()),
        );
        record
            .values
            .insert("depth".to_string(), RowValue::Number(0.0));
        for (key, value) in &result.grand_totals {
            let cell = match value {
                Some(v) => self.cell_value(key, *v),
                None => RowValue::Empty,
            };
            record.values.insert(key.clone(), cell);
        }
        if self.config.show_totals {
            let total = result
                .grand_total
                .map(RowValue::Number)
                .unwrap_or(RowValue::Empty);
            record.values.insert("total".to_string(), total);
        }
        RowHandle::new(record)
    }
}

impl GridPlugin for PivotPlugin {
    fn name(&self) -> &str {
        "pivot"
    }

    fn process_rows(&mut self, rows: Vec<RowHandle>) -> Vec<RowHandle> {
        let errors = validate_pivot_config(&self.config);
        if !errors.is_empty() {
            log::warn!(
                "pivot: config invalid, passing rows through unmodified: {}",
                errors.join("; ")
            );
            self.last_result = None;
            return rows;
        }

        let result = build_pivot(&rows, &self.config, &self.registry);
        let flat = flatten_pivot_rows(
            &result.rows,
            self.expanded.as_ref(),
            self.config.default_expanded,
        );

        let mut out: Vec<RowHandle> = flat.iter().map(|f| self.materialize_row(f)).collect();
        if self.config.show_grand_total {
            out.push(self.materialize_grand_total(&result));
        }

        log::debug!(
            "pivot: rebuilt {} groups into {} visible rows",
            result.rows.len(),
            out.len()
        );
        self.last_result = Some(result);
        out
    }

    fn process_columns(&mut self, columns: Vec<Column>) -> Vec<Column> {
        // Runs after the row pass; without a result (invalid config) the
        // original columns pass through untouched.
        let Some(result) = &self.last_result else {
            return columns;
        };

        let mut out = vec![Column::new("label").with_header("Group").not_sortable()];
        for column_key in &result.column_keys {
            for vf in &self.config.value_fields {
                let field = value_key(column_key, &vf.field);
                let header = if column_key == VALUE_COLUMN_KEY {
                    vf.display_name().to_string()
                } else {
                    format!("{} / {}", column_key, vf.display_name())
                };
                out.push(Column::new(&field).with_header(&header).not_sortable());
            }
        }
        if self.config.show_totals {
            out.push(Column::new("total").with_header("Total").not_sortable());
        }
        out
    }

    fn column_state(&self, field: &str) -> Option<ColumnState> {
        let row_group = self.config.row_group_fields.iter().any(|f| f == field);
        let value_field = self.config.value_fields.iter().any(|vf| vf.field == field);
        if !row_group && !value_field {
            return None;
        }
        Some(ColumnState {
            row_group: row_group.then_some(true),
            value_field: value_field.then_some(true),
            ..ColumnState::default()
        })
    }

    fn apply_column_state(&mut self, field: &str, state: &ColumnState) {
        if let Some(is_group) = state.row_group {
            let present = self.config.row_group_fields.iter().any(|f| f == field);
            if is_group && !present {
                self.config.row_group_fields.push(field.to_string());
            } else if !is_group && present {
                self.config.row_group_fields.retain(|f| f != field);
            }
        }
        if let Some(is_value) = state.value_field {
            let present = self.config.value_fields.iter().any(|vf| vf.field == field);
            if is_value && !present {
                self.config
                    .value_fields
                    .push(ValueField::new(field, Aggregation::Sum));
            } else if !is_value && present {
                self.config.value_fields.retain(|vf| vf.field != field);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
