//! FILENAME: core/pivot-engine/benches/pivot_calculations.rs
//! Criterion benchmarks for the pivot calculation engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use grid_model::{RowHandle, RowRecord, RowValue};
use pivot_engine::{
    build_pivot, flatten_pivot_rows, Aggregation, AggregatorRegistry, PivotConfig, ValueField,
};

const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
const PRODUCTS: [&str; 8] = [
    "Widget", "Gadget", "Sprocket", "Gear", "Lever", "Pulley", "Spring", "Bolt",
];
const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

fn synthetic_rows(count: usize) -> Vec<RowHandle> {
    (0..count)
        .map(|i| {
            RowHandle::new(
                RowRecord::new()
                    .with_row_id(&i.to_string())
                    .with_value("region", RowValue::Text(REGIONS[i % 4].to_string()))
                    .with_value("product", RowValue::Text(PRODUCTS[i % 8].to_string()))
                    .with_value("quarter", RowValue::Text(QUARTERS[(i / 3) % 4].to_string()))
                    .with_value("sales", RowValue::Number((i % 997) as f64 * 1.25))
                    .with_value("quantity", RowValue::Number((i % 13) as f64)),
            )
        })
        .collect()
}

fn two_level_config() -> PivotConfig {
    PivotConfig {
        row_group_fields: vec!["region".to_string(), "product".to_string()],
        column_group_fields: vec!["quarter".to_string()],
        value_fields: vec![
            ValueField::new("sales", Aggregation::Sum),
            ValueField::new("quantity", Aggregation::Avg),
        ],
        ..PivotConfig::default()
    }
}

fn bench_pivot_calculations(c: &mut Criterion) {
    let registry = AggregatorRegistry::new();
    let config = two_level_config();

    for &count in &[1_000usize, 10_000] {
        let rows = synthetic_rows(count);
        c.bench_function(&format!("build_pivot/{}_rows", count), |b| {
            b.iter(|| build_pivot(black_box(&rows), &config, &registry))
        });
    }

    let rows = synthetic_rows(10_000);
    let result = build_pivot(&rows, &config, &registry);
    c.bench_function("flatten_pivot_rows/10_000_rows", |b| {
        b.iter(|| flatten_pivot_rows(black_box(&result.rows), None, true))
    });
}

criterion_group!(benches, bench_pivot_calculations);
criterion_main!(benches);
