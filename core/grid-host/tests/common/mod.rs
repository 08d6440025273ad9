//! FILENAME: tests/common/mod.rs
//! Shared fixtures for the grid-host integration tests.

use grid_host::DataGrid;
use grid_model::{Column, RowRecord, RowValue};

/// A small sales data set with enough shape for grouping, sorting and
/// pivoting.
pub struct SalesFixture;

impl SalesFixture {
    pub fn columns() -> Vec<Column> {
        vec![
            Column::new("region").with_header("Region"),
            Column::new("product").with_header("Product"),
            Column::new("quarter").with_header("Quarter"),
            Column::new("sales").with_header("Sales"),
            Column::new("quantity").with_header("Quantity"),
        ]
    }

    pub fn rows() -> Vec<RowRecord> {
        [
            ("West", "Gadget", "Q1", 100.0, 10.0),
            ("East", "Widget", "Q1", 200.0, 5.0),
            ("West", "Widget", "Q2", 300.0, 20.0),
            ("East", "Gadget", "Q2", 400.0, 2.0),
            ("West", "Gadget", "Q1", 50.0, 1.0),
            ("East", "Widget", "Q2", 150.0, 3.0),
        ]
        .iter()
        .enumerate()
        .map(|(i, (region, product, quarter, sales, quantity))| {
            RowRecord::new()
                .with_row_id(&i.to_string())
                .with_value("region", RowValue::Text(region.to_string()))
                .with_value("product", RowValue::Text(product.to_string()))
                .with_value("quarter", RowValue::Text(quarter.to_string()))
                .with_value("sales", RowValue::Number(*sales))
                .with_value("quantity", RowValue::Number(*quantity))
        })
        .collect()
    }
}

/// Grid preloaded with the sales fixture and no plugins.
pub fn sales_grid() -> DataGrid {
    let mut grid = DataGrid::default();
    grid.set_columns(SalesFixture::columns()).unwrap();
    grid.set_rows(SalesFixture::rows());
    grid
}

/// The `sales` values of the grid's current pipeline output, in order.
pub fn sales_of(grid: &DataGrid) -> Vec<f64> {
    grid.rows()
        .iter()
        .map(|r| r.value("sales").coerce_number())
        .collect()
}
