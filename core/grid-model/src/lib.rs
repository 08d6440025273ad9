//! FILENAME: core/grid-model/src/lib.rs
//! PURPOSE: Main library entry point for the shared grid data model.
//! CONTEXT: Re-exports the value, row, column and error types consumed by
//! every other crate in the workspace. This crate has no knowledge of
//! sorting, pivoting or rendering; it only defines what the data IS.

pub mod column;
pub mod error;
pub mod row;
pub mod value;

// Re-export commonly used types at the crate root
pub use column::{Column, ColumnGroupSpec, ColumnWidth, SortComparator};
pub use error::GridError;
pub use row::{resolve_row_identity, RowHandle, RowIdentity, RowRecord};
pub use value::RowValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_builds_rows() {
        let row = RowRecord::new()
            .with_value("name", RowValue::Text("Widget".to_string()))
            .with_value("price", RowValue::Number(9.5));

        assert_eq!(row.value("price"), &RowValue::Number(9.5));
        assert_eq!(row.value("missing"), &RowValue::Empty);
    }

    #[test]
    fn it_resolves_identity_tiers() {
        let by_ref = RowHandle::new(RowRecord::new());
        let by_id = RowHandle::new(RowRecord::new().with_row_id("42"));
        let synthetic = RowHandle::new(RowRecord::new().with_cache_key("A|B"));

        assert!(matches!(resolve_row_identity(&by_ref), RowIdentity::Ref(_)));
        assert_eq!(
            resolve_row_identity(&by_id),
            RowIdentity::Key("id:42".to_string())
        );
        // The synthetic cache key wins even when a row id is also present.
        let both = RowHandle::new(
            RowRecord::new().with_row_id("42").with_cache_key("A|B"),
        );
        assert_eq!(
            resolve_row_identity(&synthetic),
            RowIdentity::Key("A|B".to_string())
        );
        assert_eq!(
            resolve_row_identity(&both),
            RowIdentity::Key("A|B".to_string())
        );
    }

    #[test]
    fn it_serializes_columns_without_comparators() {
        let col = Column::new("amount").with_header("Amount");
        let json = serde_json::to_string(&col).unwrap();
        let back: Column = serde_json::from_str(&json).unwrap();
        assert_eq!(back.field, "amount");
        assert!(back.sort_comparator.is_none());
    }
}
