//! FILENAME: core/position-cache/src/height.rs
//! PURPOSE: Measured row heights keyed by row identity.
//! CONTEXT: Persists across sort/filter/pivot re-runs so a row keeps its
//! measured height after the list is reshuffled. Entries are never evicted
//! except on full grid teardown.

use rustc_hash::FxHashMap;

use grid_model::{resolve_row_identity, RowHandle, RowIdentity};

/// Measured heights, split across two maps matching the identity tiers:
/// string-keyed rows (synthetic cache keys and `"id:"`-prefixed natural
/// ids) and plain rows tracked by allocation address.
#[derive(Debug, Clone, Default)]
pub struct HeightCache {
    by_key: FxHashMap<String, f64>,
    by_ref: FxHashMap<usize, f64>,
}

impl HeightCache {
    pub fn new() -> Self {
        HeightCache::default()
    }

    /// Looks up the measured height for `row`, if any.
    pub fn get(&self, row: &RowHandle) -> Option<f64> {
        match resolve_row_identity(row) {
            RowIdentity::Key(key) => self.by_key.get(&key).copied(),
            RowIdentity::Ref(addr) => self.by_ref.get(&addr).copied(),
        }
    }

    /// Stores a measured height, unconditionally overwriting any prior value.
    pub fn set(&mut self, row: &RowHandle, height: f64) {
        match resolve_row_identity(row) {
            RowIdentity::Key(key) => {
                self.by_key.insert(key, height);
            }
            RowIdentity::Ref(addr) => {
                self.by_ref.insert(addr, height);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len() + self.by_ref.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty() && self.by_ref.is_empty()
    }

    /// Drops every entry. Grid teardown only; the cache never shrinks on
    /// its own.
    pub fn clear(&mut self) {
        self.by_key.clear();
        self.by_ref.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_model::{RowRecord, RowValue};

    #[test]
    fn heights_survive_identity_tiers() {
        let mut cache = HeightCache::new();

        let keyed = RowHandle::new(RowRecord::new().with_cache_key("A|West"));
        let natural = RowHandle::new(RowRecord::new().with_row_id("7"));
        let plain = RowHandle::new(
            RowRecord::new().with_value("x", RowValue::Number(1.0)),
        );

        cache.set(&keyed, 40.0);
        cache.set(&natural, 32.0);
        cache.set(&plain, 28.0);

        assert_eq!(cache.get(&keyed), Some(40.0));
        assert_eq!(cache.get(&natural), Some(32.0));
        assert_eq!(cache.get(&plain), Some(28.0));
        assert_eq!(cache.len(), 3);

        // A recreated synthetic row with the same cache key finds the
        // height measured for its predecessor.
        let recreated = RowHandle::new(RowRecord::new().with_cache_key("A|West"));
        assert_eq!(cache.get(&recreated), Some(40.0));
    }

    #[test]
    fn natural_ids_do_not_collide_with_cache_keys() {
        let mut cache = HeightCache::new();

        let natural = RowHandle::new(RowRecord::new().with_row_id("A|West"));
        let synthetic = RowHandle::new(RowRecord::new().with_cache_key("A|West"));

        cache.set(&natural, 30.0);
        assert_eq!(cache.get(&synthetic), None);
    }

    #[test]
    fn overwrites_unconditionally() {
        let mut cache = HeightCache::new();
        let row = RowHandle::new(RowRecord::new().with_row_id("1"));
        cache.set(&row, 28.0);
        cache.set(&row, 55.0);
        assert_eq!(cache.get(&row), Some(55.0));
        assert_eq!(cache.len(), 1);
    }
}
