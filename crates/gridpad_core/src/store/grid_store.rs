//! Grid persistence component.
//!
//! # Responsibility
//! - Load the grid snapshot at startup, falling back to an empty grid.
//! - Apply single-cell edits and mirror the result into the key-value store.
//!
//! # Invariants
//! - `load` never fails; every failure is logged and replaced by an empty grid.
//! - Every successful edit through `apply_edit` is followed by a full persist.
//! - A failed persist never rolls back the in-memory edit.
//! - Cell contents are never written to logs.

use crate::config::DEFAULT_STORAGE_KEY;
use crate::model::grid::{Grid, GridDimensions, GridError, GridResult};
use crate::store::kv_store::{KeyValueStore, StoreResult};
use log::{debug, error, info, warn};
use std::time::Instant;

/// Keeps the in-memory grid and its persisted snapshot convergent.
pub struct GridStore<S: KeyValueStore> {
    store: S,
    key: String,
    dimensions: GridDimensions,
}

impl<S: KeyValueStore> GridStore<S> {
    pub fn new(store: S, key: impl Into<String>, dimensions: GridDimensions) -> Self {
        Self {
            store,
            key: key.into(),
            dimensions,
        }
    }

    /// Uses the app's fixed key and 10x5 shape.
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, DEFAULT_STORAGE_KEY, GridDimensions::DEFAULT)
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the persisted grid, or an all-empty grid when none is usable.
    ///
    /// Absent, unreadable, undecodable and wrong-shaped snapshots all fall back.
    pub fn load(&self) -> Grid {
        match self.try_load() {
            Ok(Some(grid)) => {
                info!(
                    "event=grid_load module=store status=ok dimensions={}",
                    self.dimensions
                );
                grid
            }
            Ok(None) => {
                info!(
                    "event=grid_load module=store status=empty dimensions={}",
                    self.dimensions
                );
                Grid::empty(self.dimensions)
            }
            Err(err) => {
                warn!(
                    "event=grid_load module=store status=fallback dimensions={} error={}",
                    self.dimensions, err
                );
                Grid::empty(self.dimensions)
            }
        }
    }

    /// Strict variant of [`GridStore::load`] that reports why a snapshot is unusable.
    pub fn try_load(&self) -> StoreResult<Option<Grid>> {
        match self.store.get(&self.key)? {
            Some(json) => Ok(Some(Grid::from_json(&json, self.dimensions)?)),
            None => Ok(None),
        }
    }

    /// Returns `grid` with one cell replaced. Does not persist.
    pub fn set_cell(
        &self,
        grid: &Grid,
        row: usize,
        col: usize,
        value: impl Into<String>,
    ) -> GridResult<Grid> {
        grid.with_cell(row, col, value)
    }

    /// Writes the full snapshot under the fixed key, replacing any prior value.
    pub fn persist(&self, grid: &Grid) -> StoreResult<()> {
        let started_at = Instant::now();
        if grid.dimensions() != self.dimensions {
            return Err(GridError::ShapeMismatch {
                expected: self.dimensions,
                details: format!("grid is {}", grid.dimensions()),
            }
            .into());
        }

        let result = grid
            .to_json()
            .map_err(Into::into)
            .and_then(|json| self.store.set(&self.key, &json).map(|()| json.len()));

        match result {
            Ok(bytes) => {
                debug!(
                    "event=grid_persist module=store status=ok bytes={} duration_ms={}",
                    bytes,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=grid_persist module=store status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Applies one edit and immediately persists the result (write-through).
    ///
    /// Only out-of-range edits fail; a persist failure is logged and the
    /// edited grid is still returned.
    pub fn apply_edit(
        &self,
        grid: &Grid,
        row: usize,
        col: usize,
        value: impl Into<String>,
    ) -> GridResult<Grid> {
        let edited = self.set_cell(grid, row, col, value)?;
        // Failure already logged by `persist`; in-memory state stays ahead.
        let _ = self.persist(&edited);
        Ok(edited)
    }
}

#[cfg(test)]
mod tests {
    use super::GridStore;
    use crate::model::grid::{Grid, GridDimensions};
    use crate::store::kv_store::{KeyValueStore, SqliteKeyValueStore, StoreError, StoreResult};
    use std::cell::RefCell;

    /// Store whose reads return a fixed payload and whose writes always fail.
    struct BrokenStore {
        payload: Option<String>,
        writes: RefCell<usize>,
    }

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(self.payload.clone())
        }

        fn set(&self, key: &str, _value: &str) -> StoreResult<()> {
            *self.writes.borrow_mut() += 1;
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }

    #[test]
    fn load_from_empty_store_returns_blank_grid() {
        let store = GridStore::with_defaults(SqliteKeyValueStore::open_in_memory().unwrap());
        let grid = store.load();
        assert_eq!(grid.dimensions(), GridDimensions::new(10, 5));
        assert!(grid.is_blank());
    }

    #[test]
    fn load_falls_back_on_corrupt_payload() {
        for payload in ["not json", "[[\"a\"]]", "{}", "null"] {
            let store = GridStore::with_defaults(BrokenStore {
                payload: Some(payload.to_string()),
                writes: RefCell::new(0),
            });
            assert!(store.try_load().is_err(), "{payload}");
            assert_eq!(store.load(), Grid::empty(GridDimensions::DEFAULT));
        }
    }

    #[test]
    fn apply_edit_keeps_edit_when_persist_fails() {
        let store = GridStore::with_defaults(BrokenStore {
            payload: None,
            writes: RefCell::new(0),
        });
        let grid = store.load();
        let edited = store.apply_edit(&grid, 0, 0, "kept").unwrap();
        assert_eq!(edited.cell(0, 0).unwrap(), "kept");
        assert_eq!(*store.store().writes.borrow(), 1);
    }

    #[test]
    fn persist_rejects_grid_of_other_shape() {
        let store = GridStore::with_defaults(SqliteKeyValueStore::open_in_memory().unwrap());
        let err = store
            .persist(&Grid::empty(GridDimensions::new(2, 2)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Snapshot(_)));
        assert_eq!(store.store().get("gridData").unwrap(), None);
    }

    #[test]
    fn out_of_range_edit_does_not_persist() {
        let store = GridStore::with_defaults(SqliteKeyValueStore::open_in_memory().unwrap());
        let grid = store.load();
        assert!(store.apply_edit(&grid, 0, 5, "x").is_err());
        assert_eq!(store.store().get("gridData").unwrap(), None);
    }
}
