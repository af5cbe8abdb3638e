//! Shared test utilities.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::grid::{Grid, Snapshot};
use crate::model::Record;
use crate::seed::demo_records;
use crate::store::RecordStore;

/// A store loaded with the nine demo clients.
pub fn demo_store() -> RecordStore {
    let mut store = RecordStore::new();
    store.load(demo_records()).unwrap();
    store
}

/// A grid loaded with the demo clients that records what it publishes.
pub fn demo_grid() -> Grid<Snapshot> {
    let mut grid = Grid::new(Snapshot::default());
    grid.load(demo_records()).unwrap();
    grid
}

/// The ids of `rows`, in order.
pub fn ids(rows: &[&Record]) -> Vec<i64> {
    rows.iter().map(|r| r.id()).collect()
}
