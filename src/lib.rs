//! client-grid: an in-memory filter and sort engine for a list of clients.
//!
//! A `Grid` owns a `RecordStore` (the master list) and a `ViewProjector` (the active filters and
//! sort). Every successful edit, load or rule change recomputes the visible rows and hands them
//! to the grid's `ViewSink`.

pub mod args;
pub mod commands;
mod config;
mod error;
mod grid;
pub mod model;
mod render;
mod seed;
mod store;
mod utils;
mod view;

#[cfg(test)]
mod test;

pub use config::{default_path, Config};
pub use error::{Error, ErrorType, Result};
pub use grid::{Grid, Snapshot, ViewSink};
pub use render::{CellRenderer, OutputFormat, PrintSink, Rows, Table, DEFAULT_DATE_FORMAT};
pub use seed::{demo_records, DemoSeed, FileSeed, SeedSource};
pub use store::{DataChange, Listener, RecordStore};
pub use view::{Direction, FilterRule, Predicate, SortRule, ViewProjector};
