//! The grid: one record store, one projector and the collaborator that renders the result.

use crate::model::{Column, Field, RawRecord, Record};
use crate::store::{DataChange, RecordStore};
use crate::view::{FilterRule, SortRule, ViewProjector};
use crate::Result;
use tracing::trace;

/// Receives the visible rows every time they are recomputed.
pub trait ViewSink {
    fn view_changed(&mut self, rows: &[&Record]);
}

/// A `ViewSink` that keeps a copy of the latest visible rows.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    rows: Vec<Record>,
    refreshes: usize,
}

impl Snapshot {
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// How many times the view has been published.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }
}

impl ViewSink for Snapshot {
    fn view_changed(&mut self, rows: &[&Record]) {
        self.rows = rows.iter().map(|r| (*r).clone()).collect();
        self.refreshes += 1;
    }
}

/// A single grid view.
///
/// Every successful change to the data or to the rules recomputes the visible rows and publishes
/// them to the sink exactly once. A failed call changes nothing and publishes nothing.
#[derive(Debug)]
pub struct Grid<S: ViewSink> {
    store: RecordStore,
    projector: ViewProjector,
    sink: S,
}

impl<S: ViewSink> Grid<S> {
    pub fn new(sink: S) -> Self {
        Self {
            store: RecordStore::new(),
            projector: ViewProjector::new(),
            sink,
        }
    }

    /// Starts the grid with `sort` installed. Nothing is published until the first load.
    pub fn with_sort(mut self, sort: Option<SortRule>) -> Self {
        self.projector.set_sort(sort);
        self
    }

    /// Replaces the master list. See `RecordStore::load`.
    pub fn load(&mut self, records: impl IntoIterator<Item = RawRecord>) -> Result<DataChange> {
        let change = self.store.load(records)?;
        self.refresh();
        Ok(change)
    }

    /// Applies an inline edit. See `RecordStore::update`.
    pub fn commit_edit(&mut self, id: i64, field: Field, raw: &str) -> Result<DataChange> {
        let change = self.store.update(id, field, raw)?;
        self.refresh();
        Ok(change)
    }

    /// Installs or clears the rule for `column`. See `ViewProjector::set_filter`.
    pub fn set_filter(&mut self, column: Column, rule: Option<FilterRule>) -> Result<()> {
        self.projector.set_filter(column, rule)?;
        self.refresh();
        Ok(())
    }

    /// Installs or clears the rule for `column` from the raw text of its filter widget.
    pub fn filter_input(&mut self, column: Column, raw: &str) -> Result<()> {
        let rule = FilterRule::parse(column, raw)?;
        self.set_filter(column, rule)
    }

    pub fn set_sort(&mut self, sort: Option<SortRule>) {
        self.projector.set_sort(sort);
        self.refresh();
    }

    /// Drops every filter and the sort.
    pub fn clear_rules(&mut self) {
        self.projector.clear();
        self.refresh();
    }

    /// The rows that are currently visible.
    pub fn visible(&self) -> Vec<&Record> {
        self.projector.project(self.store.all())
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Registers a "data changed" listener on the store. The master list itself can only be
    /// changed through `load` and `commit_edit`, so every change is also published to the sink.
    pub fn subscribe(&mut self, listener: impl FnMut(&DataChange) + 'static) {
        self.store.subscribe(listener);
    }

    pub fn projector(&self) -> &ViewProjector {
        &self.projector
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Recomputes the visible rows and publishes them.
    pub fn refresh(&mut self) {
        let rows = self.projector.project(self.store.all());
        trace!("Publishing {} of {} rows", rows.len(), self.store.len());
        self.sink.view_changed(&rows);
    }
}
