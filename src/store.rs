//! The master list of client records.

use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::model::{Field, RawRecord, Record};
use crate::Result;
use anyhow::{bail, Context};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use tracing::{debug, trace};

/// Describes a successful change to the master list.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataChange {
    /// The master list was replaced with `count` records.
    Loaded { count: usize },
    /// A single field of the record with `id` was edited.
    Updated { id: i64, field: Field },
}

/// A "data changed" listener.
pub type Listener = Box<dyn FnMut(&DataChange)>;

/// Holds the master list of records and notifies listeners whenever it changes.
///
/// Filtering never touches this list; only `load` and `update` do.
#[derive(Default)]
pub struct RecordStore {
    records: Vec<Record>,
    listeners: Vec<Listener>,
}

impl Debug for RecordStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("records", &self.records)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the master list.
    ///
    /// Every record is validated before anything is replaced, so a failed load leaves the previous
    /// list in place.
    ///
    /// # Errors
    ///
    /// - `ErrorType::InvalidData` if a record is missing a field, holds a value that cannot be
    ///   parsed, or repeats an id.
    pub fn load(&mut self, records: impl IntoIterator<Item = RawRecord>) -> Result<DataChange> {
        let records = validate(records).pub_result(ErrorType::InvalidData)?;
        let change = DataChange::Loaded {
            count: records.len(),
        };
        debug!("Loaded {} client records", records.len());
        self.records = records;
        self.notify(&change);
        Ok(change)
    }

    /// Edits `field` of the record identified by `id`, coercing `value` to the field's type.
    ///
    /// # Errors
    ///
    /// - `ErrorType::NotFound` if no record has `id`.
    /// - `ErrorType::Validation` if `value` cannot be coerced. The record keeps its prior value.
    pub fn update(&mut self, id: i64, field: Field, value: &str) -> Result<DataChange> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::msg(ErrorType::NotFound, format!("Client not found: {id}")))?;
        record
            .set(field, value)
            .with_context(|| format!("Unable to set {field} of client {id}"))
            .pub_result(ErrorType::Validation)?;
        trace!("Set {field} of client {id} to '{value}'");
        let change = DataChange::Updated { id, field };
        self.notify(&change);
        Ok(change)
    }

    /// The current master list, in load order.
    pub fn all(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: i64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Registers a listener that is called after every successful `load` or `update`.
    pub fn subscribe(&mut self, listener: impl FnMut(&DataChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, change: &DataChange) {
        for listener in self.listeners.iter_mut() {
            listener(change);
        }
    }
}

fn validate(records: impl IntoIterator<Item = RawRecord>) -> Res<Vec<Record>> {
    let mut ids = HashSet::new();
    let mut validated = Vec::new();
    for (ix, raw) in records.into_iter().enumerate() {
        let record = Record::try_from(raw)
            .with_context(|| format!("Invalid client record at position {}", ix + 1))?;
        if !ids.insert(record.id) {
            bail!(
                "Invalid client record at position {}: the id {} is used more than once",
                ix + 1,
                record.id
            );
        }
        validated.push(record);
    }
    Ok(validated)
}
