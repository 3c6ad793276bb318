//! In-memory inventory of scanned books

use indexmap::IndexMap;
use serde::Serialize;

use super::book::{BookRecord, Isbn};
use crate::error::AppResult;

/// What `update_book` did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Inserted,
    Incremented { count: u32 },
}

/// Records keyed by isbn. Insertion order is kept only so exports are stable.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Inventory {
    records: IndexMap<Isbn, BookRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a first-seen record, or bump the count of the existing one.
    ///
    /// On a repeat the stored record keeps its original fields and takes the
    /// incoming record's `date_modified`.
    pub fn update_book(&mut self, record: BookRecord) -> UpdateOutcome {
        match self.records.get_mut(&record.isbn) {
            Some(existing) => {
                existing.count += 1;
                existing.date_modified = record.date_modified;
                UpdateOutcome::Incremented { count: existing.count }
            }
            None => {
                self.records.insert(record.isbn.clone(), record);
                UpdateOutcome::Inserted
            }
        }
    }

    pub fn get(&self, isbn: &Isbn) -> Option<&BookRecord> {
        self.records.get(isbn)
    }

    pub fn remove(&mut self, isbn: &Isbn) -> Option<BookRecord> {
        self.records.shift_remove(isbn)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &BookRecord> {
        self.records.values()
    }

    /// Number of physical copies scanned
    pub fn total_count(&self) -> u64 {
        self.records.values().map(|r| u64::from(r.count)).sum()
    }

    /// Pretty JSON array of every record
    pub fn export_json(&self) -> AppResult<String> {
        let records: Vec<&BookRecord> = self.records.values().collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }
}

/// Value-style variant of [`Inventory::update_book`].
pub fn update_book(record: BookRecord, mut inventory: Inventory) -> Inventory {
    inventory.update_book(record);
    inventory
}
