//! Listing store: insert-or-update-and-diff persistence
//!
//! This module persists listings keyed by their unique reference and, on
//! every revisit, computes which dedicated fields changed since the last
//! observation. Reconciliation is the single write path: callers hand it a
//! merged candidate record and receive back whether the listing was created
//! and which tracked fields changed.

pub mod diff;
mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStore;
pub use traits::{ListingStore, StoreError, StoreResult};

use crate::extract::FieldMap;

/// A merged summary+detail record ready for reconciliation
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Unique, stable identity of the listing (canonical URL)
    pub reference: String,

    /// Which source produced this candidate
    pub source_name: String,

    /// The full merged field map, stored verbatim as `full_record`
    pub fields: FieldMap,
}

impl Candidate {
    /// Looks up a dedicated field in the merged map
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }
}

/// A listing as persisted in the store
#[derive(Debug, Clone)]
pub struct ListingRecord {
    pub id: i64,
    pub reference: String,
    pub source_name: String,
    pub title: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image_count: Option<i64>,
    pub primary_image_url: Option<String>,
    /// JSON serialization of the full merged map at last reconciliation
    pub full_record: String,
    pub first_seen: String,
    pub last_updated: String,
    pub last_checked: String,
}

impl ListingRecord {
    /// Returns the stored value of a dedicated field as a raw string,
    /// or None when the column is NULL
    pub fn dedicated_field(&self, name: &str) -> Option<String> {
        match name {
            "title" => self.title.clone(),
            "price" => self.price.clone(),
            "description" => self.description.clone(),
            "image_count" => self.image_count.map(|n| n.to_string()),
            "primary_image_url" => self.primary_image_url.clone(),
            _ => None,
        }
    }
}

/// One observed change to a tracked field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// Outcome of reconciling one candidate against the store
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    /// True when the reference had never been seen before
    pub created: bool,

    /// Tracked-field changes, in tracked-field configuration order;
    /// always empty when `created` is true
    pub changes: Vec<ChangeEntry>,
}
