//! SQLite store implementation
//!
//! This module provides the SQLite-based implementation of the ListingStore
//! trait.

use crate::store::diff::{display_value, stringify, values_differ, DEDICATED_FIELDS};
use crate::store::schema::initialize_schema;
use crate::store::traits::{ListingStore, StoreError, StoreResult};
use crate::store::{Candidate, ChangeEntry, ListingRecord, ReconcileResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::path::Path;

/// SQLite storage backend for listings
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the listings database at the given path
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ListingRecord> {
        Ok(ListingRecord {
            id: row.get(0)?,
            reference: row.get(1)?,
            source_name: row.get(2)?,
            title: row.get(3)?,
            price: row.get(4)?,
            description: row.get(5)?,
            image_count: row.get(6)?,
            primary_image_url: row.get(7)?,
            full_record: row.get(8)?,
            first_seen: row.get(9)?,
            last_updated: row.get(10)?,
            last_checked: row.get(11)?,
        })
    }

    /// Resolves the stored text for a dedicated column after this
    /// reconciliation: the candidate's value when present, else the
    /// previously stored value
    fn next_text(candidate: &Candidate, existing: Option<&ListingRecord>, field: &str) -> Option<String> {
        match candidate.field(field) {
            Some(value) => {
                let s = stringify(value);
                if s.is_empty() {
                    None
                } else {
                    Some(s)
                }
            }
            None => existing.and_then(|e| e.dedicated_field(field)),
        }
    }

    fn next_count(candidate: &Candidate, existing: Option<&ListingRecord>) -> Option<i64> {
        match candidate.field("image_count") {
            Some(value) => value_as_count(value),
            None => existing.and_then(|e| e.image_count),
        }
    }
}

/// Parses an image count from a scraped value (number or numeric string)
fn value_as_count(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| stringify(value).parse::<i64>().ok())
}

impl ListingStore for SqliteStore {
    fn reconcile(
        &mut self,
        candidate: &Candidate,
        tracked_fields: &[String],
    ) -> StoreResult<ReconcileResult> {
        if candidate.reference.is_empty() {
            return Err(StoreError::MissingReference);
        }

        let full_record = serde_json::to_string(&candidate.fields)?;
        let now = Utc::now().to_rfc3339();

        let existing = self.get_by_reference(&candidate.reference)?;

        let Some(existing) = existing else {
            self.conn.execute(
                "INSERT INTO listings
                 (reference, source_name, title, price, description, image_count,
                  primary_image_url, full_record, first_seen, last_updated, last_checked)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?9)",
                params![
                    candidate.reference,
                    candidate.source_name,
                    Self::next_text(candidate, None, "title"),
                    Self::next_text(candidate, None, "price"),
                    Self::next_text(candidate, None, "description"),
                    Self::next_count(candidate, None),
                    Self::next_text(candidate, None, "primary_image_url"),
                    full_record,
                    now,
                ],
            )?;

            return Ok(ReconcileResult {
                created: true,
                changes: Vec::new(),
            });
        };

        // Collect every dedicated field whose value differs. Fields absent
        // from the candidate keep their stored value and never diff.
        let mut update_set: Vec<(&str, String, String)> = Vec::new();
        for field in DEDICATED_FIELDS {
            let Some(value) = candidate.field(field) else {
                continue;
            };
            let new_value = stringify(value);
            let old_value = existing.dedicated_field(field).unwrap_or_default();
            if values_differ(&old_value, &new_value) {
                update_set.push((field, old_value, new_value));
            }
        }

        // Only tracked fields surface as change entries, in tracked order
        let changes: Vec<ChangeEntry> = tracked_fields
            .iter()
            .filter_map(|tracked| {
                update_set
                    .iter()
                    .find(|(field, _, _)| *field == tracked.as_str())
                    .map(|(field, old, new)| ChangeEntry {
                        field: field.to_string(),
                        old_value: display_value(old),
                        new_value: display_value(new),
                    })
            })
            .collect();

        // full_record is always rewritten; last_updated moves only when
        // something actually changed
        let record_changed = !update_set.is_empty() || full_record != existing.full_record;
        let last_updated = if record_changed {
            now.clone()
        } else {
            existing.last_updated.clone()
        };

        self.conn.execute(
            "UPDATE listings SET
                title = ?1, price = ?2, description = ?3, image_count = ?4,
                primary_image_url = ?5, full_record = ?6, last_updated = ?7,
                last_checked = ?8
             WHERE reference = ?9",
            params![
                Self::next_text(candidate, Some(&existing), "title"),
                Self::next_text(candidate, Some(&existing), "price"),
                Self::next_text(candidate, Some(&existing), "description"),
                Self::next_count(candidate, Some(&existing)),
                Self::next_text(candidate, Some(&existing), "primary_image_url"),
                full_record,
                last_updated,
                now,
                candidate.reference,
            ],
        )?;

        Ok(ReconcileResult {
            created: false,
            changes,
        })
    }

    fn get_by_reference(&self, reference: &str) -> StoreResult<Option<ListingRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, reference, source_name, title, price, description, image_count,
             primary_image_url, full_record, first_seen, last_updated, last_checked
             FROM listings WHERE reference = ?1",
        )?;

        let record = stmt
            .query_row(params![reference], Self::row_to_record)
            .optional()?;

        Ok(record)
    }

    fn contains(&self, reference: &str) -> StoreResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM listings WHERE reference = ?1",
            params![reference],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn touch_last_checked(&mut self, reference: &str) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE listings SET last_checked = ?1 WHERE reference = ?2",
            params![now, reference],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(reference.to_string()));
        }

        Ok(())
    }

    fn count_total(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_source(&self) -> StoreResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_name, COUNT(*) as count FROM listings
             GROUP BY source_name ORDER BY count DESC",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
