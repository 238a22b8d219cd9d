//! Store trait and error types

use crate::store::{Candidate, ListingRecord, ReconcileResult};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Candidate has no reference")]
    MissingReference,

    #[error("Listing not found: {0}")]
    NotFound(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for listing store implementations
///
/// Reconciliation is the single write path for listing data. Implementations
/// are not safe for concurrent writers on the same reference; callers must
/// serialize reconciliations per reference.
pub trait ListingStore {
    /// Inserts a never-seen candidate or diffs it against the stored listing
    ///
    /// # Arguments
    ///
    /// * `candidate` - The merged summary+detail record
    /// * `tracked_fields` - Dedicated field names that produce change entries
    ///
    /// # Returns
    ///
    /// `ReconcileResult` with `created = true` and no changes for a first
    /// observation, or `created = false` and the tracked-field changes for a
    /// revisit.
    fn reconcile(
        &mut self,
        candidate: &Candidate,
        tracked_fields: &[String],
    ) -> StoreResult<ReconcileResult>;

    /// Gets a listing by its reference
    fn get_by_reference(&self, reference: &str) -> StoreResult<Option<ListingRecord>>;

    /// True when the reference has been observed before
    fn contains(&self, reference: &str) -> StoreResult<bool>;

    /// Bumps only `last_checked` for a known reference
    ///
    /// Used when a revisit could not produce a full candidate (detail fetch
    /// failed) but the listing was still observed to exist.
    fn touch_last_checked(&mut self, reference: &str) -> StoreResult<()>;

    /// Total number of stored listings
    fn count_total(&self) -> StoreResult<u64>;

    /// Listing counts grouped by source name
    fn count_by_source(&self) -> StoreResult<Vec<(String, u64)>>;
}
