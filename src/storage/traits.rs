//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ResourceRecord, SiteId, SiteRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store did not return a generated id for {0}")]
    MissingId(String),

    #[error("Site not found: {0}")]
    SiteNotFound(SiteId),

    #[error("Site {0} has already been finalized")]
    AlreadyFinalized(SiteId),

    #[error("Site {site_id} would end at {end} before it started at {start}")]
    InvalidTimeline {
        site_id: SiteId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The harvester holds one storage value for the whole run and is its only
/// user, so methods take `&mut self` for writes and no locking is required.
pub trait Storage {
    // ===== Site Lifecycle =====

    /// Creates a site record for a crawl that starts now
    ///
    /// The end timestamp, elapsed time, and total size stay null until
    /// [`Storage::finalize_site`] is called.
    ///
    /// # Returns
    ///
    /// The identifier generated by the store
    fn create_site(&mut self, host: &str) -> StorageResult<SiteId>;

    /// Records one successfully downloaded resource of a site
    ///
    /// # Arguments
    ///
    /// * `site_id` - The owning site
    /// * `url` - The resource URL
    /// * `elapsed_ms` - Wall-clock download time in milliseconds
    /// * `size_kb` - Downloaded size in kilobytes
    fn record_resource(
        &mut self,
        site_id: SiteId,
        url: &str,
        elapsed_ms: i64,
        size_kb: i64,
    ) -> StorageResult<i64>;

    /// Closes out a site record
    ///
    /// Sets the end timestamp, the elapsed time (`end - start`), and the total
    /// downloaded size. A site can be finalized only once, and `end` must not
    /// precede `start`.
    fn finalize_site(
        &mut self,
        site_id: SiteId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        total_size_kb: i64,
    ) -> StorageResult<()>;

    // ===== Queries =====

    /// Gets a site by ID
    fn get_site(&self, site_id: SiteId) -> StorageResult<SiteRecord>;

    /// Lists every site, oldest first
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Lists the resources recorded for a site, in insertion order
    fn list_resources(&self, site_id: SiteId) -> StorageResult<Vec<ResourceRecord>>;

    /// Counts the resources recorded for a site
    fn count_resources(&self, site_id: SiteId) -> StorageResult<u64>;
}
