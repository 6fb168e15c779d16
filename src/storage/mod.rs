//! Storage module for persisting harvest metadata
//!
//! This module handles all database operations for the harvester:
//! - SQLite database initialization and schema management
//! - Site records (one per crawl run, finalized once at the end)
//! - Resource records (one per successfully downloaded link)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::StoreConfig;
use chrono::{DateTime, Utc};

/// Identifier the store assigns to a site record
pub type SiteId = i64;

/// Opens the store named by the configuration
pub fn open_storage(config: &StoreConfig) -> StorageResult<SqliteStorage> {
    SqliteStorage::connect(config)
}

/// Represents one crawl run against one host
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    pub id: SiteId,
    pub host: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub elapsed_ms: Option<i64>,
    pub total_size_kb: Option<i64>,
}

impl SiteRecord {
    /// Returns true once the end-of-crawl fields have been written
    pub fn is_finalized(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Represents one successfully downloaded resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub id: i64,
    pub site_id: SiteId,
    pub url: String,
    pub elapsed_ms: i64,
    pub size_kb: i64,
}
