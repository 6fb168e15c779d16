//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::config::StoreConfig;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ResourceRecord, SiteId, SiteRecord};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

const IN_MEMORY: &str = ":memory:";
const SQLITE_PREFIX: &str = "sqlite://";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the store described by a connection configuration
    ///
    /// The connection string is a file path, a `sqlite://<path>` URI, or
    /// `:memory:`. SQLite has no accounts, so the username is only logged and
    /// the password is ignored.
    pub fn connect(config: &StoreConfig) -> StorageResult<Self> {
        tracing::debug!(
            "Connecting to store {} as {}",
            config.connection_string,
            config.username
        );

        match resolve_connection_string(&config.connection_string) {
            None => Self::new_in_memory(),
            Some(path) => Self::new(&path),
        }
    }

    /// Opens or creates a database file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // WAL keeps readers (--stats) from blocking a running harvest
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn site_exists(&self, site_id: SiteId) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM website WHERE id = ?1",
                params![site_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

/// Maps a connection string to a database file path, or `None` for memory
fn resolve_connection_string(connection_string: &str) -> Option<PathBuf> {
    let trimmed = connection_string.trim();
    // Accept both bare paths and sqlite:// URIs
    let path = trimmed.strip_prefix(SQLITE_PREFIX).unwrap_or(trimmed);

    if path == IN_MEMORY {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    let started_at: String = row.get(2)?;
    let finished_at: Option<String> = row.get(3)?;

    Ok(SiteRecord {
        id: row.get(0)?,
        host: row.get(1)?,
        started_at: parse_timestamp(2, &started_at)?,
        finished_at: finished_at
            .as_deref()
            .map(|value| parse_timestamp(3, value))
            .transpose()?,
        elapsed_ms: row.get(4)?,
        total_size_kb: row.get(5)?,
    })
}

const SITE_COLUMNS: &str = "id, website_name, download_start_date_time, download_end_date_time,
     total_elapsed_time, total_downloaded_kilobytes";

impl Storage for SqliteStorage {
    // ===== Site Lifecycle =====

    fn create_site(&mut self, host: &str) -> StorageResult<SiteId> {
        // Start timestamp is taken here; callers read it back with get_site
        let now = Utc::now().to_rfc3339();
        let id: Option<SiteId> = self
            .conn
            .query_row(
                "INSERT INTO website (website_name, download_start_date_time) VALUES (?1, ?2)
                 RETURNING id",
                params![host, now],
                |row| row.get(0),
            )
            .optional()?;

        id.ok_or_else(|| StorageError::MissingId(format!("website '{}'", host)))
    }

    fn record_resource(
        &mut self,
        site_id: SiteId,
        url: &str,
        elapsed_ms: i64,
        size_kb: i64,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO link (link_name, website_id, total_elapsed_time, total_downloaded_kilobytes)
             VALUES (?1, ?2, ?3, ?4)",
            params![url, site_id, elapsed_ms, size_kb],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finalize_site(
        &mut self,
        site_id: SiteId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        total_size_kb: i64,
    ) -> StorageResult<()> {
        // Check the timeline before touching the row
        if end < start {
            return Err(StorageError::InvalidTimeline {
                site_id,
                start,
                end,
            });
        }

        // Only an unfinalized row matches, so a second call updates nothing
        let elapsed_ms = (end - start).num_milliseconds();
        let updated = self.conn.execute(
            "UPDATE website SET download_end_date_time = ?1, total_elapsed_time = ?2,
             total_downloaded_kilobytes = ?3
             WHERE id = ?4 AND download_end_date_time IS NULL",
            params![end.to_rfc3339(), elapsed_ms, total_size_kb, site_id],
        )?;

        // Tell a repeat finalize apart from an unknown id
        if updated == 0 {
            if self.site_exists(site_id)? {
                return Err(StorageError::AlreadyFinalized(site_id));
            }
            return Err(StorageError::SiteNotFound(site_id));
        }

        Ok(())
    }

    // ===== Queries =====

    fn get_site(&self, site_id: SiteId) -> StorageResult<SiteRecord> {
        let sql = format!("SELECT {} FROM website WHERE id = ?1", SITE_COLUMNS);
        self.conn
            .query_row(&sql, params![site_id], site_from_row)
            .optional()?
            .ok_or(StorageError::SiteNotFound(site_id))
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let sql = format!("SELECT {} FROM website ORDER BY id ASC", SITE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sites)
    }

    fn list_resources(&self, site_id: SiteId) -> StorageResult<Vec<ResourceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, website_id, link_name, total_elapsed_time, total_downloaded_kilobytes
             FROM link WHERE website_id = ?1 ORDER BY id ASC",
        )?;

        let resources = stmt
            .query_map(params![site_id], |row| {
                Ok(ResourceRecord {
                    id: row.get(0)?,
                    site_id: row.get(1)?,
                    url: row.get(2)?,
                    elapsed_ms: row.get(3)?,
                    size_kb: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(resources)
    }

    fn count_resources(&self, site_id: SiteId) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM link WHERE website_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
