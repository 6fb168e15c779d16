//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Site-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawl run against a host
CREATE TABLE IF NOT EXISTS website (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    website_name TEXT NOT NULL,
    download_start_date_time TEXT NOT NULL,
    download_end_date_time TEXT,
    total_elapsed_time INTEGER,
    total_downloaded_kilobytes INTEGER
);

CREATE INDEX IF NOT EXISTS idx_website_name ON website(website_name);

-- One row per successfully downloaded resource
CREATE TABLE IF NOT EXISTS link (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link_name TEXT NOT NULL,
    website_id INTEGER NOT NULL REFERENCES website(id),
    total_elapsed_time INTEGER NOT NULL,
    total_downloaded_kilobytes INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_link_website ON link(website_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["website", "link"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_link_requires_existing_website() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        initialize_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO link (link_name, website_id, total_elapsed_time, total_downloaded_kilobytes)
             VALUES ('https://example.com/a', 999, 1, 1)",
            [],
        );
        assert!(result.is_err());
    }
}
