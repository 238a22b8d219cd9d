//! Database schema definitions
//!
//! This module contains the SQL schema for the homewatch database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Persisted listings, keyed by their canonical reference URL
CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reference TEXT NOT NULL UNIQUE,
    source_name TEXT NOT NULL,
    title TEXT,
    price TEXT,
    description TEXT,
    image_count INTEGER,
    primary_image_url TEXT,
    full_record TEXT NOT NULL,
    first_seen TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    last_checked TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_reference ON listings(reference);
CREATE INDEX IF NOT EXISTS idx_listings_source_name ON listings(source_name);
"#;

/// Initializes the database schema
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
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_reference_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let insert = "INSERT INTO listings
            (reference, source_name, full_record, first_seen, last_updated, last_checked)
            VALUES ('https://example.com/1', 'Example', '{}', 't', 't', 't')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
