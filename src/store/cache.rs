//! Local durable cache for custom entries.
//!
//! One row per `(domain, user_id)` key holding the full serialized entry
//! list for that user. Used whenever the remote store is unreachable, so
//! the picker keeps working offline with whatever was last written locally.

use rusqlite::{params, Connection, Result};
use std::path::Path;
use std::sync::Mutex;

use super::CustomEntry;

pub struct CacheDb {
    conn: Mutex<Connection>,
}

impl CacheDb {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(&path)?;
        let db = CacheDb { conn: Mutex::new(conn) };
        db.init()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = CacheDb { conn: Mutex::new(conn) };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS custom_entry_cache (
                cache_key TEXT PRIMARY KEY,   -- '{domain}:{user_id}'
                entries TEXT NOT NULL,        -- JSON list of CustomEntry
                updated_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Read the cached entry list for a key. Missing row, unreadable row
    /// and unparsable JSON all degrade to an empty list; corruption is
    /// logged and never surfaced to the caller.
    pub fn read(&self, key: &str) -> Vec<CustomEntry> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = match conn.query_row(
            "SELECT entries FROM custom_entry_cache WHERE cache_key = ?1",
            params![key],
            |row| row.get(0),
        ) {
            Ok(json) => Some(json),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                eprintln!("Cache read failed for {}: {}", key, e);
                None
            }
        };

        match raw {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                eprintln!("Corrupt cache entry for {}, treating as empty: {}", key, e);
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    /// Replace the whole entry list for a key in a single statement, so a
    /// concurrent read in this process sees either the old list or the new
    /// one, never a partial write.
    pub fn write(&self, key: &str, entries: &[CustomEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO custom_entry_cache (cache_key, entries, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, json, now],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user: &str, name: &str, group: &str) -> CustomEntry {
        CustomEntry::new(user, name, group)
    }

    #[test]
    fn test_read_missing_key_is_empty() {
        let db = CacheDb::in_memory().unwrap();
        assert!(db.read("organizations:u1").is_empty());
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let db = CacheDb::in_memory().unwrap();
        let entries = vec![entry("u1", "Acme2", "Technology")];
        db.write("organizations:u1", &entries).unwrap();
        assert_eq!(db.read("organizations:u1"), entries);
        // Other keys unaffected
        assert!(db.read("locations:u1").is_empty());
        assert!(db.read("organizations:u2").is_empty());
    }

    #[test]
    fn test_rewrite_replaces_whole_list() {
        let db = CacheDb::in_memory().unwrap();
        db.write("locations:u1", &[entry("u1", "Atlantis", "Custom")]).unwrap();
        let second = vec![entry("u1", "Atlantis", "Europe"), entry("u1", "Wakanda", "Custom")];
        db.write("locations:u1", &second).unwrap();
        assert_eq!(db.read("locations:u1"), second);
    }

    #[test]
    fn test_corrupt_row_reads_as_empty() {
        let db = CacheDb::in_memory().unwrap();
        db.write("organizations:u1", &[entry("u1", "Acme2", "Custom")]).unwrap();
        {
            let conn = db.conn.lock().unwrap();
            conn.execute(
                "UPDATE custom_entry_cache SET entries = ?1 WHERE cache_key = ?2",
                params!["{not json", "organizations:u1"],
            )
            .unwrap();
        }
        assert!(db.read("organizations:u1").is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        {
            let db = CacheDb::new(&path).unwrap();
            db.write("organizations:u1", &[entry("u1", "Acme2", "Custom")]).unwrap();
        }
        let db = CacheDb::new(&path).unwrap();
        assert_eq!(db.read("organizations:u1").len(), 1);
    }
}
