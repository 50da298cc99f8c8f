//! SQLite-backed preference store.
//!
//! Holds one key today (`theme`). Writes are synchronous and committed
//! before returning.

use super::{ensure_schema_ready, PreferenceStore, StorageFault, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use crate::model::theme::ThemePreference;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Preference key holding the theme token.
pub const THEME_KEY: &str = "theme";

/// Key-value preference persistence over the `preferences` table.
pub struct SqlitePreferenceStore {
    conn: Mutex<Connection>,
}

impl SqlitePreferenceStore {
    /// Wraps a migrated connection.
    pub fn new(conn: Connection) -> StoreResult<Self> {
        ensure_schema_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens the database file at `path` and builds a store over it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::new(open_db(path)?)
    }

    /// Builds a store over a fresh in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::new(open_db_in_memory()?)
    }

    fn read_value(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| StorageFault::LockPoisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_value(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn.lock().map_err(|_| StorageFault::LockPoisoned)?;
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self) -> StoreResult<ThemePreference> {
        let Some(raw) = self.read_value(THEME_KEY)? else {
            return Ok(ThemePreference::default());
        };

        Ok(ThemePreference::parse(&raw).unwrap_or_else(|| {
            warn!(
                "event=preference_get module=store status=fallback key={} reason=unrecognized_value value_len={}",
                THEME_KEY,
                raw.len()
            );
            ThemePreference::default()
        }))
    }

    fn set(&self, value: ThemePreference) -> StoreResult<()> {
        self.write_value(THEME_KEY, value.as_str())?;
        info!(
            "event=preference_set module=store status=ok key={} value={}",
            THEME_KEY, value
        );
        Ok(())
    }
}
