use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{QueryContext, StorageError};

/// Handle to the on-disk component database. The handle only remembers where
/// the file lives; every operation opens its own connection and drops it
/// before returning, so a failed call never leaves a connection behind.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Build a handle without touching the filesystem. Call `initialize`
    /// before the first query (or use `Store::open`).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Build a handle and make sure the schema exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self::new(path);
        store.initialize()?;
        Ok(store)
    }

    /// Ensure the data directory, database file and `components` table exist.
    /// Safe to run on every startup.
    pub fn initialize(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        self.with_connection(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS components (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    pattern TEXT NOT NULL,
                    category TEXT NOT NULL DEFAULT '',
                    language TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    code TEXT NOT NULL DEFAULT '',
                    author TEXT NOT NULL DEFAULT '',
                    added_on TEXT NOT NULL DEFAULT (date('now'))
                )",
                [],
            )
            .during("create components table")?;
            Ok(())
        })?;

        info!(path = %self.path.display(), "component store ready");
        Ok(())
    }

    /// Open a connection, hand it to `f`, and close it again whatever `f`
    /// returns.
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        debug!(path = %self.path.display(), "opening database connection");
        let conn = Connection::open(&self.path).map_err(|source| StorageError::Open {
            path: self.path.clone(),
            source,
        })?;
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_sql(store: &Store) -> Vec<String> {
        store
            .with_connection(|conn| {
                let mut stmt = conn
                    .prepare("SELECT sql FROM sqlite_master WHERE name = 'components'")
                    .during("read schema")?;
                let rows = stmt
                    .query_map([], |row| row.get(0))
                    .during("read schema")?
                    .collect::<Result<Vec<String>, _>>()
                    .during("read schema")?;
                Ok(rows)
            })
            .unwrap()
    }

    #[test]
    fn initialize_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("lib.sqlite");
        let store = Store::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("lib.sqlite")).unwrap();
        let before = table_sql(&store);

        store.initialize().unwrap();
        store.initialize().unwrap();

        let after = table_sql(&store);
        assert_eq!(before.len(), 1);
        assert_eq!(before, after);
    }

    #[test]
    fn unopenable_path_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let store = Store::new(dir.path());
        let err = store.initialize().unwrap_err();
        assert!(matches!(
            err,
            StorageError::Open { .. } | StorageError::Query { .. }
        ));
    }
}
