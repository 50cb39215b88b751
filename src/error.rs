//! Error types shared by the storage and logic layers. The UI glue keeps using
//! `anyhow` for its own plumbing, but anything a caller might want to match on
//! (a rejected draft versus a broken database file) gets a named variant here.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::Field;

/// A draft was rejected before reaching storage because required fields were
/// empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending fields in declaration order (name, pattern, language).
    pub missing: Vec<Field>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .missing
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "required field(s) empty: {fields}")
    }
}

impl std::error::Error for ValidationError {}

/// The backing database file could not be created, opened, read or written.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create data directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open SQLite database at {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to {action}")]
    Query {
        action: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

/// Everything `Librarian::add_component` can fail with.
#[derive(Debug, Error)]
pub enum LibrarianError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Attach the attempted action to a raw SQLite failure, mirroring the
/// `.context("failed to ...")` calls used at the application edge.
pub(crate) trait QueryContext<T> {
    fn during(self, action: &'static str) -> Result<T, StorageError>;
}

impl<T> QueryContext<T> for Result<T, rusqlite::Error> {
    fn during(self, action: &'static str) -> Result<T, StorageError> {
        self.map_err(|source| StorageError::Query { action, source })
    }
}
