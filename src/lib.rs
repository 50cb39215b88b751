//! Core library surface for the Component Librarian.
//!
//! Three layers, each depending only on the one below it: `db` persists
//! components in an embedded SQLite file, `librarian` validates input and
//! shapes queries, and `ui` renders the terminal front-end.
pub mod config;
pub mod db;
pub mod error;
pub mod librarian;
pub mod models;
pub mod ui;

/// The persistence handle injected into the logic layer.
pub use db::Store;

pub use error::{LibrarianError, StorageError, ValidationError};
pub use librarian::Librarian;
pub use models::{Component, ComponentDraft, ComponentFilter, Field};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};

pub use config::{Config, Overrides};
