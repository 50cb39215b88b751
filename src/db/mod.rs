//! Persistence layer: a single `components` table in an embedded SQLite file.

mod components;
mod connection;

pub use connection::Store;
