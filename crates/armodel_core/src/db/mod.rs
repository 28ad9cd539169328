//! SQLite bootstrap for the document repository.
//!
//! # Responsibility
//! - Open file or in-memory connections configured for document storage.
//! - Apply schema migrations before any repository touches a connection.
//!
//! # Invariants
//! - Schema version is tracked in `PRAGMA user_version`.
//! - A database written by a newer binary is refused with
//!   `RepoError::UnsupportedSchemaVersion`, never downgraded.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
