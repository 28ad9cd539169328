//! Repository contracts and reference implementations.
//!
//! # Responsibility
//! - Define the three layered persistence contracts a model can delegate to.
//! - Provide an in-memory and a SQLite-backed repository for hosts without
//!   their own persistence layer.
//!
//! # Invariants
//! - `save` always returns the stored record with its id assigned.
//! - Deleting an absent record is not an error.

use crate::entity::Entity;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod merge;
pub mod sqlite;

pub use memory::InMemoryRepository;
pub use merge::merge_non_null;
pub use sqlite::SqliteDocumentRepository;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Sqlite(rusqlite::Error),
    /// The document database was written by a newer schema.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// No record stored under the given id, rendered as by `record_key`.
    NotFound(String),
    /// The record has no id and the entity cannot generate one.
    MissingId,
    Serialization(serde_json::Error),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "document schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::MissingId => write!(f, "record has no id and none can be generated"),
            Self::Serialization(err) => write!(f, "record serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::NotFound(_)
            | Self::MissingId
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Basic create/read/update/delete contract.
pub trait CrudRepository<E: Entity>: Send + Sync {
    /// Inserts or replaces `entity`, assigning an id when it has none.
    fn save(&self, entity: &E) -> RepoResult<E>;
    fn find_by_id(&self, id: &E::Id) -> RepoResult<Option<E>>;
    fn delete_by_id(&self, id: &E::Id) -> RepoResult<()>;
    fn count(&self) -> RepoResult<u64>;

    fn exists_by_id(&self, id: &E::Id) -> RepoResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }

    /// Deletes by the entity's id; records that were never saved are ignored.
    fn delete(&self, entity: &E) -> RepoResult<()> {
        match entity.id() {
            Some(id) => self.delete_by_id(&id),
            None => Ok(()),
        }
    }
}

/// Adds explicit write flushing and strict lookup.
pub trait FlushingRepository<E: Entity>: CrudRepository<E> {
    /// Makes every write accepted so far durable.
    fn flush(&self) -> RepoResult<()>;

    fn save_and_flush(&self, entity: &E) -> RepoResult<E> {
        let saved = self.save(entity)?;
        self.flush()?;
        Ok(saved)
    }

    /// Like `find_by_id`, but a missing record is `RepoError::NotFound`.
    fn get_by_id(&self, id: &E::Id) -> RepoResult<E> {
        match self.find_by_id(id)? {
            Some(entity) => Ok(entity),
            None => Err(RepoError::NotFound(record_key(id)?)),
        }
    }
}

/// Adds null-aware partial updates.
pub trait PartialUpdateRepository<E: Entity>: FlushingRepository<E> {
    /// Inserts `entity` when it has no id or no stored row; otherwise copies
    /// only its non-null fields onto the stored row and saves the result.
    ///
    /// Inserts return the saved record (with any generated id). Updates
    /// return `entity` itself, so fields it left null stay null in the
    /// result even though the stored row keeps its previous values.
    fn save_or_update_by_not_null_properties(&self, entity: &E) -> RepoResult<E> {
        let Some(id) = entity.id() else {
            return self.save(entity);
        };
        match self.find_by_id(&id)? {
            Some(stored) => {
                let merged = merge_non_null(&stored, entity)?;
                self.save(&merged)?;
                Ok(entity.clone())
            }
            None => self.save(entity),
        }
    }
}

/// Text form of an id used for storage keys and error messages.
///
/// String ids are rendered verbatim; other ids as their JSON text.
pub fn record_key<Id: serde::Serialize>(id: &Id) -> RepoResult<String> {
    Ok(match serde_json::to_value(id)? {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Returns `entity` with an id, generating one when missing.
pub(crate) fn with_assigned_id<E: Entity>(entity: &E) -> RepoResult<(E::Id, E)> {
    let mut record = entity.clone();
    let id = match record.id() {
        Some(id) => id,
        None => {
            let id = E::generate_id().ok_or(RepoError::MissingId)?;
            record.set_id(id.clone());
            id
        }
    };
    Ok((id, record))
}
