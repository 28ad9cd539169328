//! SQLite document repository.
//!
//! # Responsibility
//! - Store each record as a JSON document keyed by `(kind, id)`.
//! - Keep SQL details behind the repository contracts.
//!
//! # Invariants
//! - Writes go straight to the database; `flush` only pushes dirty pages.
//! - Stored bodies must deserialize into the entity, or reads fail with
//!   `InvalidData` instead of skipping the row.

use super::{
    record_key, with_assigned_id, CrudRepository, FlushingRepository, PartialUpdateRepository,
    RepoError, RepoResult,
};
use crate::db::{open_db, open_db_in_memory};
use crate::entity::Entity;
use crate::naming::simple_type_name;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Repository persisting `E` into the shared `documents` table.
///
/// Several repositories (for different kinds) may use the same database
/// file, each through its own connection.
pub struct SqliteDocumentRepository<E: Entity> {
    conn: Mutex<Connection>,
    kind: String,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> SqliteDocumentRepository<E> {
    /// Wraps a migrated connection, using the entity's type name as kind.
    pub fn new(conn: Connection) -> Self {
        Self::with_kind(conn, simple_type_name::<E>())
    }

    /// Wraps a migrated connection with an explicit document kind.
    pub fn with_kind(conn: Connection, kind: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            kind: kind.into(),
            _marker: PhantomData,
        }
    }

    /// Opens a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a private in-memory database and wraps it.
    pub fn in_memory() -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Entity> CrudRepository<E> for SqliteDocumentRepository<E> {
    fn save(&self, entity: &E) -> RepoResult<E> {
        let (id, record) = with_assigned_id(entity)?;
        let key = record_key(&id)?;
        let body = serde_json::to_string(&record)?;

        self.conn().execute(
            "INSERT INTO documents (kind, id, body) VALUES (?1, ?2, ?3)
             ON CONFLICT (kind, id) DO UPDATE SET
                body = excluded.body,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.kind, key, body],
        )?;

        debug!(
            "event=record_save module=repo.sqlite status=ok kind={} id={key}",
            self.kind
        );
        Ok(record)
    }

    fn find_by_id(&self, id: &E::Id) -> RepoResult<Option<E>> {
        let key = record_key(id)?;
        let body: Option<String> = self
            .conn()
            .query_row(
                "SELECT body FROM documents WHERE kind = ?1 AND id = ?2;",
                params![self.kind, key],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => parse_document(&self.kind, &key, &body).map(Some),
            None => Ok(None),
        }
    }

    fn exists_by_id(&self, id: &E::Id) -> RepoResult<bool> {
        let key = record_key(id)?;
        let exists = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE kind = ?1 AND id = ?2);",
            params![self.kind, key],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn delete_by_id(&self, id: &E::Id) -> RepoResult<()> {
        let key = record_key(id)?;
        let removed = self.conn().execute(
            "DELETE FROM documents WHERE kind = ?1 AND id = ?2;",
            params![self.kind, key],
        )?;
        debug!(
            "event=record_delete module=repo.sqlite status=ok kind={} id={key} removed={removed}",
            self.kind
        );
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM documents WHERE kind = ?1;",
            [self.kind.as_str()],
            |row| row.get::<_, i64>(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative document count {count}")))
    }
}

impl<E: Entity> FlushingRepository<E> for SqliteDocumentRepository<E> {
    fn flush(&self) -> RepoResult<()> {
        self.conn().cache_flush().map_err(|err| {
            error!(
                "event=repository_flush module=repo.sqlite status=error kind={} error={err}",
                self.kind
            );
            RepoError::from(err)
        })?;
        debug!(
            "event=repository_flush module=repo.sqlite status=ok kind={}",
            self.kind
        );
        Ok(())
    }
}

impl<E: Entity> PartialUpdateRepository<E> for SqliteDocumentRepository<E> {}

fn parse_document<E: Entity>(kind: &str, key: &str, body: &str) -> RepoResult<E> {
    serde_json::from_str(body).map_err(|err| {
        RepoError::InvalidData(format!(
            "document `{kind}/{key}` does not match the entity shape: {err}"
        ))
    })
}
