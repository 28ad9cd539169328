//! In-memory repository with staged writes.
//!
//! # Invariants
//! - Reads observe staged writes immediately.
//! - Only `flush` moves staged writes into the durable map.
//! - Records are held in serialized form, detached from any model state.

use super::{
    with_assigned_id, CrudRepository, FlushingRepository, PartialUpdateRepository, RepoResult,
};
use crate::entity::Entity;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct MemoryState<Id> {
    durable: HashMap<Id, Value>,
    /// `None` marks a staged delete.
    staged: HashMap<Id, Option<Value>>,
}

impl<Id: Eq + std::hash::Hash> MemoryState<Id> {
    fn lookup(&self, id: &Id) -> Option<&Value> {
        match self.staged.get(id) {
            Some(staged) => staged.as_ref(),
            None => self.durable.get(id),
        }
    }
}

/// Process-local repository implementing every contract.
pub struct InMemoryRepository<E: Entity> {
    state: Mutex<MemoryState<E::Id>>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                durable: HashMap::new(),
                staged: HashMap::new(),
            }),
            _marker: PhantomData,
        }
    }

    /// Number of writes waiting for `flush`.
    pub fn staged_count(&self) -> usize {
        self.lock().staged.len()
    }

    /// Number of records that survived a flush.
    pub fn durable_count(&self) -> usize {
        self.lock().durable.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState<E::Id>> {
        // Every mutation is a single map operation, so a poisoned state is
        // still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Entity> CrudRepository<E> for InMemoryRepository<E> {
    fn save(&self, entity: &E) -> RepoResult<E> {
        let (id, record) = with_assigned_id(entity)?;
        let body = serde_json::to_value(&record)?;
        self.lock().staged.insert(id.clone(), Some(body));
        debug!("event=record_save module=repo.memory status=ok id={id:?}");
        Ok(record)
    }

    fn find_by_id(&self, id: &E::Id) -> RepoResult<Option<E>> {
        let body = self.lock().lookup(id).cloned();
        match body {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }

    fn exists_by_id(&self, id: &E::Id) -> RepoResult<bool> {
        Ok(self.lock().lookup(id).is_some())
    }

    fn delete_by_id(&self, id: &E::Id) -> RepoResult<()> {
        let mut state = self.lock();
        if state.lookup(id).is_some() {
            state.staged.insert(id.clone(), None);
            debug!("event=record_delete module=repo.memory status=ok id={id:?}");
        }
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        let state = self.lock();
        let durable_visible = state
            .durable
            .keys()
            .filter(|id| !state.staged.contains_key(*id))
            .count();
        let staged_visible = state.staged.values().filter(|body| body.is_some()).count();
        Ok((durable_visible + staged_visible) as u64)
    }
}

impl<E: Entity> FlushingRepository<E> for InMemoryRepository<E> {
    fn flush(&self) -> RepoResult<()> {
        let mut state = self.lock();
        let staged = std::mem::take(&mut state.staged);
        let applied = staged.len();
        for (id, body) in staged {
            match body {
                Some(body) => {
                    state.durable.insert(id, body);
                }
                None => {
                    state.durable.remove(&id);
                }
            }
        }
        debug!("event=repository_flush module=repo.memory status=ok applied={applied}");
        Ok(())
    }
}

impl<E: Entity> PartialUpdateRepository<E> for InMemoryRepository<E> {}
