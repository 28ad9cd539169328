//! Capability-typed view over one registered repository.

use super::capability::RepositoryCapability;
use crate::entity::Entity;
use crate::repo::{CrudRepository, FlushingRepository, PartialUpdateRepository};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// What gets registered as a repository bean for entity `E`.
///
/// The constructor chosen at registration fixes which contracts models may
/// reach through this handle.
pub struct RepositoryHandle<E: Entity> {
    crud: Arc<dyn CrudRepository<E>>,
    flushing: Option<Arc<dyn FlushingRepository<E>>>,
    partial_update: Option<Arc<dyn PartialUpdateRepository<E>>>,
}

impl<E: Entity> RepositoryHandle<E> {
    /// Exposes only the basic contract.
    pub fn basic<R: CrudRepository<E> + 'static>(repo: Arc<R>) -> Self {
        Self {
            crud: repo,
            flushing: None,
            partial_update: None,
        }
    }

    /// Exposes the basic and flushing contracts.
    pub fn flushing<R: FlushingRepository<E> + 'static>(repo: Arc<R>) -> Self {
        Self {
            crud: repo.clone(),
            flushing: Some(repo),
            partial_update: None,
        }
    }

    /// Exposes every contract.
    pub fn partial_update<R: PartialUpdateRepository<E> + 'static>(repo: Arc<R>) -> Self {
        Self {
            crud: repo.clone(),
            flushing: Some(repo.clone()),
            partial_update: Some(repo),
        }
    }

    pub fn crud(&self) -> Arc<dyn CrudRepository<E>> {
        Arc::clone(&self.crud)
    }

    pub fn as_flushing(&self) -> Option<Arc<dyn FlushingRepository<E>>> {
        self.flushing.clone()
    }

    pub fn as_partial_update(&self) -> Option<Arc<dyn PartialUpdateRepository<E>>> {
        self.partial_update.clone()
    }

    pub fn supports(&self, capability: RepositoryCapability) -> bool {
        match capability {
            RepositoryCapability::Crud => true,
            RepositoryCapability::Flushing => self.flushing.is_some(),
            RepositoryCapability::PartialUpdate => self.partial_update.is_some(),
        }
    }

    /// Supported capabilities, basic first.
    pub fn capabilities(&self) -> Vec<RepositoryCapability> {
        [
            RepositoryCapability::Crud,
            RepositoryCapability::Flushing,
            RepositoryCapability::PartialUpdate,
        ]
        .into_iter()
        .filter(|capability| self.supports(*capability))
        .collect()
    }
}

impl<E: Entity> Debug for RepositoryHandle<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryHandle")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
