//! Per-instance memoized repository handle.
//!
//! # Invariants
//! - Once resolved, the handle never changes for the life of the slot.
//! - Concurrent first use performs a single registry lookup.
//! - Failed resolutions are not cached; the next call looks up again.

use super::{ModelError, ModelResult};
use crate::entity::Entity;
use crate::naming::repository_type_name;
use crate::registry::{installed_registry, BeanRegistry, RepositoryHandle};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Embedded by every model to cache its repository handle.
///
/// Serde users mark the field `#[serde(skip)]`; a deserialized record starts
/// with an empty slot bound to the installed registry until a model rebinds
/// it with `rebind_from`.
pub struct RepositorySlot<E: Entity> {
    registry: OnceCell<Arc<BeanRegistry>>,
    handle: OnceCell<Arc<RepositoryHandle<E>>>,
}

impl<E: Entity> RepositorySlot<E> {
    /// Slot resolving against the process-wide registry.
    pub fn new() -> Self {
        Self {
            registry: OnceCell::new(),
            handle: OnceCell::new(),
        }
    }

    /// Slot resolving against `registry` regardless of what is installed.
    pub fn with_registry(registry: Arc<BeanRegistry>) -> Self {
        Self {
            registry: OnceCell::with_value(registry),
            handle: OnceCell::new(),
        }
    }

    /// Pins this slot to the registry `source` is pinned to, if any.
    ///
    /// A slot that is already pinned keeps its registry. Only meaningful
    /// before the first resolution.
    pub fn rebind_from(&self, source: &Self) {
        if let Some(registry) = source.registry.get() {
            let _ = self.registry.set(Arc::clone(registry));
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.registry.get().is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Returns the cached handle, resolving it on first use.
    ///
    /// `bean_name` is only evaluated when a lookup is needed.
    pub fn get_or_resolve(
        &self,
        entity_name: &str,
        bean_name: impl FnOnce() -> String,
    ) -> ModelResult<Arc<RepositoryHandle<E>>> {
        if let Some(handle) = self.handle.get() {
            return Ok(Arc::clone(handle));
        }

        // Second check happens under the cell's init lock.
        let handle = self
            .handle
            .get_or_try_init(|| self.resolve(entity_name, &bean_name()))?;
        Ok(Arc::clone(handle))
    }

    fn resolve(
        &self,
        entity_name: &str,
        bean_name: &str,
    ) -> ModelResult<Arc<RepositoryHandle<E>>> {
        let registry = match self.registry.get() {
            Some(registry) => Arc::clone(registry),
            None => installed_registry().ok_or(ModelError::RegistryNotInstalled)?,
        };

        let Some(bean) = registry.get_bean(bean_name) else {
            warn!(
                "event=repository_resolve module=model status=error entity={entity_name} bean={bean_name} error_code=bean_not_found"
            );
            return Err(ModelError::BeanNotFound {
                entity: entity_name.to_string(),
                bean_name: bean_name.to_string(),
                repository_type: repository_type_name(entity_name),
            });
        };

        let handle = bean.downcast::<RepositoryHandle<E>>().map_err(|_| {
            warn!(
                "event=repository_resolve module=model status=error entity={entity_name} bean={bean_name} error_code=not_a_repository"
            );
            ModelError::NotARepository {
                entity: entity_name.to_string(),
                bean_name: bean_name.to_string(),
            }
        })?;

        debug!(
            "event=repository_resolve module=model status=ok entity={entity_name} bean={bean_name} capabilities={:?}",
            handle.capabilities()
        );
        Ok(handle)
    }
}

impl<E: Entity> Default for RepositorySlot<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A clone is a new instance: it keeps the registry binding but starts
/// unresolved.
impl<E: Entity> Clone for RepositorySlot<E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            handle: OnceCell::new(),
        }
    }
}

/// Slots never take part in record equality.
impl<E: Entity> PartialEq for RepositorySlot<E> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<E: Entity> Eq for RepositorySlot<E> {}

impl<E: Entity> Debug for RepositorySlot<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositorySlot")
            .field("pinned", &self.is_pinned())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
