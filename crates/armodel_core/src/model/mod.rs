//! Active Record layer over registered repositories.
//!
//! # Responsibility
//! - Let an entity save, load and delete itself without the caller fetching
//!   a repository.
//! - Map each operation onto the least capable repository contract that
//!   provides it.
//!
//! # Invariants
//! - Repository resolution happens before any id check, so configuration
//!   errors surface first.
//! - No operation validates or transforms the record; semantics are those of
//!   the delegated call.

use crate::entity::Entity;
use crate::naming::{repository_bean_name, repository_type_name, simple_type_name};
use crate::registry::{RepositoryCapability, RepositoryHandle};
use crate::repo::{CrudRepository, FlushingRepository, PartialUpdateRepository, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod slot;

pub use slot::RepositorySlot;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug)]
pub enum ModelError {
    /// No slot registry and nothing installed process-wide.
    RegistryNotInstalled,
    BeanNotFound {
        entity: String,
        bean_name: String,
        repository_type: String,
    },
    /// The bean exists but is not a repository handle for this entity type.
    NotARepository {
        entity: String,
        bean_name: String,
    },
    CapabilityMismatch {
        entity: String,
        bean_name: String,
        required: RepositoryCapability,
    },
    Repository(RepoError),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegistryNotInstalled => {
                write!(f, "no bean registry installed; call install_registry at startup")
            }
            Self::BeanNotFound {
                entity,
                bean_name,
                repository_type,
            } => write!(
                f,
                "repository bean `{bean_name}` for entity `{entity}` is not registered; define `{repository_type}` and register it under that name"
            ),
            Self::NotARepository { entity, bean_name } => write!(
                f,
                "bean `{bean_name}` is not a repository handle for entity `{entity}`"
            ),
            Self::CapabilityMismatch {
                entity,
                bean_name,
                required,
            } => write!(
                f,
                "repository bean `{bean_name}` for entity `{entity}` does not implement {}",
                required.contract_name()
            ),
            Self::Repository(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repository(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ModelError {
    fn from(value: RepoError) -> Self {
        Self::Repository(value)
    }
}

/// Active Record operations for an entity embedding a `RepositorySlot`.
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Order {
///     id: Option<u64>,
///     #[serde(skip)]
///     slot: RepositorySlot<Order>,
/// }
///
/// impl Model for Order {
///     fn repository_slot(&self) -> &RepositorySlot<Self> {
///         &self.slot
///     }
/// }
///
/// let saved = order.save()?; // delegates to bean `orderRepository`
/// ```
pub trait Model: Entity {
    fn repository_slot(&self) -> &RepositorySlot<Self>;

    /// Simple type name used to derive the bean name.
    fn entity_name() -> &'static str {
        simple_type_name::<Self>()
    }

    /// Bean the repository is registered under. Override when the repository
    /// uses another name.
    fn repository_bean_name(&self) -> String {
        repository_bean_name(Self::entity_name())
    }

    /// Expected repository type name, for diagnostics.
    fn repository_type_name(&self) -> String {
        repository_type_name(Self::entity_name())
    }

    /// The memoized handle of this instance.
    fn repository_handle(&self) -> ModelResult<Arc<RepositoryHandle<Self>>> {
        self.repository_slot()
            .get_or_resolve(Self::entity_name(), || self.repository_bean_name())
    }

    fn repository(&self) -> ModelResult<Arc<dyn CrudRepository<Self>>> {
        Ok(self.repository_handle()?.crud())
    }

    fn flushing_repository(&self) -> ModelResult<Arc<dyn FlushingRepository<Self>>> {
        self.repository_handle()?
            .as_flushing()
            .ok_or_else(|| self.capability_mismatch(RepositoryCapability::Flushing))
    }

    fn partial_update_repository(&self) -> ModelResult<Arc<dyn PartialUpdateRepository<Self>>> {
        self.repository_handle()?
            .as_partial_update()
            .ok_or_else(|| self.capability_mismatch(RepositoryCapability::PartialUpdate))
    }

    /// Saves this record and returns the stored copy.
    fn save(&self) -> ModelResult<Self> {
        let saved = self.repository()?.save(self)?;
        Ok(self.adopt_loaded(saved))
    }

    fn flush(&self) -> ModelResult<()> {
        Ok(self.flushing_repository()?.flush()?)
    }

    fn save_and_flush(&self) -> ModelResult<Self> {
        let saved = self.flushing_repository()?.save_and_flush(self)?;
        Ok(self.adopt_loaded(saved))
    }

    /// Inserts or updates, writing only non-null fields over an existing row.
    ///
    /// On update the result is a copy of `self`, not the merged row; load
    /// the record again to observe the stored values.
    fn save_or_update_by_not_null_properties(&self) -> ModelResult<Self> {
        let saved = self
            .partial_update_repository()?
            .save_or_update_by_not_null_properties(self)?;
        Ok(self.adopt_loaded(saved))
    }

    fn find_by_id(&self) -> ModelResult<Option<Self>> {
        let repo = self.repository()?;
        let found = repo.find_by_id(&self.require_id()?)?;
        Ok(found.map(|loaded| self.adopt_loaded(loaded)))
    }

    /// Loads the stored record; a missing row is a repository `NotFound`.
    fn get_by_id(&self) -> ModelResult<Self> {
        let repo = self.flushing_repository()?;
        let loaded = repo.get_by_id(&self.require_id()?)?;
        Ok(self.adopt_loaded(loaded))
    }

    fn exists_by_id(&self) -> ModelResult<bool> {
        let repo = self.repository()?;
        Ok(repo.exists_by_id(&self.require_id()?)?)
    }

    fn delete(&self) -> ModelResult<()> {
        Ok(self.repository()?.delete(self)?)
    }

    fn delete_by_id(&self) -> ModelResult<()> {
        let repo = self.repository()?;
        Ok(repo.delete_by_id(&self.require_id()?)?)
    }

    /// Binds a record returned by the repository to this instance's registry.
    #[doc(hidden)]
    fn adopt_loaded(&self, loaded: Self) -> Self {
        loaded.repository_slot().rebind_from(self.repository_slot());
        loaded
    }

    #[doc(hidden)]
    fn require_id(&self) -> ModelResult<Self::Id> {
        self.id().ok_or(ModelError::Repository(RepoError::MissingId))
    }

    #[doc(hidden)]
    fn capability_mismatch(&self, required: RepositoryCapability) -> ModelError {
        ModelError::CapabilityMismatch {
            entity: Self::entity_name().to_string(),
            bean_name: self.repository_bean_name(),
            required,
        }
    }
}
