//! Named bean registry and the process-wide install hook.
//!
//! # Responsibility
//! - Hold constructed service instances under unique names.
//! - Expose one registry per process for models that are not pinned to a
//!   specific registry.
//!
//! # Invariants
//! - Bean names are trimmed, non-empty and free of whitespace.
//! - A name is bound at most once.
//! - The process-wide registry is installed at most once.

use crate::entity::Entity;
use log::{debug, info};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

pub mod capability;
pub mod handle;

pub use capability::RepositoryCapability;
pub use handle::RepositoryHandle;

/// Type-erased bean as stored in the registry.
pub type Bean = Arc<dyn Any + Send + Sync>;

static INSTALLED_REGISTRY: OnceCell<Arc<BeanRegistry>> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidBeanName(String),
    DuplicateBean(String),
    AlreadyInstalled,
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBeanName(name) => write!(f, "bean name is invalid: `{name}`"),
            Self::DuplicateBean(name) => write!(f, "bean already registered: {name}"),
            Self::AlreadyInstalled => write!(f, "a process-wide bean registry is already installed"),
        }
    }
}

impl Error for RegistryError {}

/// Store of named, constructed service instances.
#[derive(Default)]
pub struct BeanRegistry {
    beans: RwLock<BTreeMap<String, Bean>>,
    lookups: AtomicU64,
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `bean` under `name`.
    pub fn register_bean<B: Any + Send + Sync>(
        &self,
        name: &str,
        bean: B,
    ) -> Result<(), RegistryError> {
        self.insert(name, Arc::new(bean))
    }

    /// Binds a repository handle for entity `E` under `name`.
    pub fn register_repository<E: Entity>(
        &self,
        name: &str,
        handle: RepositoryHandle<E>,
    ) -> Result<(), RegistryError> {
        let capabilities = handle.capabilities();
        self.insert(name, Arc::new(handle))?;
        debug!(
            "event=repository_register module=registry status=ok bean={} capabilities={:?}",
            name.trim(),
            capabilities
        );
        Ok(())
    }

    pub fn contains_bean(&self, name: &str) -> bool {
        self.read_beans().contains_key(name.trim())
    }

    /// Looks up one bean by name. Every call counts as one lookup.
    pub fn get_bean(&self, name: &str) -> Option<Bean> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.read_beans().get(name.trim()).cloned()
    }

    /// Number of `get_bean` calls served so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Sorted bean names.
    pub fn bean_names(&self) -> Vec<String> {
        self.read_beans().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read_beans().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_beans().is_empty()
    }

    fn insert(&self, name: &str, bean: Bean) -> Result<(), RegistryError> {
        let name = name.trim();
        if !is_valid_bean_name(name) {
            return Err(RegistryError::InvalidBeanName(name.to_string()));
        }

        let mut beans = self.beans.write().unwrap_or_else(PoisonError::into_inner);
        if beans.contains_key(name) {
            return Err(RegistryError::DuplicateBean(name.to_string()));
        }
        beans.insert(name.to_string(), bean);
        Ok(())
    }

    fn read_beans(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Bean>> {
        self.beans.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Installs the registry models resolve against by default.
///
/// Called once by the host at startup; later calls fail.
pub fn install_registry(registry: Arc<BeanRegistry>) -> Result<(), RegistryError> {
    let bean_count = registry.len();
    INSTALLED_REGISTRY
        .set(registry)
        .map_err(|_| RegistryError::AlreadyInstalled)?;
    info!("event=registry_install module=registry status=ok beans={bean_count}");
    Ok(())
}

/// The process-wide registry, if one was installed.
pub fn installed_registry() -> Option<Arc<BeanRegistry>> {
    INSTALLED_REGISTRY.get().cloned()
}

fn is_valid_bean_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}
