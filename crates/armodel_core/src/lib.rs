//! Active Record models over named repository beans.
//!
//! An entity embeds a [`RepositorySlot`] and implements [`Model`]; it can then
//! save, load and delete itself through the repository registered under its
//! conventional bean name (`Order` -> `orderRepository`).

pub mod db;
pub mod entity;
pub mod logging;
pub mod model;
pub mod naming;
pub mod registry;
pub mod repo;

pub use entity::{Entity, EntityId};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::{Model, ModelError, ModelResult, RepositorySlot};
pub use registry::{
    install_registry, installed_registry, BeanRegistry, RegistryError, RepositoryCapability,
    RepositoryHandle,
};
pub use repo::{
    merge_non_null, record_key, CrudRepository, FlushingRepository, InMemoryRepository,
    PartialUpdateRepository, RepoError, RepoResult, SqliteDocumentRepository,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
