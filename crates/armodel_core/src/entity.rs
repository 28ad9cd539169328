//! Entity identity contract shared by models and repositories.
//!
//! # Invariants
//! - `id()` is `None` only for records that were never persisted.
//! - Repositories assign an id through `set_id` before storing a record
//!   that has none.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Primary key requirements for entity ids.
///
/// Ids are compared in memory and serialized as document keys.
pub trait EntityId:
    Clone + Debug + Eq + Hash + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> EntityId for T where
    T: Clone + Debug + Eq + Hash + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// A persistable domain record with its own primary key.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: EntityId;

    /// Returns the primary key, when assigned.
    fn id(&self) -> Option<Self::Id>;

    /// Assigns the primary key.
    fn set_id(&mut self, id: Self::Id);

    /// Produces a fresh id for inserts of records without one.
    ///
    /// Returning `None` means callers must supply ids themselves.
    fn generate_id() -> Option<Self::Id> {
        None
    }
}
