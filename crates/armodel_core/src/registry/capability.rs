//! Repository capability levels a model operation may require.

use std::fmt::{Display, Formatter};

/// Capability offered by a registered repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RepositoryCapability {
    Crud,
    Flushing,
    PartialUpdate,
}

impl RepositoryCapability {
    /// Stable string id used in logs and error text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crud => "crud",
            Self::Flushing => "flushing",
            Self::PartialUpdate => "partial_update",
        }
    }

    /// Name of the repository contract providing this capability.
    pub fn contract_name(self) -> &'static str {
        match self {
            Self::Crud => "CrudRepository",
            Self::Flushing => "FlushingRepository",
            Self::PartialUpdate => "PartialUpdateRepository",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Crud => "Save, find, existence check and delete of single records.",
            Self::Flushing => "Explicit flush of accepted writes and strict lookup by id.",
            Self::PartialUpdate => "Upsert that only overwrites non-null fields.",
        }
    }
}

impl Display for RepositoryCapability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::RepositoryCapability;

    #[test]
    fn capabilities_are_ordered_from_basic_to_richest() {
        assert!(RepositoryCapability::Crud < RepositoryCapability::Flushing);
        assert!(RepositoryCapability::Flushing < RepositoryCapability::PartialUpdate);
    }

    #[test]
    fn exposes_stable_ids_and_contract_names() {
        assert_eq!(RepositoryCapability::PartialUpdate.as_str(), "partial_update");
        assert_eq!(RepositoryCapability::Flushing.to_string(), "flushing");
        assert_eq!(
            RepositoryCapability::Crud.contract_name(),
            "CrudRepository"
        );
        assert!(RepositoryCapability::PartialUpdate
            .description()
            .contains("non-null"));
    }
}
