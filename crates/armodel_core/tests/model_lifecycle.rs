use armodel_core::{
    BeanRegistry, CrudRepository, Entity, InMemoryRepository, Model, ModelError, RepoError,
    RepositoryCapability, RepositoryHandle, RepositorySlot,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Barrier};
use std::thread;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Foo {
    id: Option<u64>,
    name: Option<String>,
    note: Option<String>,
    #[serde(skip)]
    slot: RepositorySlot<Foo>,
}

impl Entity for Foo {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl Model for Foo {
    fn repository_slot(&self) -> &RepositorySlot<Self> {
        &self.slot
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LegacyOrder {
    id: Option<u64>,
    #[serde(skip)]
    slot: RepositorySlot<LegacyOrder>,
}

impl Entity for LegacyOrder {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl Model for LegacyOrder {
    fn repository_slot(&self) -> &RepositorySlot<Self> {
        &self.slot
    }

    fn repository_bean_name(&self) -> String {
        "orders".to_string()
    }
}

fn foo(registry: &Arc<BeanRegistry>, id: Option<u64>, name: &str) -> Foo {
    Foo {
        id,
        name: Some(name.to_string()),
        note: None,
        slot: RepositorySlot::with_registry(Arc::clone(registry)),
    }
}

fn registry_with(handle: RepositoryHandle<Foo>) -> Arc<BeanRegistry> {
    let registry = Arc::new(BeanRegistry::new());
    registry
        .register_repository("fooRepository", handle)
        .expect("repository should register");
    registry
}

fn full_registry() -> (Arc<BeanRegistry>, Arc<InMemoryRepository<Foo>>) {
    let repo = Arc::new(InMemoryRepository::new());
    let registry = registry_with(RepositoryHandle::partial_update(repo.clone()));
    (registry, repo)
}

#[test]
fn derives_bean_name_from_entity_type() {
    let (registry, _) = full_registry();
    let entity = foo(&registry, Some(1), "a");
    assert_eq!(Foo::entity_name(), "Foo");
    assert_eq!(entity.repository_bean_name(), "fooRepository");
    assert_eq!(entity.repository_type_name(), "FooRepository");
}

#[test]
fn resolves_repository_once_per_instance() {
    let (registry, _) = full_registry();
    let entity = foo(&registry, Some(1), "a");
    assert!(!entity.repository_slot().is_resolved());

    let first = entity.repository_handle().expect("first resolve");
    let second = entity.repository_handle().expect("second resolve");
    entity.save().expect("save");
    entity.exists_by_id().expect("exists");

    assert!(Arc::ptr_eq(&first, &second));
    assert!(entity.repository_slot().is_resolved());
    assert_eq!(registry.lookup_count(), 1);

    let other = foo(&registry, Some(2), "b");
    let third = other.repository_handle().expect("other resolve");
    assert!(Arc::ptr_eq(&first, &third));
    assert_eq!(registry.lookup_count(), 2);
}

#[test]
fn concurrent_first_use_performs_a_single_lookup() {
    let (registry, _) = full_registry();
    let entity = foo(&registry, Some(1), "shared");
    let workers = 8;
    let barrier = Barrier::new(workers);

    let handles: Vec<_> = thread::scope(|scope| {
        let spawned: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    entity.repository_handle().expect("resolve")
                })
            })
            .collect();
        spawned
            .into_iter()
            .map(|worker| worker.join().expect("worker should not panic"))
            .collect()
    });

    assert_eq!(registry.lookup_count(), 1);
    assert!(handles
        .iter()
        .all(|handle| Arc::ptr_eq(handle, &handles[0])));
}

#[test]
fn missing_bean_fails_every_operation() {
    let registry = Arc::new(BeanRegistry::new());
    let entity = foo(&registry, Some(1), "a");

    let results = [
        entity.save().map(|_| ()),
        entity.flush(),
        entity.save_and_flush().map(|_| ()),
        entity.save_or_update_by_not_null_properties().map(|_| ()),
        entity.find_by_id().map(|_| ()),
        entity.get_by_id().map(|_| ()),
        entity.exists_by_id().map(|_| ()),
        entity.delete(),
        entity.delete_by_id(),
    ];

    for result in results {
        let err = result.expect_err("operation must fail without a bean");
        assert!(
            matches!(
                &err,
                ModelError::BeanNotFound { bean_name, repository_type, .. }
                    if bean_name == "fooRepository" && repository_type == "FooRepository"
            ),
            "unexpected error: {err}"
        );
    }
    assert!(!entity.repository_slot().is_resolved());
}

#[test]
fn failed_resolution_is_retried_after_registration() {
    let registry = Arc::new(BeanRegistry::new());
    let entity = foo(&registry, Some(1), "late");
    assert!(entity.save().is_err());

    registry
        .register_repository(
            "fooRepository",
            RepositoryHandle::basic(Arc::new(InMemoryRepository::<Foo>::new())),
        )
        .expect("register");

    entity.save().expect("save after registration");
    assert_eq!(registry.lookup_count(), 2);
}

#[test]
fn basic_repository_rejects_richer_operations() {
    let repo = Arc::new(InMemoryRepository::<Foo>::new());
    let registry = registry_with(RepositoryHandle::basic(repo.clone()));
    let entity = foo(&registry, Some(5), "basic");

    entity.save().expect("basic save works");
    assert!(entity.exists_by_id().expect("exists"));
    assert_eq!(
        entity.find_by_id().expect("find").and_then(|found| found.name),
        Some("basic".to_string())
    );

    for (result, expected) in [
        (entity.flush(), RepositoryCapability::Flushing),
        (entity.save_and_flush().map(|_| ()), RepositoryCapability::Flushing),
        (entity.get_by_id().map(|_| ()), RepositoryCapability::Flushing),
        (
            entity.save_or_update_by_not_null_properties().map(|_| ()),
            RepositoryCapability::PartialUpdate,
        ),
    ] {
        let err = result.expect_err("richer operation must fail");
        assert!(
            matches!(err, ModelError::CapabilityMismatch { required, .. } if required == expected)
        );
    }

    entity.delete().expect("basic delete works");
    assert!(!entity.exists_by_id().expect("exists after delete"));
}

#[test]
fn flushing_repository_still_rejects_partial_update() {
    let repo = Arc::new(InMemoryRepository::<Foo>::new());
    let registry = registry_with(RepositoryHandle::flushing(repo.clone()));
    let entity = foo(&registry, Some(8), "flushing");

    entity.save_and_flush().expect("save and flush");
    assert_eq!(repo.durable_count(), 1);
    assert_eq!(entity.get_by_id().expect("get").name.as_deref(), Some("flushing"));

    let err = entity
        .save_or_update_by_not_null_properties()
        .expect_err("partial update needs the richest contract");
    assert!(err.to_string().contains("PartialUpdateRepository"));
}

#[test]
fn bean_of_another_type_is_not_a_repository() {
    let registry = Arc::new(BeanRegistry::new());
    registry
        .register_bean("fooRepository", "just a string".to_string())
        .expect("register");
    let entity = foo(&registry, Some(1), "a");

    let err = entity.save().expect_err("wrong bean type");
    assert!(matches!(err, ModelError::NotARepository { bean_name, .. } if bean_name == "fooRepository"));
}

#[test]
fn repository_for_another_entity_is_not_a_repository() {
    let registry = Arc::new(BeanRegistry::new());
    registry
        .register_repository(
            "fooRepository",
            RepositoryHandle::basic(Arc::new(InMemoryRepository::<LegacyOrder>::new())),
        )
        .expect("register");
    let entity = foo(&registry, Some(1), "a");

    assert!(matches!(
        entity.find_by_id(),
        Err(ModelError::NotARepository { .. })
    ));
}

#[test]
fn overridden_bean_name_is_used_for_lookup() {
    let registry = Arc::new(BeanRegistry::new());
    registry
        .register_repository(
            "orders",
            RepositoryHandle::basic(Arc::new(InMemoryRepository::<LegacyOrder>::new())),
        )
        .expect("register");
    let order = LegacyOrder {
        id: Some(11),
        slot: RepositorySlot::with_registry(Arc::clone(&registry)),
    };

    order.save().expect("save through overridden name");
    assert!(order.exists_by_id().expect("exists"));
}

#[test]
fn save_and_flush_make_writes_durable() {
    let (registry, repo) = full_registry();
    let entity = foo(&registry, Some(1), "staged");

    entity.save().expect("save");
    assert_eq!(repo.durable_count(), 0);
    entity.flush().expect("flush");
    assert_eq!(repo.durable_count(), 1);

    foo(&registry, Some(2), "direct")
        .save_and_flush()
        .expect("save and flush");
    assert_eq!(repo.durable_count(), 2);
    assert_eq!(repo.staged_count(), 0);
}

#[test]
fn upsert_by_not_null_properties_merges_into_existing_row() {
    let (registry, _) = full_registry();
    let mut original = foo(&registry, Some(3), "original");
    original.note = Some("keep me".to_string());
    original.save().expect("seed");

    let mut patch = foo(&registry, Some(3), "renamed");
    patch.note = None;
    let returned = patch
        .save_or_update_by_not_null_properties()
        .expect("upsert");

    assert_eq!(returned, patch);
    assert_eq!(returned.note, None);

    let stored = patch.get_by_id().expect("stored");
    assert_eq!(stored.name.as_deref(), Some("renamed"));
    assert_eq!(stored.note.as_deref(), Some("keep me"));
}

#[test]
fn loaded_records_keep_the_pinned_registry() {
    let (registry, _) = full_registry();
    let entity = foo(&registry, Some(21), "pinned");
    entity.save().expect("seed");

    let loaded = entity.find_by_id().expect("find").expect("present");
    assert!(loaded.repository_slot().is_pinned());
    let mut renamed = loaded.clone();
    renamed.name = Some("renamed".to_string());
    renamed.save().expect("loaded record saves through the pinned registry");

    let fetched = entity.get_by_id().expect("get");
    assert_eq!(fetched.name.as_deref(), Some("renamed"));
    fetched
        .save_or_update_by_not_null_properties()
        .expect("upsert from fetched record")
        .delete_by_id()
        .expect("delete through returned record");
    assert!(!entity.exists_by_id().expect("exists"));
}

#[test]
fn upsert_by_not_null_properties_inserts_unknown_id() {
    let (registry, repo) = full_registry();
    let entity = foo(&registry, Some(99), "fresh");

    let saved = entity
        .save_or_update_by_not_null_properties()
        .expect("insert");
    assert_eq!(saved.id, Some(99));
    assert!(entity.exists_by_id().expect("exists"));
    assert_eq!(repo.count().expect("count"), 1);
}

#[test]
fn id_based_operations_require_an_id() {
    let (registry, _) = full_registry();
    let entity = foo(&registry, None, "anonymous");

    for result in [
        entity.find_by_id().map(|_| ()),
        entity.get_by_id().map(|_| ()),
        entity.exists_by_id().map(|_| ()),
        entity.delete_by_id(),
        entity.save().map(|_| ()),
    ] {
        assert!(matches!(
            result,
            Err(ModelError::Repository(RepoError::MissingId))
        ));
    }

    entity.delete().expect("deleting an unsaved record is a no-op");
}

#[test]
fn get_by_id_reports_missing_row() {
    let (registry, _) = full_registry();
    let entity = foo(&registry, Some(404), "ghost");
    assert!(entity.find_by_id().expect("find").is_none());
    assert!(matches!(
        entity.get_by_id(),
        Err(ModelError::Repository(RepoError::NotFound(_)))
    ));
}

#[test]
fn clones_start_with_an_unresolved_slot() {
    let (registry, _) = full_registry();
    let entity = foo(&registry, Some(1), "a");
    entity.repository_handle().expect("resolve");

    let copy = entity.clone();
    assert!(!copy.repository_slot().is_resolved());
    assert_eq!(copy, entity);
    copy.save().expect("clone keeps the pinned registry");
    assert_eq!(registry.lookup_count(), 2);
}
