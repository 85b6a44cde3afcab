#![allow(dead_code)]

use async_trait::async_trait;
use entityms_core::{
    EntityId, EntityRepository, EntityServiceConfig, EntityType, EntityUtils, LookupValue,
    LookupValueRepository, RepoError, RepoResult, ThingCommands, ThingEntity, WriteScope,
    WriteTransaction,
};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// `item` accepts TAG and COLOR, `widget` accepts TAG only.
pub fn test_config() -> Arc<EntityServiceConfig> {
    Arc::new(
        EntityServiceConfig::new(vec![
            EntityType::new("item", &["TAG", "COLOR"]),
            EntityType::new("widget", &["TAG"]),
        ])
        .unwrap(),
    )
}

pub fn details(pairs: &[(&str, &[&str])]) -> entityms_core::Details {
    pairs
        .iter()
        .map(|(value_type, values)| {
            (
                value_type.to_string(),
                values.iter().map(|value| value.to_string()).collect(),
            )
        })
        .collect()
}

#[derive(Default)]
pub struct FakeThingRepository {
    rows: Mutex<Vec<ThingEntity>>,
    next_id: AtomicUsize,
    save_failure: Mutex<Option<String>>,
    fail_reads: Mutex<bool>,
    pub saves: AtomicUsize,
    pub reads: Arc<AtomicUsize>,
}

impl FakeThingRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_saves_with(&self, message: &str) {
        *self.save_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }

    /// Inserts a row directly, bypassing the command layer.
    pub fn seed(&self, entity_type: &str, guid: &str, name: &str) -> ThingEntity {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as EntityId + 1;
        let entity = ThingEntity {
            id: Some(id),
            guid: guid.to_string(),
            entity_type: entity_type.to_string(),
            name: name.to_string(),
            created_on: 1_700_000_000_000,
            updated_on: 1_700_000_000_000,
            version: 1,
        };
        self.rows.lock().unwrap().push(entity.clone());
        entity
    }

    pub fn rows(&self) -> Vec<ThingEntity> {
        self.rows.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read_failure(&self) -> Option<RepoError> {
        if *self.fail_reads.lock().unwrap() {
            Some(RepoError::Backend("disk unavailable".to_string()))
        } else {
            None
        }
    }
}

#[async_trait]
impl EntityRepository<ThingEntity> for FakeThingRepository {
    async fn save(&self, entity: ThingEntity) -> RepoResult<ThingEntity> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.save_failure.lock().unwrap().clone() {
            return Err(RepoError::Backend(message));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as EntityId + 1;
        let saved = ThingEntity {
            id: Some(id),
            created_on: 1_700_000_000_000,
            updated_on: 1_700_000_000_000,
            version: 1,
            ..entity
        };
        self.rows.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    async fn find_by_guid(&self, guid: &str) -> RepoResult<Option<ThingEntity>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.read_failure() {
            return Err(err);
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.guid == guid)
            .cloned())
    }

    fn find_all(&self) -> BoxStream<'static, RepoResult<ThingEntity>> {
        let reads = Arc::clone(&self.reads);
        let loaded = match self.read_failure() {
            Some(err) => Err(err),
            None => Ok(self.rows()),
        };
        stream::once(async move {
            reads.fetch_add(1, Ordering::SeqCst);
            loaded
        })
        .flat_map(|loaded| match loaded {
            Ok(rows) => stream::iter(rows.into_iter().map(Ok)).left_stream(),
            Err(err) => stream::iter(vec![Err(err)]).right_stream(),
        })
        .boxed()
    }
}

#[derive(Default)]
pub struct FakeLookupValueRepository {
    rows: Mutex<Vec<LookupValue>>,
    next_id: AtomicUsize,
    fail_on_save: Mutex<Option<usize>>,
    pub saves: AtomicUsize,
    pub reads: Arc<AtomicUsize>,
}

impl FakeLookupValueRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fails the nth save (1-based) and every later one.
    pub fn fail_on_save(&self, nth: usize) {
        *self.fail_on_save.lock().unwrap() = Some(nth);
    }

    pub fn rows(&self) -> Vec<LookupValue> {
        self.rows.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupValueRepository for FakeLookupValueRepository {
    async fn save(&self, value: LookupValue) -> RepoResult<LookupValue> {
        let attempt = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if matches!(*self.fail_on_save.lock().unwrap(), Some(nth) if attempt >= nth) {
            return Err(RepoError::Backend("lookup write rejected".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let saved = value.with_id(id);
        self.rows.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    fn find_by_entity_id(&self, entity_id: EntityId) -> BoxStream<'static, RepoResult<LookupValue>> {
        let reads = Arc::clone(&self.reads);
        // Stored in reverse to prove readers order by position, not arrival.
        let mut rows: Vec<LookupValue> = self
            .rows()
            .into_iter()
            .filter(|row| row.entity_id == entity_id)
            .collect();
        rows.reverse();
        stream::once(async move {
            reads.fetch_add(1, Ordering::SeqCst);
            rows
        })
        .flat_map(|rows| stream::iter(rows.into_iter().map(Ok)))
        .boxed()
    }
}

#[derive(Default)]
pub struct ScopeCounters {
    pub begins: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
}

/// Write scope whose transactions write straight through to the fakes.
#[derive(Clone)]
pub struct FakeWriteScope {
    things: Arc<FakeThingRepository>,
    lookups: Arc<FakeLookupValueRepository>,
    pub counters: Arc<ScopeCounters>,
}

impl FakeWriteScope {
    pub fn begins(&self) -> usize {
        self.counters.begins.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }
}

struct FakeTransaction {
    things: Arc<FakeThingRepository>,
    lookups: Arc<FakeLookupValueRepository>,
    counters: Arc<ScopeCounters>,
}

#[async_trait]
impl WriteScope<ThingEntity> for FakeWriteScope {
    async fn begin(&self) -> RepoResult<Box<dyn WriteTransaction<ThingEntity>>> {
        self.counters.begins.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeTransaction {
            things: Arc::clone(&self.things),
            lookups: Arc::clone(&self.lookups),
            counters: Arc::clone(&self.counters),
        }))
    }
}

#[async_trait]
impl WriteTransaction<ThingEntity> for FakeTransaction {
    fn entities(&self) -> &dyn EntityRepository<ThingEntity> {
        self.things.as_ref()
    }

    fn lookup_values(&self) -> &dyn LookupValueRepository {
        self.lookups.as_ref()
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct Harness {
    pub things: Arc<FakeThingRepository>,
    pub lookups: Arc<FakeLookupValueRepository>,
    pub utils: EntityUtils,
}

impl Harness {
    pub fn new() -> Self {
        let things = FakeThingRepository::new();
        let lookups = FakeLookupValueRepository::new();
        let utils = EntityUtils::new(lookups.clone(), test_config());
        Self {
            things,
            lookups,
            utils,
        }
    }

    pub fn write_scope(&self) -> FakeWriteScope {
        FakeWriteScope {
            things: Arc::clone(&self.things),
            lookups: Arc::clone(&self.lookups),
            counters: Arc::default(),
        }
    }

    pub fn commands(&self) -> ThingCommands {
        ThingCommands::new(self.things.clone(), self.utils.clone())
    }
}
