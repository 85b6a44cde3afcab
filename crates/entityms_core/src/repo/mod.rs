//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the storage capabilities the generic commands consume.
//! - Isolate SQL and backend error signatures from command logic.
//!
//! # Invariants
//! - `save` returns the entity/row with its storage-assigned id.
//! - Lookup rows are read back ordered by `position` within each type.
//! - Sequences are lazy: nothing touches storage until the stream is polled.

use crate::db::DbError;
use crate::model::entity::{Entity, EntityId};
use crate::model::lookup_value::LookupValue;
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub mod constraint;
pub mod lookup_value_repo;
pub mod sqlite;
pub mod thing_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level failure.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("storage connection poisoned by an earlier panic")]
    ConnectionPoisoned,
    #[error("storage task failed: {0}")]
    Task(String),
    #[error("write transaction already finished")]
    TransactionClosed,
    /// Failure reported by a non-SQLite backend, carried as its message.
    #[error("{0}")]
    Backend(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence capability for one entity kind.
#[async_trait]
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// Inserts the entity and returns it with its assigned id.
    async fn save(&self, entity: E) -> RepoResult<E>;

    async fn find_by_guid(&self, guid: &str) -> RepoResult<Option<E>>;

    fn find_all(&self) -> BoxStream<'static, RepoResult<E>>;
}

/// Append-only persistence for lookup value rows.
#[async_trait]
pub trait LookupValueRepository: Send + Sync {
    async fn save(&self, value: LookupValue) -> RepoResult<LookupValue>;

    fn find_by_entity_id(&self, entity_id: EntityId) -> BoxStream<'static, RepoResult<LookupValue>>;
}

/// Opens write transactions spanning several repository calls.
///
/// Backends without multi-statement transactions simply do not provide one.
#[async_trait]
pub trait WriteScope<E: Entity>: Send + Sync {
    async fn begin(&self) -> RepoResult<Box<dyn WriteTransaction<E>>>;
}

/// An open write transaction. Dropping it without `commit` rolls back.
///
/// Writes belonging to the transaction go through the repositories it hands
/// out; nothing outside it observes them before `commit`.
#[async_trait]
pub trait WriteTransaction<E: Entity>: Send + Sync {
    fn entities(&self) -> &dyn EntityRepository<E>;

    fn lookup_values(&self) -> &dyn LookupValueRepository;

    async fn commit(self: Box<Self>) -> RepoResult<()>;

    async fn rollback(self: Box<Self>) -> RepoResult<()>;
}
