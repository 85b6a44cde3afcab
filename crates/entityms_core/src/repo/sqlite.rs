//! Shared SQLite handle for async repositories.
//!
//! # Responsibility
//! - Run blocking `rusqlite` calls off the async executor.
//! - Provide write transactions spanning entity and lookup-row writes.
//!
//! # Invariants
//! - Plain calls share the connection under a read lock; an open session holds
//!   the write lock, so nothing outside it runs until commit or rollback.
//! - Calls bound to a session run only while that session is open; a call
//!   still queued when the session ends is refused, never run in autocommit.
//! - A session dropped without commit is rolled back.

use crate::model::entity::Entity;
use crate::repo::{EntityRepository, LookupValueRepository, RepoError, RepoResult, WriteTransaction};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use log::{debug, warn};
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

/// Cloneable handle over one migrated SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    access: Arc<RwLock<()>>,
    /// Open flag of the session this handle is bound to, if any.
    session: Option<Arc<AtomicBool>>,
}

impl SqliteStore {
    /// Wraps a connection returned by `db::open_db*`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            access: Arc::new(RwLock::new(())),
            session: None,
        }
    }

    /// Runs `f` against the connection on the blocking thread pool.
    pub async fn call<F, T>(&self, f: F) -> RepoResult<T>
    where
        F: FnOnce(&Connection) -> RepoResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        match &self.session {
            Some(open) => {
                let open = Arc::clone(open);
                run_blocking(move || {
                    let guard = conn.lock().map_err(|_| RepoError::ConnectionPoisoned)?;
                    if !open.load(Ordering::SeqCst) {
                        return Err(RepoError::TransactionClosed);
                    }
                    f(&guard)
                })
                .await
            }
            None => {
                // Moved into the blocking task: released only once `f` is done,
                // even if this future is dropped first.
                let access = Arc::clone(&self.access).read_owned().await;
                run_blocking(move || {
                    let _access = access;
                    let guard = conn.lock().map_err(|_| RepoError::ConnectionPoisoned)?;
                    f(&guard)
                })
                .await
            }
        }
    }

    /// Lazily runs a loading query and yields its rows one by one.
    pub fn stream_rows<F, T>(&self, load: F) -> BoxStream<'static, RepoResult<T>>
    where
        F: FnOnce(&Connection) -> RepoResult<Vec<T>> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        stream::once(async move { store.call(load).await })
            .flat_map(|loaded| match loaded {
                Ok(rows) => stream::iter(rows.into_iter().map(Ok)).left_stream(),
                Err(err) => stream::iter(vec![Err(err)]).right_stream(),
            })
            .boxed()
    }

    /// Waits for exclusive use of the connection and opens a transaction.
    pub async fn begin_session(&self) -> RepoResult<SqliteSession> {
        if self.session.is_some() {
            return Err(RepoError::InvalidData(
                "write transactions do not nest".to_string(),
            ));
        }

        let access = Arc::clone(&self.access).write_owned().await;
        let conn = Arc::clone(&self.conn);
        let unbound = self.clone();
        // Built inside the blocking task so an abandoned `begin` still ends in
        // a session whose drop rolls back.
        let session = run_blocking(move || {
            {
                let guard = conn.lock().map_err(|_| RepoError::ConnectionPoisoned)?;
                guard.execute_batch("BEGIN IMMEDIATE;")?;
            }
            let open = Arc::new(AtomicBool::new(true));
            Ok(SqliteSession {
                store: SqliteStore {
                    session: Some(Arc::clone(&open)),
                    ..unbound
                },
                open,
                _access: access,
            })
        })
        .await?;
        debug!("event=tx_begin module=repo status=ok");
        Ok(session)
    }
}

async fn run_blocking<F, T>(f: F) -> RepoResult<T>
where
    F: FnOnce() -> RepoResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| RepoError::Task(err.to_string()))?
}

/// Exclusive transaction on a [`SqliteStore`].
///
/// Repositories built over [`SqliteSession::store`] write inside the
/// transaction; every other handle waits until it ends.
pub struct SqliteSession {
    store: SqliteStore,
    open: Arc<AtomicBool>,
    _access: OwnedRwLockWriteGuard<()>,
}

impl SqliteSession {
    /// Handle bound to this session.
    pub fn store(&self) -> SqliteStore {
        self.store.clone()
    }

    pub async fn commit(self) -> RepoResult<()> {
        self.finish("COMMIT;").await
    }

    pub async fn rollback(self) -> RepoResult<()> {
        self.finish("ROLLBACK;").await
    }

    async fn finish(self, sql: &'static str) -> RepoResult<()> {
        let open = Arc::clone(&self.open);
        let result = self
            .store
            .call(move |conn| {
                let outcome = conn.execute_batch(sql);
                // A failed COMMIT can leave the transaction open for drop to roll back.
                open.store(!conn.is_autocommit(), Ordering::SeqCst);
                Ok(outcome?)
            })
            .await;
        debug!(
            "event=tx_end module=repo status={} statement={}",
            if result.is_ok() { "ok" } else { "error" },
            sql.trim_end_matches(';')
        );
        result
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if !self.open.load(Ordering::SeqCst) {
            return;
        }
        // Abandoned mid-flight: roll back before the write lock is released.
        let rolled_back = match self.store.conn.lock() {
            Ok(conn) => {
                self.open.store(false, Ordering::SeqCst);
                conn.execute_batch("ROLLBACK;").map_err(|err| err.to_string())
            }
            Err(_) => Err("connection poisoned".to_string()),
        };
        if let Err(err) = rolled_back {
            warn!("event=tx_abandon module=repo status=error error={err}");
        } else {
            warn!("event=tx_abandon module=repo status=ok");
        }
    }
}

/// [`WriteTransaction`] over a session and repositories bound to it.
pub struct SqliteWriteTransaction<E> {
    session: SqliteSession,
    entities: Arc<dyn EntityRepository<E>>,
    lookup_values: Arc<dyn LookupValueRepository>,
}

impl<E: Entity> SqliteWriteTransaction<E> {
    /// `entities` and `lookup_values` must be built over `session.store()`.
    pub fn new(
        session: SqliteSession,
        entities: Arc<dyn EntityRepository<E>>,
        lookup_values: Arc<dyn LookupValueRepository>,
    ) -> Self {
        Self {
            session,
            entities,
            lookup_values,
        }
    }
}

#[async_trait]
impl<E: Entity> WriteTransaction<E> for SqliteWriteTransaction<E> {
    fn entities(&self) -> &dyn EntityRepository<E> {
        self.entities.as_ref()
    }

    fn lookup_values(&self) -> &dyn LookupValueRepository {
        self.lookup_values.as_ref()
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let Self { session, .. } = *self;
        session.commit().await
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        let Self { session, .. } = *self;
        session.rollback().await
    }
}
