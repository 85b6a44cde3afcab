//! Generic list command.

use super::ToResourceFn;
use crate::model::entity::{Entity, Resource};
use crate::repo::EntityRepository;
use crate::service::entity_utils::EntityUtils;
use crate::service::error::{EntityError, EntityResult};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Streams every entity of one type as resources.
///
/// List views never carry lookup values; only the summary mapping is applied.
pub struct GetEntitiesCommand<E, R> {
    to_resource: ToResourceFn<E, R>,
    repository: Arc<dyn EntityRepository<E>>,
    utils: EntityUtils,
}

impl<E, R> GetEntitiesCommand<E, R>
where
    E: Entity,
    R: Resource,
{
    pub fn new(
        to_resource: ToResourceFn<E, R>,
        repository: Arc<dyn EntityRepository<E>>,
        utils: EntityUtils,
    ) -> Self {
        Self {
            to_resource,
            repository,
            utils,
        }
    }

    /// Returns a lazy stream; storage is read only once it is polled.
    ///
    /// Logs `status=ok` with the yielded count once the stream is exhausted,
    /// or `status=error` for a failure.
    pub fn execute(&self, entity_type: &str) -> BoxStream<'static, EntityResult<R>> {
        let started_at = Instant::now();
        if let Err(err) = self.utils.find_entity_type(entity_type) {
            warn!(
                "event=entity_list module=command status=error entity_type={entity_type} duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.code()
            );
            return stream::iter([Err(err)]).boxed();
        }
        debug!("event=entity_list module=command status=start entity_type={entity_type}");

        let wanted = entity_type.to_string();
        let operation = format!("retrieve all {entity_type}");
        let failed_type = entity_type.to_string();
        let done_type = entity_type.to_string();
        let to_resource = Arc::clone(&self.to_resource);
        let yielded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicBool::new(false));
        let (yielded_tally, failed_flag) = (Arc::clone(&yielded), Arc::clone(&failed));

        let resources = self
            .repository
            .find_all()
            .try_filter(move |entity| future::ready(entity.entity_type() == wanted))
            .map_ok(move |entity| to_resource(&entity))
            .map_err(move |err| EntityError::command(operation.clone(), err))
            .inspect(move |item| match item {
                Ok(_) => {
                    yielded_tally.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    failed_flag.store(true, Ordering::Relaxed);
                    warn!(
                        "event=entity_list module=command status=error entity_type={failed_type} duration_ms={} error_code={} error={err}",
                        started_at.elapsed().as_millis(),
                        err.code()
                    );
                }
            })
            .map(Some);

        let completion = stream::once(async move {
            if !failed.load(Ordering::Relaxed) {
                debug!(
                    "event=entity_list module=command status=ok entity_type={done_type} count={} duration_ms={}",
                    yielded.load(Ordering::Relaxed),
                    started_at.elapsed().as_millis()
                );
            }
            None
        });

        resources.chain(completion).filter_map(future::ready).boxed()
    }
}
