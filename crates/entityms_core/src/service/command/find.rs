//! Generic find-by-guid command.

use super::ToResourceFn;
use crate::model::entity::{Entity, Resource};
use crate::model::projection::Projection;
use crate::repo::EntityRepository;
use crate::service::entity_utils::EntityUtils;
use crate::service::error::{EntityError, EntityResult};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

/// Loads one entity by guid and attaches lookup values per the projection.
///
/// An entity stored under a different entity type is reported as not found.
pub struct FindEntityCommand<E, R> {
    to_resource: ToResourceFn<E, R>,
    repository: Arc<dyn EntityRepository<E>>,
    utils: EntityUtils,
}

impl<E, R> FindEntityCommand<E, R>
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

    pub async fn execute(
        &self,
        entity_type: &str,
        guid: &str,
        projection: Projection,
    ) -> EntityResult<R> {
        let started_at = Instant::now();
        debug!(
            "event=entity_find module=command status=start entity_type={entity_type} guid={guid} projection={projection}"
        );
        let result = self.find(entity_type, guid, projection).await;
        match &result {
            Ok(_) => debug!(
                "event=entity_find module=command status=ok entity_type={entity_type} guid={guid} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=entity_find module=command status=error entity_type={entity_type} guid={guid} duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }
        result
    }

    async fn find(&self, entity_type: &str, guid: &str, projection: Projection) -> EntityResult<R> {
        self.utils.find_entity_type(entity_type)?;
        let operation = || format!("find {entity_type}");

        let entity = self
            .repository
            .find_by_guid(guid)
            .await
            .map_err(|err| EntityError::command(operation(), err))?
            .filter(|entity| entity.entity_type() == entity_type)
            .ok_or_else(|| EntityError::EntityNotFound {
                entity_type: entity_type.to_string(),
                guid: guid.to_string(),
            })?;

        self.utils
            .add_lookup_values(&entity, &*self.to_resource, projection)
            .await
            .map_err(|err| EntityError::command(operation(), err))
    }
}
