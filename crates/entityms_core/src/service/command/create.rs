//! Generic create command.

use super::{ToEntityFn, ToResourceFn};
use crate::model::entity::{generate_guid, Details, Entity, Resource, ResourceRequest};
use crate::repo::constraint::{sqlite_unique_violation, DuplicateDetector};
use crate::repo::{
    EntityRepository, LookupValueRepository, RepoError, RepoResult, WriteScope, WriteTransaction,
};
use crate::service::entity_utils::{persisted_id, EntityUtils};
use crate::service::error::{EntityError, EntityResult};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Creates an entity plus its lookup rows and returns the enriched resource.
///
/// # Contract
/// - The entity type must be configured and every supplied attribute type
///   declared for it; both are checked before anything is written.
/// - A fresh random guid is assigned; the request cannot choose it.
/// - With a write scope, the entity row and lookup rows are written through
///   the transaction's repositories and commit or roll back together; other
///   callers never observe them half-written. Without one, a failed lookup write leaves the entity row
///   persisted with no attributes.
pub struct CreateEntityCommand<Req, E, R> {
    to_entity: ToEntityFn<Req, E>,
    to_resource: ToResourceFn<E, R>,
    repository: Arc<dyn EntityRepository<E>>,
    utils: EntityUtils,
    write_scope: Option<Arc<dyn WriteScope<E>>>,
    is_duplicate: DuplicateDetector,
}

impl<Req, E, R> CreateEntityCommand<Req, E, R>
where
    Req: ResourceRequest,
    E: Entity,
    R: Resource,
{
    pub fn new(
        to_entity: ToEntityFn<Req, E>,
        to_resource: ToResourceFn<E, R>,
        repository: Arc<dyn EntityRepository<E>>,
        utils: EntityUtils,
    ) -> Self {
        Self {
            to_entity,
            to_resource,
            repository,
            utils,
            write_scope: None,
            is_duplicate: sqlite_unique_violation,
        }
    }

    /// Wraps each creation in one storage transaction.
    pub fn with_write_scope(self, write_scope: Arc<dyn WriteScope<E>>) -> Self {
        Self {
            write_scope: Some(write_scope),
            ..self
        }
    }

    /// Replaces the uniqueness-violation detector for another backend.
    pub fn with_duplicate_detector(self, is_duplicate: DuplicateDetector) -> Self {
        Self {
            is_duplicate,
            ..self
        }
    }

    pub async fn execute(&self, entity_type: &str, request: &Req) -> EntityResult<R> {
        let started_at = Instant::now();
        debug!("event=entity_create module=command status=start entity_type={entity_type}");

        let result = self.create(entity_type, request).await;
        match &result {
            Ok((entity, _)) => info!(
                "event=entity_create module=command status=ok entity_type={entity_type} guid={} duration_ms={}",
                entity.guid(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=entity_create module=command status=error entity_type={entity_type} duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }

        let (entity, details) = result?;
        Ok((self.to_resource)(&entity).with_details(details))
    }

    async fn create(&self, entity_type: &str, request: &Req) -> EntityResult<(E, Details)> {
        let config = self.utils.find_entity_type(entity_type)?;
        self.utils
            .validate_attribute_types(config, request.details())?;

        let written = match &self.write_scope {
            Some(scope) => {
                let transaction = scope
                    .begin()
                    .await
                    .map_err(|err| self.classify(entity_type, err))?;
                let written = self
                    .write(
                        entity_type,
                        request,
                        transaction.entities(),
                        transaction.lookup_values(),
                    )
                    .await;
                finish(transaction, written).await
            }
            None => {
                self.write(
                    entity_type,
                    request,
                    self.repository.as_ref(),
                    self.utils.lookup_values(),
                )
                .await
            }
        };
        written.map_err(|err| self.classify(entity_type, err))
    }

    async fn write(
        &self,
        entity_type: &str,
        request: &Req,
        entities: &dyn EntityRepository<E>,
        lookup_values: &dyn LookupValueRepository,
    ) -> RepoResult<(E, Details)> {
        let entity = (self.to_entity)(entity_type, request).with_guid(generate_guid().to_string());
        let saved = entities.save(entity).await?;
        let entity_id = persisted_id(&saved)?;
        let details = self
            .utils
            .create_lookup_values(lookup_values, entity_id, request.details())
            .await?;
        Ok((saved, details))
    }

    fn classify(&self, entity_type: &str, err: RepoError) -> EntityError {
        if (self.is_duplicate)(&err) {
            EntityError::DuplicateEntity {
                entity_type: entity_type.to_string(),
            }
        } else {
            EntityError::command(format!("create {entity_type}"), err)
        }
    }
}

async fn finish<E: Entity, T>(
    transaction: Box<dyn WriteTransaction<E>>,
    written: RepoResult<T>,
) -> RepoResult<T> {
    match written {
        Ok(value) => {
            transaction.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = transaction.rollback().await {
                warn!(
                    "event=entity_create module=command status=error error_code=rollback_failed error={rollback_err}"
                );
            }
            Err(err)
        }
    }
}
