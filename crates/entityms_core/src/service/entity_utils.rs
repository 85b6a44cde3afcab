//! Lookup/entity utilities shared by the generic commands.
//!
//! # Responsibility
//! - Write lookup rows for a newly created entity.
//! - Fetch and group lookup rows for a read, honoring the projection.
//! - Resolve entity-type configuration.
//!
//! # Invariants
//! - Attribute types are validated before any lookup row is written.
//! - Values keep their per-type input order from write through read.
//! - Reads below [`Projection::ATTRIBUTE_THRESHOLD`] never touch lookup storage.

use crate::config::{EntityServiceConfig, EntityType};
use crate::model::entity::{Details, Entity, EntityId, Resource};
use crate::model::lookup_value::{self, group_values, LookupValue};
use crate::model::projection::Projection;
use crate::repo::{LookupValueRepository, RepoError, RepoResult};
use crate::service::error::{EntityError, EntityResult};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;
use std::sync::Arc;

/// Upper bound on lookup-row writes in flight for one create.
pub const LOOKUP_WRITE_CONCURRENCY: usize = 4;

/// Mediates between entities and their lookup values.
#[derive(Clone)]
pub struct EntityUtils {
    lookup_values: Arc<dyn LookupValueRepository>,
    config: Arc<EntityServiceConfig>,
}

impl EntityUtils {
    pub fn new(
        lookup_values: Arc<dyn LookupValueRepository>,
        config: Arc<EntityServiceConfig>,
    ) -> Self {
        Self {
            lookup_values,
            config,
        }
    }

    pub(crate) fn lookup_values(&self) -> &dyn LookupValueRepository {
        self.lookup_values.as_ref()
    }

    /// Returns the configuration for an entity type.
    pub fn find_entity_type(&self, name: &str) -> EntityResult<&EntityType> {
        self.config
            .find_entity_type(name)
            .ok_or_else(|| EntityError::UnknownEntityType(name.to_string()))
    }

    /// Fails on the first attribute type the entity type does not declare.
    pub fn validate_attribute_types(
        &self,
        entity_type: &EntityType,
        details: &Details,
    ) -> EntityResult<()> {
        match details
            .keys()
            .find(|value_type| entity_type.find_property(value_type).is_none())
        {
            Some(unknown) => Err(EntityError::UnknownAttributeType {
                entity_type: entity_type.type_name().to_string(),
                attribute_type: unknown.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Writes one lookup row per value through `repository` and returns what
    /// was written, grouped.
    ///
    /// `repository` is this utility's own store or one bound to an open write
    /// transaction. Writes run as a bounded pipeline; the first failure aborts
    /// the rest and is returned. Callers validate attribute types beforehand.
    pub async fn create_lookup_values(
        &self,
        repository: &dyn LookupValueRepository,
        entity_id: EntityId,
        details: &Details,
    ) -> RepoResult<Details> {
        let rows = lookup_rows(entity_id, details);
        if rows.is_empty() {
            return Ok(Details::new());
        }

        let row_count = rows.len();
        let saved: Vec<LookupValue> = stream::iter(rows)
            .map(|row| repository.save(row))
            .buffered(LOOKUP_WRITE_CONCURRENCY)
            .try_collect()
            .await?;
        debug!(
            "event=lookup_values_create module=service status=ok entity_id={entity_id} rows={row_count}"
        );

        Ok(group_values(saved))
    }

    /// Fetches and groups an entity's lookup values when the projection asks
    /// for them; otherwise returns an empty map without reading storage.
    pub async fn find_values_map(
        &self,
        entity_id: EntityId,
        projection: Projection,
    ) -> RepoResult<Details> {
        if !projection.includes_attributes() {
            return Ok(Details::new());
        }

        let values: Vec<LookupValue> = self
            .lookup_values
            .find_by_entity_id(entity_id)
            .try_collect()
            .await?;
        Ok(group_values(values))
    }

    /// Maps an entity to its resource and attaches the projected lookup values.
    pub async fn add_lookup_values<E, R>(
        &self,
        entity: &E,
        to_resource: &(dyn Fn(&E) -> R + Send + Sync),
        projection: Projection,
    ) -> RepoResult<R>
    where
        E: Entity,
        R: Resource,
    {
        let entity_id = persisted_id(entity)?;
        let details = self.find_values_map(entity_id, projection).await?;
        Ok(to_resource(entity).with_details(details))
    }

    /// Keeps only the values of one type from flat lookup rows.
    pub fn extract_values(values: &[LookupValue], value_type: &str) -> Vec<String> {
        lookup_value::extract_values(values, value_type)
    }

    /// Keeps only one type from an already grouped map.
    pub fn select_type(details: &Details, value_type: &str) -> Details {
        details
            .get_key_value(value_type)
            .map(|(key, values)| Details::from([(key.clone(), values.clone())]))
            .unwrap_or_default()
    }
}

/// Returns the storage id of a persisted entity.
pub(crate) fn persisted_id<E: Entity>(entity: &E) -> RepoResult<EntityId> {
    entity.id().ok_or_else(|| {
        RepoError::InvalidData(format!(
            "{} entity {} has no storage id",
            entity.entity_type(),
            entity.guid()
        ))
    })
}

fn lookup_rows(entity_id: EntityId, details: &Details) -> Vec<LookupValue> {
    details
        .iter()
        .flat_map(|(value_type, values)| {
            values.iter().enumerate().map(move |(position, value)| {
                LookupValue::new(
                    entity_id,
                    value_type.as_str(),
                    value.as_str(),
                    u32::try_from(position).unwrap_or(u32::MAX),
                )
            })
        })
        .collect()
}
