//! Concrete commands for [`ThingEntity`].

use crate::config::EntityServiceConfig;
use crate::model::projection::Projection;
use crate::model::thing::{
    thing_entity_to_resource, thing_request_to_entity, ThingEntity, ThingRequest, ThingResource,
};
use crate::repo::lookup_value_repo::SqliteLookupValueRepository;
use crate::repo::sqlite::SqliteStore;
use crate::repo::thing_repo::SqliteThingRepository;
use crate::repo::EntityRepository;
use crate::service::command::{CreateEntityCommand, FindEntityCommand, GetEntitiesCommand};
use crate::service::entity_utils::EntityUtils;
use crate::service::error::EntityResult;
use futures::stream::BoxStream;
use std::sync::Arc;

pub type CreateThingCommand = CreateEntityCommand<ThingRequest, ThingEntity, ThingResource>;
pub type FindThingCommand = FindEntityCommand<ThingEntity, ThingResource>;
pub type GetThingsCommand = GetEntitiesCommand<ThingEntity, ThingResource>;

pub fn create_thing_command(
    repository: Arc<dyn EntityRepository<ThingEntity>>,
    utils: EntityUtils,
) -> CreateThingCommand {
    CreateEntityCommand::new(
        Arc::new(thing_request_to_entity),
        Arc::new(thing_entity_to_resource),
        repository,
        utils,
    )
}

pub fn find_thing_command(
    repository: Arc<dyn EntityRepository<ThingEntity>>,
    utils: EntityUtils,
) -> FindThingCommand {
    FindEntityCommand::new(Arc::new(thing_entity_to_resource), repository, utils)
}

pub fn get_things_command(
    repository: Arc<dyn EntityRepository<ThingEntity>>,
    utils: EntityUtils,
) -> GetThingsCommand {
    GetEntitiesCommand::new(Arc::new(thing_entity_to_resource), repository, utils)
}

/// Create/Find/List triple for things, as consumed by a boundary layer.
pub struct ThingCommands {
    create: CreateThingCommand,
    find: FindThingCommand,
    list: GetThingsCommand,
}

impl ThingCommands {
    pub fn new(repository: Arc<dyn EntityRepository<ThingEntity>>, utils: EntityUtils) -> Self {
        Self {
            create: create_thing_command(Arc::clone(&repository), utils.clone()),
            find: find_thing_command(Arc::clone(&repository), utils.clone()),
            list: get_things_command(repository, utils),
        }
    }

    /// Wires SQLite repositories over one store, with transactional creates.
    pub fn sqlite(store: SqliteStore, config: Arc<EntityServiceConfig>) -> Self {
        let repository: Arc<dyn EntityRepository<ThingEntity>> =
            Arc::new(SqliteThingRepository::new(store.clone()));
        let utils = EntityUtils::new(
            Arc::new(SqliteLookupValueRepository::new(store.clone())),
            config,
        );
        let commands = Self::new(repository, utils);
        Self {
            create: commands.create.with_write_scope(Arc::new(store)),
            ..commands
        }
    }

    pub async fn create(
        &self,
        entity_type: &str,
        request: &ThingRequest,
    ) -> EntityResult<ThingResource> {
        self.create.execute(entity_type, request).await
    }

    pub async fn find(
        &self,
        entity_type: &str,
        guid: &str,
        projection: Projection,
    ) -> EntityResult<ThingResource> {
        self.find.execute(entity_type, guid, projection).await
    }

    pub fn list(&self, entity_type: &str) -> BoxStream<'static, EntityResult<ThingResource>> {
        self.list.execute(entity_type)
    }
}
