//! Generic entity command service core.
//!
//! Entities carry typed columns plus ordered string attributes ("lookup
//! values", e.g. tags) stored in a separate table. This crate provides the
//! generic Create/Find/List commands, the lookup-value subsystem and the
//! projection policy deciding how much attribute data a read materializes.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, EntityServiceConfig, EntityType, ServiceConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::entity::{
    generate_guid, Details, Entity, EntityId, Resource, ResourceRequest, TAG_VALUE_TYPE,
};
pub use model::lookup_value::LookupValue;
pub use model::projection::{Projection, ProjectionParseError, View};
pub use model::thing::{ThingEntity, ThingRequest, ThingResource};
pub use repo::constraint::{sqlite_unique_violation, DuplicateDetector};
pub use repo::lookup_value_repo::SqliteLookupValueRepository;
pub use repo::sqlite::{SqliteSession, SqliteStore, SqliteWriteTransaction};
pub use repo::thing_repo::SqliteThingRepository;
pub use repo::{
    EntityRepository, LookupValueRepository, RepoError, RepoResult, WriteScope, WriteTransaction,
};
pub use service::command::{
    CreateEntityCommand, FindEntityCommand, GetEntitiesCommand, ToEntityFn, ToResourceFn,
};
pub use service::entity_utils::{EntityUtils, LOOKUP_WRITE_CONCURRENCY};
pub use service::error::{EntityError, EntityResult};
pub use service::thing_commands::{
    create_thing_command, find_thing_command, get_things_command, CreateThingCommand,
    FindThingCommand, GetThingsCommand, ThingCommands,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
