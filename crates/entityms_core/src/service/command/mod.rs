//! Generic Create/Find/List commands over (request, entity, resource) triples.
//!
//! Each command is built from injected pure mapping functions, an entity
//! repository and [`EntityUtils`](crate::service::entity_utils::EntityUtils).
//! Concrete entity types only supply those parts.

use std::sync::Arc;

mod create;
mod find;
mod list;

pub use create::CreateEntityCommand;
pub use find::FindEntityCommand;
pub use list::GetEntitiesCommand;

/// Maps `(entity_type, request)` to a new, unsaved entity.
pub type ToEntityFn<Req, E> = Arc<dyn Fn(&str, &Req) -> E + Send + Sync>;

/// Maps an entity to its resource, without attribute values.
pub type ToResourceFn<E, R> = Arc<dyn Fn(&E) -> R + Send + Sync>;
