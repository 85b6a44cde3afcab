//! Entity, resource and request contracts.

use std::collections::BTreeMap;
use uuid::Uuid;

/// Storage-assigned numeric identity. Never exposed on resources.
pub type EntityId = i64;

/// Attribute type -> ordered values, e.g. `TAG -> ["red", "blue"]`.
///
/// Keys are ordered for stable output; each value list keeps insertion order.
pub type Details = BTreeMap<String, Vec<String>>;

/// Attribute type used for free-form tags.
pub const TAG_VALUE_TYPE: &str = "TAG";

/// A persisted domain record.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Storage-assigned id; `None` until persisted.
    fn id(&self) -> Option<EntityId>;

    /// External identifier; empty until assigned at creation.
    fn guid(&self) -> &str;

    /// Entity-type discriminator (e.g. `item`).
    fn entity_type(&self) -> &str;

    /// Returns a copy carrying the given external identifier.
    fn with_guid(self, guid: String) -> Self;
}

/// External representation of an entity.
pub trait Resource: Clone + Send + Sync + 'static {
    fn details(&self) -> &Details;

    /// Returns a copy carrying the given attribute values.
    fn with_details(self, details: Details) -> Self;
}

/// Inbound create request. Attribute values travel alongside the typed fields.
pub trait ResourceRequest: Send + Sync {
    fn details(&self) -> &Details;
}

/// Generates a fresh external identifier (random v4 UUID).
///
/// Random rather than sequential so identifiers cannot be enumerated.
pub fn generate_guid() -> Uuid {
    Uuid::new_v4()
}
