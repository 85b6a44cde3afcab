//! Thing: the generalized entity whose type is chosen per request.
//!
//! One storage shape (`t_thing`) serves every configured entity type; the
//! `entity_type` column carries the discriminator.

use crate::model::entity::{Details, Entity, EntityId, Resource, ResourceRequest, TAG_VALUE_TYPE};
use crate::model::projection::{Projection, View};
use serde::{Deserialize, Serialize};

/// Persisted thing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThingEntity {
    pub id: Option<EntityId>,
    pub guid: String,
    pub entity_type: String,
    pub name: String,
    /// Unix epoch milliseconds, assigned by storage.
    pub created_on: i64,
    /// Unix epoch milliseconds, assigned by storage.
    pub updated_on: i64,
    pub version: i64,
}

impl Entity for ThingEntity {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn guid(&self) -> &str {
        &self.guid
    }

    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn with_guid(self, guid: String) -> Self {
        Self { guid, ..self }
    }
}

/// Create request for a thing of any configured type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingRequest {
    pub name: String,
    #[serde(default)]
    pub details: Details,
}

impl ThingRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: Details::new(),
        }
    }

    /// Appends one `TAG` value.
    pub fn with_tag(self, tag: impl Into<String>) -> Self {
        self.with_detail(TAG_VALUE_TYPE, tag)
    }

    /// Appends one value of the given attribute type.
    pub fn with_detail(mut self, value_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.details
            .entry(value_type.into())
            .or_default()
            .push(value.into());
        self
    }
}

impl ResourceRequest for ThingRequest {
    fn details(&self) -> &Details {
        &self.details
    }
}

/// Wire representation of a thing.
///
/// Detail-group fields are zero/empty after [`ThingResource::project`] with a
/// summary-level projection and are then omitted from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingResource {
    pub guid: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(flatten)]
    pub details: Details,
}

impl ThingResource {
    /// Values of the `TAG` attribute type, in insertion order.
    pub fn tags(&self) -> &[String] {
        self.details
            .get(TAG_VALUE_TYPE)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns a copy holding only the field groups the projection includes.
    pub fn project(self, projection: Projection) -> Self {
        if projection.includes(View::Detail) {
            return self;
        }
        Self {
            created_on: None,
            updated_on: None,
            version: None,
            details: Details::new(),
            ..self
        }
    }
}

impl Resource for ThingResource {
    fn details(&self) -> &Details {
        &self.details
    }

    fn with_details(self, details: Details) -> Self {
        Self { details, ..self }
    }
}

/// Maps a create request onto a new, not yet persisted entity.
pub fn thing_request_to_entity(entity_type: &str, request: &ThingRequest) -> ThingEntity {
    ThingEntity {
        id: None,
        guid: String::new(),
        entity_type: entity_type.to_string(),
        name: request.name.clone(),
        created_on: 0,
        updated_on: 0,
        version: 0,
    }
}

/// Maps an entity onto its resource, without attribute values.
pub fn thing_entity_to_resource(entity: &ThingEntity) -> ThingResource {
    ThingResource {
        guid: entity.guid.clone(),
        entity_type: entity.entity_type.clone(),
        name: entity.name.clone(),
        created_on: Some(entity.created_on),
        updated_on: Some(entity.updated_on),
        version: Some(entity.version),
        details: Details::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{thing_entity_to_resource, thing_request_to_entity, ThingRequest};
    use crate::model::entity::{Details, Entity, Resource};
    use crate::model::projection::Projection;

    #[test]
    fn request_builders_keep_value_order_per_type() {
        let request = ThingRequest::new("lamp")
            .with_tag("red")
            .with_detail("COLOR", "green")
            .with_tag("blue");
        assert_eq!(request.details["TAG"], vec!["red", "blue"]);
        assert_eq!(request.details["COLOR"], vec!["green"]);
    }

    #[test]
    fn mapping_pair_carries_type_and_hides_numeric_id() {
        let entity = thing_request_to_entity("item", &ThingRequest::new("lamp"))
            .with_guid("abc".to_string());
        assert_eq!(entity.entity_type(), "item");
        assert_eq!(entity.guid(), "abc");
        assert!(entity.id().is_none());

        let resource = thing_entity_to_resource(&entity);
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["type"], "item");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn with_details_returns_new_value() {
        let entity = thing_request_to_entity("item", &ThingRequest::new("lamp"));
        let original = thing_entity_to_resource(&entity);
        let mut details = Details::new();
        details.insert("TAG".to_string(), vec!["red".to_string()]);

        let enriched = original.clone().with_details(details);
        assert!(original.details.is_empty());
        assert_eq!(enriched.tags(), ["red".to_string()]);
    }

    #[test]
    fn summary_projection_drops_detail_fields() {
        let entity = thing_request_to_entity("item", &ThingRequest::new("lamp"));
        let mut details = Details::new();
        details.insert("TAG".to_string(), vec!["red".to_string()]);
        let resource = thing_entity_to_resource(&entity).with_details(details);

        let summary = resource.clone().project(Projection::Summary);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("version").is_none());
        assert!(json.get("TAG").is_none());
        assert_eq!(json["name"], "lamp");

        let detailed = resource.project(Projection::Details);
        let json = serde_json::to_value(&detailed).unwrap();
        assert_eq!(json["TAG"], serde_json::json!(["red"]));
        assert_eq!(json["version"], 0);
    }
}
