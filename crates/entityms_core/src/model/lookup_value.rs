//! Lookup value rows: typed, ordered attribute values owned by one entity.

use crate::model::entity::{Details, EntityId};
use serde::{Deserialize, Serialize};

/// One attribute value attached to an entity.
///
/// Rows are append-only. `position` is the zero-based index of the value
/// within its `(entity_id, value_type)` group and defines read order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupValue {
    /// Storage-assigned row id; `None` until persisted.
    pub id: Option<i64>,
    pub entity_id: EntityId,
    pub value_type: String,
    pub value: String,
    pub position: u32,
}

impl LookupValue {
    pub fn new(
        entity_id: EntityId,
        value_type: impl Into<String>,
        value: impl Into<String>,
        position: u32,
    ) -> Self {
        Self {
            id: None,
            entity_id,
            value_type: value_type.into(),
            value: value.into(),
            position,
        }
    }

    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
}

/// Groups rows by value type, ordering each group by `position`.
///
/// Rows with equal positions keep their input order.
pub fn group_values(values: Vec<LookupValue>) -> Details {
    let mut ordered = values;
    ordered.sort_by_key(|value| value.position);

    let mut details = Details::new();
    for value in ordered {
        details
            .entry(value.value_type)
            .or_default()
            .push(value.value);
    }
    details
}

/// Keeps only the values of one type, in input order.
pub fn extract_values(values: &[LookupValue], value_type: &str) -> Vec<String> {
    values
        .iter()
        .filter(|value| value.value_type == value_type)
        .map(|value| value.value.clone())
        .collect()
}
