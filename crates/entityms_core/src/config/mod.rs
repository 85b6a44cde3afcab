//! Static service configuration.
//!
//! # Responsibility
//! - Load the entity-type table (entity type -> permitted attribute types).
//! - Carry logging and database bootstrap settings for the process.
//!
//! # Invariants
//! - Configuration is loaded and validated once at process start, then shared
//!   read-only (`Arc<EntityServiceConfig>`); nothing mutates it afterwards.
//! - Entity type names and property names are unique within their scope.

use crate::logging::default_log_level;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

static ENTITY_TYPE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("valid entity type regex"));
static PROPERTY_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid property regex"));

/// Configuration load and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config declares no entity types")]
    NoEntityTypes,
    #[error("invalid entity type name `{0}`")]
    InvalidEntityType(String),
    #[error("entity type `{0}` declared more than once")]
    DuplicateEntityType(String),
    #[error("invalid property name `{property}` for entity type `{entity_type}`")]
    InvalidProperty {
        entity_type: String,
        property: String,
    },
    #[error("property `{property}` declared more than once for entity type `{entity_type}`")]
    DuplicateProperty {
        entity_type: String,
        property: String,
    },
}

/// Top-level service configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(flatten)]
    pub entity_service: EntityServiceConfig,
}

impl ServiceConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.entity_service.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

/// Logging settings. No `dir` means file logging stays disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

fn default_level() -> String {
    default_log_level().to_string()
}

/// Database settings. No `path` selects an in-memory database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Entity-type table consulted by the lookup/entity utilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityServiceConfig {
    #[serde(default)]
    entities: Vec<EntityType>,
}

impl EntityServiceConfig {
    /// Builds a validated table from entity type declarations.
    pub fn new(entities: Vec<EntityType>) -> Result<Self, ConfigError> {
        let config = Self { entities };
        config.validate()?;
        Ok(config)
    }

    pub fn entities(&self) -> &[EntityType] {
        &self.entities
    }

    /// Finds one entity type by exact name.
    ///
    /// The table is small, so a linear scan is used.
    pub fn find_entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entities
            .iter()
            .find(|entity_type| entity_type.type_name == name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.entities.is_empty() {
            return Err(ConfigError::NoEntityTypes);
        }

        let mut seen = BTreeSet::new();
        for entity_type in &self.entities {
            if !ENTITY_TYPE_NAME_RE.is_match(&entity_type.type_name) {
                return Err(ConfigError::InvalidEntityType(
                    entity_type.type_name.clone(),
                ));
            }
            if !seen.insert(entity_type.type_name.as_str()) {
                return Err(ConfigError::DuplicateEntityType(
                    entity_type.type_name.clone(),
                ));
            }
            entity_type.validate()?;
        }
        Ok(())
    }
}

/// One configured entity type and its permitted attribute ("property") types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    properties: Vec<String>,
}

impl EntityType {
    pub fn new(type_name: impl Into<String>, properties: &[&str]) -> Self {
        Self {
            type_name: type_name.into(),
            properties: properties.iter().map(|value| value.to_string()).collect(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Returns the declared property with exactly this name.
    pub fn find_property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .map(String::as_str)
            .find(|property| *property == name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for property in &self.properties {
            if !PROPERTY_NAME_RE.is_match(property) {
                return Err(ConfigError::InvalidProperty {
                    entity_type: self.type_name.clone(),
                    property: property.clone(),
                });
            }
            if !seen.insert(property.as_str()) {
                return Err(ConfigError::DuplicateProperty {
                    entity_type: self.type_name.clone(),
                    property: property.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EntityServiceConfig, EntityType, ServiceConfig};

    const SAMPLE: &str = r#"{
        "logging": { "level": "warn" },
        "entities": [
            { "type": "item", "properties": ["TAG", "COLOR"] },
            { "type": "widget" }
        ]
    }"#;

    #[test]
    fn parses_entity_table_and_defaults() {
        let config = ServiceConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.dir.is_none());
        assert!(config.database.path.is_none());

        let item = config.entity_service.find_entity_type("item").unwrap();
        assert_eq!(item.find_property("TAG"), Some("TAG"));
        assert_eq!(item.find_property("tag"), None);
        assert!(config
            .entity_service
            .find_entity_type("widget")
            .unwrap()
            .properties()
            .is_empty());
        assert!(config.entity_service.find_entity_type("gadget").is_none());
    }

    #[test]
    fn rejects_duplicate_entity_types() {
        let err = EntityServiceConfig::new(vec![
            EntityType::new("item", &["TAG"]),
            EntityType::new("item", &[]),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEntityType(name) if name == "item"));
    }

    #[test]
    fn rejects_malformed_names() {
        let err = EntityServiceConfig::new(vec![EntityType::new("Item", &[])]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEntityType(_)));

        let err = EntityServiceConfig::new(vec![EntityType::new("item", &["bad tag"])]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProperty { .. }));

        let err =
            EntityServiceConfig::new(vec![EntityType::new("item", &["TAG", "TAG"])]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateProperty { .. }));
    }

    #[test]
    fn rejects_empty_entity_table() {
        let err = ServiceConfig::from_json_str("{}").unwrap_err();
        assert!(matches!(err, ConfigError::NoEntityTypes));
    }
}
