//! Service: callable commands declared by the hub, and calls to them.
//!
//! Examples: `light.turn_on`, `switch.toggle`, `climate.set_temperature`.

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::inference::AttributeType;

/// All services of one domain, as listed in the hub's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDomainDescriptor {
    pub domain: String,
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
}

/// One declared service and its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<ServiceFieldDescriptor>,
}

/// One declared field of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFieldDescriptor {
    pub name: String,
    /// Declared type name, `None` when the catalog leaves it open.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl ServiceFieldDescriptor {
    /// Map the declared type name onto a scalar type.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::UnknownFieldType`] for names outside the
    /// known vocabulary.
    pub fn resolved_type(&self, domain: &str, service: &str) -> Result<AttributeType, GenerationError> {
        let Some(type_name) = self.type_name.as_deref() else {
            return Ok(AttributeType::Opaque);
        };
        match type_name {
            "string" | "text" | "entity" | "select" | "time" | "date" | "datetime" | "color"
            | "icon" | "template" => Ok(AttributeType::String),
            "number" | "integer" | "float" => Ok(AttributeType::Number),
            "boolean" | "bool" => Ok(AttributeType::Boolean),
            "object" | "any" | "json" | "list" | "target" | "area" | "device" => {
                Ok(AttributeType::Opaque)
            }
            other => Err(GenerationError::UnknownFieldType {
                domain: domain.to_string(),
                service: service.to_string(),
                field: self.name.clone(),
                type_name: other.to_string(),
            }),
        }
    }
}

/// Entities addressed by a service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTarget {
    Entity(String),
    Entities(Vec<String>),
}

impl ServiceTarget {
    /// Every targeted entity id.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<&str> {
        match self {
            Self::Entity(id) => vec![id.as_str()],
            Self::Entities(ids) => ids.iter().map(String::as_str).collect(),
        }
    }
}

/// A fully resolved request handed to the state bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub target: ServiceTarget,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(type_name: Option<&str>) -> ServiceFieldDescriptor {
        ServiceFieldDescriptor {
            name: "brightness".to_string(),
            type_name: type_name.map(str::to_string),
            required: false,
            description: None,
        }
    }

    #[test]
    fn should_map_known_type_names() {
        assert_eq!(
            field(Some("number")).resolved_type("light", "turn_on"),
            Ok(AttributeType::Number)
        );
        assert_eq!(
            field(Some("text")).resolved_type("light", "turn_on"),
            Ok(AttributeType::String)
        );
        assert_eq!(
            field(Some("boolean")).resolved_type("light", "turn_on"),
            Ok(AttributeType::Boolean)
        );
        assert_eq!(
            field(Some("object")).resolved_type("light", "turn_on"),
            Ok(AttributeType::Opaque)
        );
    }

    #[test]
    fn should_resolve_missing_type_to_opaque() {
        assert_eq!(
            field(None).resolved_type("light", "turn_on"),
            Ok(AttributeType::Opaque)
        );
    }

    #[test]
    fn should_reject_unknown_type_name() {
        let err = field(Some("quaternion"))
            .resolved_type("light", "turn_on")
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::UnknownFieldType {
                domain: "light".to_string(),
                service: "turn_on".to_string(),
                field: "brightness".to_string(),
                type_name: "quaternion".to_string(),
            }
        );
    }

    #[test]
    fn should_list_target_entity_ids() {
        let target = ServiceTarget::Entities(vec!["a.b".to_string(), "a.c".to_string()]);
        assert_eq!(target.entity_ids(), vec!["a.b", "a.c"]);
        assert_eq!(ServiceTarget::Entity("a.b".to_string()).entity_ids(), vec!["a.b"]);
    }

    #[test]
    fn should_deserialize_catalog_with_defaults() {
        let json = r#"{"domain": "light", "services": [{"name": "turn_on", "fields": [{"name": "brightness", "type": "number"}]}]}"#;
        let descriptor: ServiceDomainDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.services[0].fields[0].type_name.as_deref(), Some("number"));
        assert!(!descriptor.services[0].fields[0].required);
    }
}
