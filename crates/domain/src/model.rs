//! Generated model: the declarative list of types produced from a hub
//! snapshot.
//!
//! The model is the stable contract between generation and rendering:
//! renderers only ever read it, and it carries everything they need
//! (identifiers, source keys, scalar types, entity ids).

mod generator;

use serde::{Deserialize, Serialize};

use crate::inference::AttributeType;

pub use generator::generate;

/// Name of the root entity aggregator.
pub const ENTITIES_TYPE_NAME: &str = "Entities";

/// Name of the root service aggregator.
pub const SERVICES_TYPE_NAME: &str = "Services";

/// Name of the registration helper.
pub const REGISTRATION_TYPE_NAME: &str = "Registration";

/// Ordered, immutable output of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedModel {
    pub types: Vec<TypeDefinition>,
}

impl GeneratedModel {
    /// Look up a definition by its top-level name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.iter().find(|t| t.name() == name)
    }

    /// Every top-level name, in model order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(TypeDefinition::name).collect()
    }
}

/// One generated type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDefinition {
    Registration(Registration),
    RootEntities(RootAggregator),
    DomainEntities(DomainAggregator),
    Entity(EntityType),
    AttributeRecord(FieldRecord),
    RootServices(RootAggregator),
    ServiceGroup(ServiceGroup),
    ServiceParameters(FieldRecord),
    EntityExtensions(EntityExtensions),
}

impl TypeDefinition {
    /// Top-level type name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Registration(r) => &r.name,
            Self::RootEntities(r) | Self::RootServices(r) => &r.name,
            Self::DomainEntities(d) => &d.name,
            Self::Entity(e) => &e.name,
            Self::AttributeRecord(r) | Self::ServiceParameters(r) => &r.name,
            Self::ServiceGroup(g) => &g.name,
            Self::EntityExtensions(e) => &e.name,
        }
    }

    /// Short description of what produced this definition, for errors.
    #[must_use]
    pub fn origin(&self) -> String {
        match self {
            Self::Registration(_) => "registration helper".to_string(),
            Self::RootEntities(_) => "root entities".to_string(),
            Self::RootServices(_) => "root services".to_string(),
            Self::DomainEntities(d) => format!("entities of domain {}", d.domain),
            Self::Entity(e) => format!("entity type of domain {}", e.domain),
            Self::AttributeRecord(r) => format!("attributes of {}", r.origin),
            Self::ServiceParameters(r) => format!("parameters of {}", r.origin),
            Self::ServiceGroup(g) => format!("services of domain {}", g.domain),
            Self::EntityExtensions(e) => format!("service extensions of domain {}", e.domain),
        }
    }

    /// Member identifiers that must be unique inside this type.
    #[must_use]
    pub fn member_identifiers(&self) -> Vec<&str> {
        match self {
            Self::Registration(_) | Self::Entity(_) => Vec::new(),
            Self::RootEntities(r) | Self::RootServices(r) => {
                r.members.iter().map(|m| m.identifier.as_str()).collect()
            }
            Self::DomainEntities(d) => d.entities.iter().map(|e| e.identifier.as_str()).collect(),
            Self::AttributeRecord(r) | Self::ServiceParameters(r) => {
                r.fields.iter().map(|f| f.identifier.as_str()).collect()
            }
            Self::ServiceGroup(g) => g.methods.iter().map(|m| m.identifier.as_str()).collect(),
            Self::EntityExtensions(e) => e.methods.iter().map(|m| m.identifier.as_str()).collect(),
        }
    }
}

/// Enumerates every injectable type for bulk registration in a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub injectable: Vec<String>,
}

/// `Entities` / `Services`: one property per domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootAggregator {
    pub name: String,
    pub members: Vec<AggregatorMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorMember {
    pub identifier: String,
    pub domain: String,
    pub type_name: String,
}

/// `<Domain>Entities`: one property per entity of the domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAggregator {
    pub name: String,
    pub domain: String,
    pub entities: Vec<EntityProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityProperty {
    pub identifier: String,
    pub entity_id: String,
    pub entity_type: String,
}

/// `<Domain>Entity`: a handle type bound to its attribute record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    pub domain: String,
    pub numeric: bool,
    pub attributes: String,
}

/// A record of nullable scalar fields (attribute record or service
/// parameters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    /// Human readable owner (`sensor (numeric)`, `light.turn_on`, …).
    pub origin: String,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub identifier: String,
    /// Original key, used for decode/encode mapping.
    pub source_key: String,
    pub field_type: AttributeType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `<Domain>Services`: one method per declared service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGroup {
    pub name: String,
    pub domain: String,
    pub methods: Vec<ServiceMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMethod {
    pub identifier: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameter record name, `None` for services without fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

/// Service methods callable directly on the entity types of a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityExtensions {
    pub name: String,
    pub domain: String,
    pub entity_types: Vec<String>,
    pub methods: Vec<ServiceMethod>,
}
