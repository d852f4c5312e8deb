//! Common error types used across the workspace.
//!
//! Each concern defines its own typed error and converts into [`HubError`]
//! via `#[from]`. Adapters wrap their own failures in [`HubError::Source`].

/// Top-level error for every hubkit operation.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("model generation failed")]
    Generation(#[from] GenerationError),

    #[error("service call rejected")]
    ServiceCall(#[from] ServiceCallError),

    #[error("state bus failure")]
    Bus(#[from] BusError),

    /// Failure reported by an adapter (metadata source, renderer, …).
    #[error("adapter error")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Fatal problems detected while building a generated model.
///
/// Generation stops at the first one; a type or member is never silently
/// overwritten.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("type name {name} produced twice (by {first} and {second})")]
    DuplicateTypeName {
        name: String,
        first: String,
        second: String,
    },

    #[error("member {member} appears twice in type {type_name}")]
    DuplicateMemberName { type_name: String, member: String },

    #[error("field {field} of service {domain}.{service} has unknown type {type_name}")]
    UnknownFieldType {
        domain: String,
        service: String,
        field: String,
        type_name: String,
    },
}

/// Reasons a service call is refused before anything reaches the bus.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceCallError {
    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("entity id {entity_id} has no domain, service {service} needs one")]
    MissingDomain { entity_id: String, service: String },

    #[error("cannot call service {service} for entities of different domains ({domains:?})")]
    MixedDomains {
        service: String,
        domains: Vec<String>,
    },
}

/// Failures of the shared state-change feed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("subscriber lagged behind, {skipped} events dropped")]
    Lagged { skipped: u64 },

    #[error("state bus closed")]
    Closed,
}

/// Attribute payload that did not fit the requested attribute record.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to decode attributes of {entity_id}")]
pub struct AttributeDecodeError {
    pub entity_id: String,
    /// Shared so the cached failure can be cloned with its snapshot.
    #[source]
    pub source: std::sync::Arc<serde_json::Error>,
}
