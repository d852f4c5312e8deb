//! Snapshot document format.
//!
//! ```json
//! {
//!   "states": [{"entity_id": "light.kitchen", "state": "on", "attributes": {}}],
//!   "services": [{
//!     "domain": "light",
//!     "services": {
//!       "turn_on": {
//!         "description": "Turn on one or more lights.",
//!         "fields": {
//!           "brightness": {"required": false, "selector": {"number": {"min": 0}}},
//!           "advanced_fields": {"collapsed": true, "fields": {"flash": {"selector": {"select": {}}}}}
//!         }
//!       }
//!     }
//!   }]
//! }
//! ```
//!
//! The first key of a field's `selector` is its type; selectors with no
//! known meaning are typed as objects. Fields nested in a
//! section (an entry with its own `fields` and no selector) are flattened.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use hubkit_domain::sample::EntitySample;
use hubkit_domain::service::{ServiceDescriptor, ServiceDomainDescriptor, ServiceFieldDescriptor};

use crate::error::SnapshotError;

/// A parsed snapshot document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub states: Vec<EntitySample>,
    #[serde(default)]
    services: Vec<WireServiceDomain>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireServiceDomain {
    domain: String,
    #[serde(default)]
    services: BTreeMap<String, WireService>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireService {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, WireField>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireField {
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    selector: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    fields: BTreeMap<String, WireField>,
}

impl Snapshot {
    /// Parse a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Parse`] when the bytes are not a snapshot.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The service catalog, one descriptor per domain entry.
    #[must_use]
    pub fn service_catalog(&self) -> Vec<ServiceDomainDescriptor> {
        self.services
            .iter()
            .map(|domain| ServiceDomainDescriptor {
                domain: domain.domain.clone(),
                services: domain
                    .services
                    .iter()
                    .map(|(name, service)| ServiceDescriptor {
                        name: name.clone(),
                        description: service.description.clone(),
                        fields: flatten_fields(&service.fields),
                    })
                    .collect(),
            })
            .collect()
    }
}

fn flatten_fields(fields: &BTreeMap<String, WireField>) -> Vec<ServiceFieldDescriptor> {
    let mut flat = Vec::with_capacity(fields.len());
    for (name, field) in fields {
        if field.selector.is_none() && !field.fields.is_empty() {
            flat.extend(flatten_fields(&field.fields));
            continue;
        }
        flat.push(ServiceFieldDescriptor {
            name: name.clone(),
            type_name: field
                .selector
                .as_ref()
                .and_then(|selector| selector.keys().next())
                .map(|kind| selector_type(kind).to_string()),
            required: field.required,
            description: field.description.clone(),
        });
    }
    flat
}

/// Map a hub selector kind onto a declared field type.
///
/// Kinds the model already understands pass through unchanged; any other
/// selector is treated as an opaque object.
fn selector_type(kind: &str) -> &str {
    match kind {
        "string" | "text" | "entity" | "select" | "time" | "date" | "datetime" | "color"
        | "icon" | "template" | "number" | "boolean" | "object" | "list" | "target" | "area"
        | "device" => kind,
        "color_temp" | "duration_seconds" => "number",
        "theme" | "state" | "attribute" | "config_entry" | "conversation_agent" | "country"
        | "language" | "addon" | "backup_location" => "string",
        "color_rgb" => "list",
        "duration" | "action" | "location" | "media" | "constant" => "object",
        other => {
            tracing::warn!(kind = other, "unknown selector, field typed as object");
            "object"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "states": [
            {"entity_id": "light.kitchen", "state": "on", "attributes": {"brightness": 255},
             "last_changed": "2024-01-01T00:00:00+00:00", "context": {"id": "abc"}}
        ],
        "services": [{
            "domain": "light",
            "services": {
                "turn_on": {
                    "name": "Turn on",
                    "description": "Turn on one or more lights.",
                    "fields": {
                        "brightness": {"required": false, "selector": {"number": {"min": 0, "max": 255}}},
                        "rgb_color": {"selector": {"color_rgb": {}}},
                        "advanced_fields": {
                            "collapsed": true,
                            "fields": {"flash": {"selector": {"select": {"options": ["short", "long"]}}}}
                        }
                    }
                },
                "turn_off": {"fields": {}}
            }
        }]
    }"#;

    #[test]
    fn should_parse_states() {
        let snapshot = Snapshot::from_slice(DOCUMENT.as_bytes()).unwrap();
        assert_eq!(snapshot.states.len(), 1);
        assert_eq!(snapshot.states[0].entity_id, "light.kitchen");
        assert_eq!(snapshot.states[0].state.as_deref(), Some("on"));
    }

    #[test]
    fn should_use_selector_kind_as_field_type() {
        let snapshot = Snapshot::from_slice(DOCUMENT.as_bytes()).unwrap();
        let catalog = snapshot.service_catalog();
        let turn_on = catalog[0]
            .services
            .iter()
            .find(|s| s.name == "turn_on")
            .unwrap();
        let fields: Vec<_> = turn_on
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_name.as_deref()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("flash", Some("select")),
                ("brightness", Some("number")),
                ("rgb_color", Some("list")),
            ]
        );
        assert_eq!(turn_on.description.as_deref(), Some("Turn on one or more lights."));
    }

    #[test]
    fn should_keep_services_without_fields() {
        let snapshot = Snapshot::from_slice(DOCUMENT.as_bytes()).unwrap();
        let catalog = snapshot.service_catalog();
        let turn_off = catalog[0]
            .services
            .iter()
            .find(|s| s.name == "turn_off")
            .unwrap();
        assert!(turn_off.fields.is_empty());
    }

    #[test]
    fn should_leave_field_type_open_without_selector() {
        let snapshot = Snapshot::from_slice(
            br#"{"services": [{"domain": "notify", "services": {"send": {"fields": {"message": {"required": true}}}}}]}"#,
        )
        .unwrap();
        let field = &snapshot.service_catalog()[0].services[0].fields[0];
        assert_eq!(field.type_name, None);
        assert!(field.required);
    }

    #[test]
    fn should_default_missing_sections() {
        let snapshot = Snapshot::from_slice(b"{}").unwrap();
        assert!(snapshot.states.is_empty());
        assert!(snapshot.service_catalog().is_empty());
    }

    #[test]
    fn should_reject_malformed_document() {
        let result = Snapshot::from_slice(b"{\"states\": 3}");
        assert!(matches!(result, Err(SnapshotError::Parse(_))));
    }

    #[test]
    fn should_type_unknown_selector_as_object() {
        let snapshot = Snapshot::from_slice(
            br#"{"services": [{"domain": "area_tools", "services": {"move": {"fields": {
                "floor_id": {"required": true, "selector": {"floor": {}}},
                "label_id": {"selector": {"label": {"multiple": true}}}
            }}}}]}"#,
        )
        .unwrap();
        let catalog = snapshot.service_catalog();
        let fields: Vec<_> = catalog[0].services[0]
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_name.as_deref()))
            .collect();
        assert_eq!(
            fields,
            vec![("floor_id", Some("object")), ("label_id", Some("object"))]
        );
        assert!(
            catalog[0].services[0].fields[0]
                .resolved_type("area_tools", "move")
                .is_ok()
        );
    }
}
