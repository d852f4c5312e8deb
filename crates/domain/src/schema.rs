//! Schema assembly: groups entity samples into typed schema groups.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::inference::{AttributeTypeDescriptor, infer_type};
use crate::sample::EntitySample;

/// Domains whose entities are numeric even without a unit of measurement.
pub const DEFAULT_NUMERIC_DOMAINS: &[&str] = &["input_number"];

/// Knobs for [`assemble`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOptions {
    pub numeric_domains: BTreeSet<String>,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            numeric_domains: DEFAULT_NUMERIC_DOMAINS
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
        }
    }
}

impl SchemaOptions {
    /// Whether a sample belongs to a numeric group.
    #[must_use]
    pub fn is_numeric(&self, sample: &EntitySample) -> bool {
        self.numeric_domains.contains(sample.domain()) || sample.has_unit_of_measurement()
    }
}

/// All entities of one `(domain, is_numeric)` group and their attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub domain: String,
    pub is_numeric: bool,
    /// Members, sorted by entity id.
    pub entities: Vec<EntitySample>,
    /// One descriptor per attribute key seen in the group, sorted by key.
    pub attributes: Vec<AttributeTypeDescriptor>,
}

impl EntitySchema {
    fn from_members(domain: String, is_numeric: bool, mut entities: Vec<EntitySample>) -> Self {
        entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

        let mut observations: BTreeMap<&str, Vec<&Value>> = BTreeMap::new();
        for entity in &entities {
            for (key, value) in &entity.attributes {
                observations.entry(key.as_str()).or_default().push(value);
            }
        }

        let attributes = observations
            .into_iter()
            .map(|(name, values)| AttributeTypeDescriptor {
                name: name.to_string(),
                resolved_type: infer_type(values),
            })
            .collect();

        Self {
            domain,
            is_numeric,
            entities,
            attributes,
        }
    }
}

/// Partition samples into schema groups.
///
/// Groups come out sorted by domain, non-numeric before numeric. The
/// ordering is stable for identical input.
#[must_use]
pub fn assemble(samples: &[EntitySample], options: &SchemaOptions) -> Vec<EntitySchema> {
    let mut groups: BTreeMap<(String, bool), Vec<EntitySample>> = BTreeMap::new();
    for sample in samples {
        let key = (sample.domain().to_string(), options.is_numeric(sample));
        groups.entry(key).or_default().push(sample.clone());
    }

    groups
        .into_iter()
        .map(|((domain, is_numeric), members)| {
            EntitySchema::from_members(domain, is_numeric, members)
        })
        .collect()
}
