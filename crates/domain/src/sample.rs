//! Entity sample: one entity as reported by the hub at generation time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity_id;

/// Key whose presence marks an entity as numeric.
pub const UNIT_OF_MEASUREMENT: &str = "unit_of_measurement";

/// A loosely typed entity snapshot: id, string state and attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySample {
    pub entity_id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntitySample {
    /// Create a sample with no attributes.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, state: Option<&str>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.map(str::to_string),
            attributes: Map::new(),
        }
    }

    /// Add (or replace) one attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Domain used to group this sample.
    #[must_use]
    pub fn domain(&self) -> &str {
        entity_id::grouping_domain(&self.entity_id)
    }

    /// Whether the sample reports a unit of measurement.
    #[must_use]
    pub fn has_unit_of_measurement(&self) -> bool {
        self.attributes.contains_key(UNIT_OF_MEASUREMENT)
    }
}
