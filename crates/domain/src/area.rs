//! Area: a logical grouping (room, floor, zone) an entity can belong to.

use serde::{Deserialize, Serialize};

/// A named area as reported by the state bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
}

impl Area {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
