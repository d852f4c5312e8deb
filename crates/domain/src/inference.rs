//! Attribute type inference over sampled JSON values.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar type resolved for one attribute key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Number,
    Boolean,
    /// Objects, arrays, and anything the observations disagree on.
    Opaque,
}

impl AttributeType {
    /// JSON kind of a single observation; `None` for `null`.
    #[must_use]
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(_) => Some(Self::Number),
            Value::String(_) => Some(Self::String),
            Value::Array(_) | Value::Object(_) => Some(Self::Opaque),
        }
    }

    /// Whether `value` is a non-null observation of this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        Self::of(value) == Some(self)
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Number => f.write_str("number"),
            Self::Boolean => f.write_str("boolean"),
            Self::Opaque => f.write_str("opaque"),
        }
    }
}

/// One attribute key of a schema group with its resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTypeDescriptor {
    pub name: String,
    pub resolved_type: AttributeType,
}

/// Infer the single type that fits every non-null observation.
///
/// Nulls are ignored. No observation, or observations of different kinds,
/// resolve to [`AttributeType::Opaque`].
pub fn infer_type<'a, I>(observations: I) -> AttributeType
where
    I: IntoIterator<Item = &'a Value>,
{
    let kinds: BTreeSet<AttributeType> = observations
        .into_iter()
        .filter_map(AttributeType::of)
        .collect();

    let mut iter = kinds.into_iter();
    match (iter.next(), iter.next()) {
        (Some(only), None) => only,
        _ => AttributeType::Opaque,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_resolve_string_when_all_observations_are_strings() {
        let values = [json!("a"), json!("b")];
        assert_eq!(infer_type(&values), AttributeType::String);
    }

    #[test]
    fn should_resolve_number_for_integers_and_floats() {
        let values = [json!(1), json!(2.5), json!(-3)];
        assert_eq!(infer_type(&values), AttributeType::Number);
    }

    #[test]
    fn should_resolve_boolean_for_true_and_false() {
        let values = [json!(true), json!(false)];
        assert_eq!(infer_type(&values), AttributeType::Boolean);
    }

    #[test]
    fn should_ignore_nulls_when_resolving() {
        let values = [json!(null), json!(12), json!(null)];
        assert_eq!(infer_type(&values), AttributeType::Number);
    }

    #[test]
    fn should_resolve_opaque_when_kinds_disagree() {
        let values = [json!("12"), json!(12)];
        assert_eq!(infer_type(&values), AttributeType::Opaque);
    }

    #[test]
    fn should_resolve_opaque_when_all_null() {
        let values = [json!(null), json!(null)];
        assert_eq!(infer_type(&values), AttributeType::Opaque);
    }

    #[test]
    fn should_resolve_opaque_when_no_observation() {
        assert_eq!(infer_type(std::iter::empty()), AttributeType::Opaque);
    }

    #[test]
    fn should_resolve_opaque_for_objects_and_arrays() {
        assert_eq!(infer_type(&[json!({"a": 1})]), AttributeType::Opaque);
        assert_eq!(infer_type(&[json!([1, 2])]), AttributeType::Opaque);
    }
}
