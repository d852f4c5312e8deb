//! Helpers for `domain.object_id` style identifiers.
//!
//! Entity ids (`light.kitchen`) and qualified service names
//! (`light.turn_on`) share the same shape: everything before the first `.`
//! is the domain.

/// Split at the first `.`.
///
/// Returns `(Some(left), right)` when a separator is present and
/// `(None, whole)` otherwise.
#[must_use]
pub fn split_at_dot(value: &str) -> (Option<&str>, &str) {
    match value.split_once('.') {
        Some((left, right)) => (Some(left), right),
        None => (None, value),
    }
}

/// Domain part of an entity id, `None` when the id carries no separator.
#[must_use]
pub fn domain_of(entity_id: &str) -> Option<&str> {
    split_at_dot(entity_id).0
}

/// Domain used for schema grouping: the part before the first `.`, or the
/// whole id when it has none.
#[must_use]
pub fn grouping_domain(entity_id: &str) -> &str {
    domain_of(entity_id).unwrap_or(entity_id)
}

/// Object id part of an entity id (after the first `.`), empty when absent.
#[must_use]
pub fn object_id(entity_id: &str) -> &str {
    match split_at_dot(entity_id) {
        (Some(_), rest) => rest,
        (None, _) => "",
    }
}
