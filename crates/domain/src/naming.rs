//! Name resolution: raw hub keys to collision-free identifiers.
//!
//! Identifiers are PascalCase. Renderers derive member names (snake_case,
//! camelCase, …) from them, so every rule about uniqueness is enforced here
//! on the PascalCase form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier used when a key has no usable character at all.
pub const FALLBACK_IDENTIFIER: &str = "Unnamed";

/// Prefix for entity properties whose name starts with a digit.
pub const ENTITY_PREFIX: &str = "E_";

/// Prefix for attribute and parameter fields whose name starts with a digit.
pub const FIELD_PREFIX: &str = "A_";

/// Prefix for domain-derived type names starting with a digit.
pub const DOMAIN_PREFIX: &str = "D_";

/// A source key and the identifier generated for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalName {
    pub source_key: String,
    pub identifier: String,
}

/// Convert a snake_case (or otherwise separated) key into PascalCase.
///
/// Every character outside `[A-Za-z0-9]` separates words; empty words are
/// dropped. Only the first letter of each word is touched.
#[must_use]
pub fn to_pascal_case(key: &str) -> String {
    key.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Resolve a key to an identifier within a scope using `prefix` for
/// identifiers that would start with a digit.
#[must_use]
pub fn resolve(key: &str, prefix: &str) -> String {
    let pascal = to_pascal_case(key);
    match pascal.chars().next() {
        None => FALLBACK_IDENTIFIER.to_string(),
        Some(first) if first.is_ascii_digit() => format!("{prefix}{pascal}"),
        Some(_) => pascal,
    }
}

/// PascalCase name of a domain, as used in generated type names.
#[must_use]
pub fn domain_type_prefix(domain: &str) -> String {
    resolve(domain, DOMAIN_PREFIX)
}

/// Break identifier collisions inside one scope.
///
/// `items` are `(identifier, source_key)` pairs; the result holds one
/// identifier per item, in input order. Identifiers shared by several items
/// get `_0`, `_1`, … appended following the ordinal order of their source
/// keys, the first one included.
#[must_use]
pub fn dedupe(items: &[(String, String)]) -> Vec<String> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, (identifier, _)) in items.iter().enumerate() {
        groups.entry(identifier.as_str()).or_default().push(index);
    }

    let mut resolved: Vec<String> = items.iter().map(|(id, _)| id.clone()).collect();
    for (identifier, mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| items[*a].1.cmp(&items[*b].1));
        for (suffix, index) in members.into_iter().enumerate() {
            resolved[index] = format!("{identifier}_{suffix}");
        }
    }
    resolved
}

/// Resolve then dedupe a set of keys, sorted by identifier.
#[must_use]
pub fn canonical_names<'a, I>(keys: I, prefix: &str) -> Vec<CanonicalName>
where
    I: IntoIterator<Item = &'a str>,
{
    let items: Vec<(String, String)> = keys
        .into_iter()
        .map(|key| (resolve(key, prefix), key.to_string()))
        .collect();
    let identifiers = dedupe(&items);

    let mut names: Vec<CanonicalName> = items
        .into_iter()
        .zip(identifiers)
        .map(|((_, source_key), identifier)| CanonicalName {
            source_key,
            identifier,
        })
        .collect();
    names.sort_by(|a, b| {
        a.identifier
            .cmp(&b.identifier)
            .then_with(|| a.source_key.cmp(&b.source_key))
    });
    names
}
