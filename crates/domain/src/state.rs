//! Entity state snapshots and attribute decoding.
//!
//! A snapshot keeps the attribute bag as raw JSON. The typed view is
//! produced by an [`AttributeDecoder`] on first access and cached for the
//! lifetime of the snapshot.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::AttributeDecodeError;

/// UTC instant of a state write.
pub type Timestamp = DateTime<Utc>;

/// Origin information attached by the hub to each state write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Turns a raw attribute bag into a typed attribute record.
pub trait AttributeDecoder: Clone + Send + Sync + 'static {
    type Attributes: fmt::Debug + Clone + Send + Sync + 'static;

    /// Decode the raw attributes.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error when `raw` does not fit.
    fn decode(&self, raw: &Value) -> Result<Self::Attributes, serde_json::Error>;
}

/// Decoder keeping attributes as an untyped JSON map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawAttributes;

impl AttributeDecoder for RawAttributes {
    type Attributes = Map<String, Value>;

    fn decode(&self, raw: &Value) -> Result<Self::Attributes, serde_json::Error> {
        if raw.is_null() {
            return Ok(Map::new());
        }
        Map::deserialize(raw)
    }
}

/// Decoder deserializing attributes into `A` with serde.
pub struct SerdeDecoder<A>(PhantomData<fn() -> A>);

impl<A> SerdeDecoder<A> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<A> Default for SerdeDecoder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for SerdeDecoder<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for SerdeDecoder<A> {}

impl<A> fmt::Debug for SerdeDecoder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerdeDecoder<{}>", std::any::type_name::<A>())
    }
}

impl<A> AttributeDecoder for SerdeDecoder<A>
where
    A: DeserializeOwned + fmt::Debug + Clone + Send + Sync + 'static,
{
    type Attributes = A;

    fn decode(&self, raw: &Value) -> Result<A, serde_json::Error> {
        let empty;
        let value = if raw.is_null() {
            empty = Value::Object(Map::new());
            &empty
        } else {
            raw
        };
        A::deserialize(value)
    }
}

/// Deserialize one optional attribute field, yielding `None` instead of an
/// error when the JSON kind does not match `T`.
///
/// Generated attribute records use it on every field so a single
/// disagreeing attribute does not void the whole record.
///
/// # Errors
///
/// Only fails when the underlying deserializer cannot produce a JSON value.
pub fn lenient_field<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Parse a state string as a number, culture invariant.
///
/// Surrounding whitespace is ignored. Anything unparsable (including
/// `unavailable`, `unknown`, infinities and NaN) is `None`.
#[must_use]
pub fn parse_numeric_state(state: Option<&str>) -> Option<f64> {
    state?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Immutable snapshot of one entity's state.
#[derive(Debug, Clone)]
pub struct EntityState<D: AttributeDecoder = RawAttributes> {
    entity_id: String,
    state: Option<String>,
    attributes_raw: Value,
    last_changed: Option<Timestamp>,
    last_updated: Option<Timestamp>,
    context: Option<Context>,
    decoder: D,
    decoded: OnceLock<Result<D::Attributes, AttributeDecodeError>>,
}

impl EntityState<RawAttributes> {
    /// Create an untyped snapshot with empty attributes.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, state: Option<&str>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.map(str::to_string),
            attributes_raw: Value::Object(Map::new()),
            last_changed: None,
            last_updated: None,
            context: None,
            decoder: RawAttributes,
            decoded: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes_raw = attributes;
        self.decoded = OnceLock::new();
        self
    }

    #[must_use]
    pub fn with_last_changed(mut self, ts: Timestamp) -> Self {
        self.last_changed = Some(ts);
        self
    }

    #[must_use]
    pub fn with_last_updated(mut self, ts: Timestamp) -> Self {
        self.last_updated = Some(ts);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }
}

impl<D: AttributeDecoder> EntityState<D> {
    /// Copy every field into a snapshot decoded by `decoder`.
    ///
    /// The copy starts with an empty attribute cache; nothing decoded by
    /// `self` is carried over.
    #[must_use]
    pub fn with_decoder<N: AttributeDecoder>(&self, decoder: N) -> EntityState<N> {
        EntityState {
            entity_id: self.entity_id.clone(),
            state: self.state.clone(),
            attributes_raw: self.attributes_raw.clone(),
            last_changed: self.last_changed,
            last_updated: self.last_updated,
            context: self.context.clone(),
            decoder,
            decoded: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Raw state string.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    #[must_use]
    pub fn attributes_raw(&self) -> &Value {
        &self.attributes_raw
    }

    /// When the state string last changed.
    #[must_use]
    pub fn last_changed(&self) -> Option<Timestamp> {
        self.last_changed
    }

    /// When the state or any attribute last changed.
    #[must_use]
    pub fn last_updated(&self) -> Option<Timestamp> {
        self.last_updated
    }

    #[must_use]
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Typed attributes, decoded once and cached.
    ///
    /// # Errors
    ///
    /// Returns the (cached) [`AttributeDecodeError`] when the raw attributes
    /// do not fit the decoder's record.
    pub fn try_attributes(&self) -> Result<&D::Attributes, &AttributeDecodeError> {
        self.decoded
            .get_or_init(|| {
                self.decoder
                    .decode(&self.attributes_raw)
                    .map_err(|source| AttributeDecodeError {
                        entity_id: self.entity_id.clone(),
                        source: Arc::new(source),
                    })
            })
            .as_ref()
    }

    /// Typed attributes, `None` when they cannot be decoded.
    #[must_use]
    pub fn attributes(&self) -> Option<&D::Attributes> {
        self.try_attributes().ok()
    }

    /// State parsed as a number.
    #[must_use]
    pub fn numeric_state(&self) -> Option<f64> {
        parse_numeric_state(self.state())
    }

    /// Whether the state is `on`, case-insensitive.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state().is_some_and(|s| s.eq_ignore_ascii_case("on"))
    }

    /// Whether the state is `off`, case-insensitive.
    #[must_use]
    pub fn is_off(&self) -> bool {
        self.state().is_some_and(|s| s.eq_ignore_ascii_case("off"))
    }
}

impl<D: AttributeDecoder, O: AttributeDecoder> PartialEq<EntityState<O>> for EntityState<D> {
    fn eq(&self, other: &EntityState<O>) -> bool {
        self.entity_id == other.entity_id
            && self.state == other.state
            && self.attributes_raw == other.attributes_raw
            && self.last_changed == other.last_changed
            && self.last_updated == other.last_updated
            && self.context == other.context
    }
}

/// Snapshot whose state is read as a number.
#[derive(Debug, Clone)]
pub struct NumericEntityState<D: AttributeDecoder = RawAttributes> {
    inner: EntityState<D>,
}

impl<D: AttributeDecoder> NumericEntityState<D> {
    #[must_use]
    pub fn new(inner: EntityState<D>) -> Self {
        Self { inner }
    }

    /// State parsed as a number, `None` when unparsable.
    #[must_use]
    pub fn state(&self) -> Option<f64> {
        self.inner.numeric_state()
    }

    /// Underlying snapshot, with the raw state string.
    #[must_use]
    pub fn entity_state(&self) -> &EntityState<D> {
        &self.inner
    }

    #[must_use]
    pub fn into_entity_state(self) -> EntityState<D> {
        self.inner
    }

    #[must_use]
    pub fn attributes(&self) -> Option<&D::Attributes> {
        self.inner.attributes()
    }
}

impl<D: AttributeDecoder> From<EntityState<D>> for NumericEntityState<D> {
    fn from(inner: EntityState<D>) -> Self {
        Self::new(inner)
    }
}

/// A state change as emitted by the bus, before any typing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStateChange {
    pub entity_id: String,
    pub old: Option<EntityState>,
    pub new: Option<EntityState>,
}
