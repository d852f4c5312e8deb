//! Entity handles: typed, immutable facades bound to one entity id.
//!
//! A handle never owns state. Reads go to the bus cache, change streams
//! are filtered out of the bus feed, and service calls are forwarded to
//! the bus. Handles compare equal when they point at the same entity on
//! the same bus, whatever their decoder.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_stream::StreamExt;

use hubkit_domain::entity_id;
use hubkit_domain::error::HubError;
use hubkit_domain::id::BusId;
use hubkit_domain::service::{ServiceCall, ServiceTarget};
use hubkit_domain::state::{
    AttributeDecoder, EntityState, NumericEntityState, RawAttributes, RawStateChange, SerdeDecoder,
};

use crate::ports::StateBus;
use crate::service_call::{call_service_for, resolve_service};
use crate::state_change::StateChange;
use crate::stream::{ChangeStream, StateChangeStreamExt, merge};

/// Common surface of every handle type, used by bulk operations.
pub trait EntityHandle {
    type Bus: StateBus;

    fn bus(&self) -> &Arc<Self::Bus>;

    fn entity_id(&self) -> &str;
}

/// Handle on one entity, decoding attributes through `D`.
pub struct Entity<B, D = RawAttributes> {
    bus: Arc<B>,
    entity_id: String,
    decoder: D,
}

/// Change emitted by [`Entity::state_all_changes`].
pub type EntityChange<B, D = RawAttributes> = StateChange<Entity<B, D>, EntityState<D>>;

impl<B: StateBus> Entity<B> {
    /// Bind a handle with untyped attributes.
    pub fn new(bus: Arc<B>, entity_id: impl Into<String>) -> Self {
        Self {
            bus,
            entity_id: entity_id.into(),
            decoder: RawAttributes,
        }
    }
}

impl<B: StateBus, D: AttributeDecoder> Entity<B, D> {
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Domain of the entity id, `None` when it has no `.`.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        entity_id::domain_of(&self.entity_id)
    }

    #[must_use]
    pub fn bus_id(&self) -> BusId {
        self.bus.id()
    }

    /// Same entity, different attribute decoder.
    #[must_use]
    pub fn with_decoder<N: AttributeDecoder>(&self, decoder: N) -> Entity<B, N> {
        Entity {
            bus: Arc::clone(&self.bus),
            entity_id: self.entity_id.clone(),
            decoder,
        }
    }

    /// Same entity, attributes deserialized into `A`.
    #[must_use]
    pub fn with_attributes_as<A>(&self) -> Entity<B, SerdeDecoder<A>>
    where
        A: DeserializeOwned + fmt::Debug + Clone + Send + Sync + 'static,
    {
        self.with_decoder(SerdeDecoder::new())
    }

    /// Same entity, state read as a number.
    #[must_use]
    pub fn as_numeric(&self) -> NumericEntity<B, D> {
        NumericEntity {
            inner: self.clone(),
        }
    }

    /// Current snapshot from the bus cache.
    #[must_use]
    pub fn entity_state(&self) -> Option<EntityState<D>> {
        self.bus
            .current_state(&self.entity_id)
            .map(|state| state.with_decoder(self.decoder.clone()))
    }

    #[must_use]
    pub fn state(&self) -> Option<String> {
        self.entity_state()?.state().map(str::to_string)
    }

    #[must_use]
    pub fn attributes(&self) -> Option<D::Attributes> {
        self.entity_state()?.attributes().cloned()
    }

    /// Name of the area the entity belongs to.
    #[must_use]
    pub fn area(&self) -> Option<String> {
        self.bus.area_of(&self.entity_id).map(|area| area.name)
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.entity_state().is_some_and(|s| s.is_on())
    }

    #[must_use]
    pub fn is_off(&self) -> bool {
        self.entity_state().is_some_and(|s| s.is_off())
    }

    /// Every change of this entity from now on, state or attributes.
    ///
    /// Each call opens its own subscription on the bus feed. Dropping the
    /// stream drops the subscription.
    #[must_use]
    pub fn state_all_changes(&self) -> ChangeStream<EntityChange<B, D>> {
        let entity = self.clone();
        let changes = self
            .bus
            .subscribe_all_changes()
            .filter_map(move |item| match item {
                Ok(raw) if raw.entity_id == entity.entity_id => Some(Ok(entity.narrow(&raw))),
                Ok(_) => None,
                Err(err) => Some(Err(HubError::from(err))),
            });
        Box::pin(Box::pin(changes).until_error())
    }

    /// Changes of this entity where the state string differs.
    #[must_use]
    pub fn state_changes(&self) -> ChangeStream<EntityChange<B, D>> {
        self.state_all_changes().state_changes_only()
    }

    /// Call a service targeting this entity.
    ///
    /// `service` is either `domain.service` or a bare name that takes the
    /// entity's own domain.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::ServiceCall`] for an empty name or a bare name on
    /// an entity id without domain, and whatever the bus reports.
    pub async fn call_service(&self, service: &str, data: Option<Value>) -> Result<(), HubError> {
        let (domain, service) = resolve_service(&self.entity_id, service)?;
        self.bus
            .call_service(ServiceCall {
                domain,
                service,
                target: ServiceTarget::Entity(self.entity_id.clone()),
                data,
            })
            .await
    }

    fn narrow(&self, raw: &RawStateChange) -> EntityChange<B, D> {
        StateChange {
            entity: self.clone(),
            old: raw.old.as_ref().map(|s| s.with_decoder(self.decoder.clone())),
            new: raw.new.as_ref().map(|s| s.with_decoder(self.decoder.clone())),
        }
    }
}

impl<B, D: Clone> Clone for Entity<B, D> {
    fn clone(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
            entity_id: self.entity_id.clone(),
            decoder: self.decoder.clone(),
        }
    }
}

impl<B: StateBus, D> fmt::Debug for Entity<B, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("bus", &self.bus.id())
            .field("entity_id", &self.entity_id)
            .finish_non_exhaustive()
    }
}

impl<B: StateBus, D, O> PartialEq<Entity<B, O>> for Entity<B, D> {
    fn eq(&self, other: &Entity<B, O>) -> bool {
        self.bus.id() == other.bus.id() && self.entity_id == other.entity_id
    }
}

impl<B: StateBus, D> Eq for Entity<B, D> {}

impl<B: StateBus, D> Hash for Entity<B, D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bus.id().hash(state);
        self.entity_id.hash(state);
    }
}

impl<B: StateBus, D: AttributeDecoder> EntityHandle for Entity<B, D> {
    type Bus = B;

    fn bus(&self) -> &Arc<B> {
        &self.bus
    }

    fn entity_id(&self) -> &str {
        &self.entity_id
    }
}

/// Handle whose state is read as a number.
pub struct NumericEntity<B, D = RawAttributes> {
    inner: Entity<B, D>,
}

/// Change emitted by [`NumericEntity::state_all_changes`].
pub type NumericStateChange<B, D = RawAttributes> =
    StateChange<NumericEntity<B, D>, NumericEntityState<D>>;

impl<B: StateBus, D: AttributeDecoder> NumericEntity<B, D> {
    #[must_use]
    pub fn entity_id(&self) -> &str {
        self.inner.entity_id()
    }

    /// The underlying untyped-state handle.
    #[must_use]
    pub fn as_entity(&self) -> &Entity<B, D> {
        &self.inner
    }

    #[must_use]
    pub fn with_attributes_as<A>(&self) -> NumericEntity<B, SerdeDecoder<A>>
    where
        A: DeserializeOwned + fmt::Debug + Clone + Send + Sync + 'static,
    {
        self.inner.with_attributes_as::<A>().as_numeric()
    }

    #[must_use]
    pub fn entity_state(&self) -> Option<NumericEntityState<D>> {
        self.inner.entity_state().map(NumericEntityState::new)
    }

    /// Current state as a number; `None` when missing or unparsable.
    #[must_use]
    pub fn state(&self) -> Option<f64> {
        self.entity_state()?.state()
    }

    #[must_use]
    pub fn attributes(&self) -> Option<D::Attributes> {
        self.inner.attributes()
    }

    #[must_use]
    pub fn area(&self) -> Option<String> {
        self.inner.area()
    }

    #[must_use]
    pub fn state_all_changes(&self) -> ChangeStream<NumericStateChange<B, D>> {
        let entity = self.clone();
        Box::pin(self.inner.state_all_changes().map(move |item| {
            item.map(|change| StateChange {
                entity: entity.clone(),
                old: change.old.map(NumericEntityState::new),
                new: change.new.map(NumericEntityState::new),
            })
        }))
    }

    #[must_use]
    pub fn state_changes(&self) -> ChangeStream<NumericStateChange<B, D>> {
        self.state_all_changes().state_changes_only()
    }

    /// See [`Entity::call_service`].
    ///
    /// # Errors
    ///
    /// Same as [`Entity::call_service`].
    pub async fn call_service(&self, service: &str, data: Option<Value>) -> Result<(), HubError> {
        self.inner.call_service(service, data).await
    }
}

impl<B, D: Clone> Clone for NumericEntity<B, D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: StateBus, D> fmt::Debug for NumericEntity<B, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NumericEntity").field(&self.inner).finish()
    }
}

impl<B: StateBus, D, O> PartialEq<NumericEntity<B, O>> for NumericEntity<B, D> {
    fn eq(&self, other: &NumericEntity<B, O>) -> bool {
        self.inner == other.inner
    }
}

impl<B: StateBus, D> Eq for NumericEntity<B, D> {}

impl<B: StateBus, D> Hash for NumericEntity<B, D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<B: StateBus, D: AttributeDecoder> EntityHandle for NumericEntity<B, D> {
    type Bus = B;

    fn bus(&self) -> &Arc<B> {
        &self.inner.bus
    }

    fn entity_id(&self) -> &str {
        &self.inner.entity_id
    }
}

/// A group of handles observed and commanded together.
#[derive(Debug, Clone)]
pub struct EntitySet<E> {
    entities: Vec<E>,
}

impl<E> EntitySet<E> {
    #[must_use]
    pub fn new(entities: Vec<E>) -> Self {
        Self { entities }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entities.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<E: EntityHandle + Sync> EntitySet<E> {
    /// Call one service for every member, see [`call_service_for`].
    ///
    /// # Errors
    ///
    /// Same as [`call_service_for`].
    pub async fn call_service(&self, service: &str, data: Option<Value>) -> Result<(), HubError> {
        call_service_for(&self.entities, service, data).await
    }
}

impl<B: StateBus, D: AttributeDecoder> EntitySet<Entity<B, D>> {
    /// Changes of every member, interleaved by arrival.
    #[must_use]
    pub fn state_all_changes(&self) -> ChangeStream<EntityChange<B, D>> {
        merge(self.entities.iter().map(Entity::state_all_changes))
    }

    #[must_use]
    pub fn state_changes(&self) -> ChangeStream<EntityChange<B, D>> {
        self.state_all_changes().state_changes_only()
    }
}

impl<B: StateBus, D: AttributeDecoder> EntitySet<NumericEntity<B, D>> {
    /// Changes of every member, interleaved by arrival.
    #[must_use]
    pub fn state_all_changes(&self) -> ChangeStream<NumericStateChange<B, D>> {
        merge(self.entities.iter().map(NumericEntity::state_all_changes))
    }

    #[must_use]
    pub fn state_changes(&self) -> ChangeStream<NumericStateChange<B, D>> {
        self.state_all_changes().state_changes_only()
    }
}

impl<E> FromIterator<E> for EntitySet<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, E> IntoIterator for &'a EntitySet<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

/// Merge [`Entity::state_all_changes`] of every handle.
pub fn state_all_changes_of<B, D>(entities: &[Entity<B, D>]) -> ChangeStream<EntityChange<B, D>>
where
    B: StateBus,
    D: AttributeDecoder,
{
    merge(entities.iter().map(Entity::state_all_changes))
}
