//! In-process state bus backed by a tokio broadcast channel.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use hubkit_domain::area::Area;
use hubkit_domain::error::{BusError, HubError};
use hubkit_domain::id::BusId;
use hubkit_domain::service::ServiceCall;
use hubkit_domain::state::{EntityState, RawStateChange};

use crate::ports::{RawChangeStream, StateBus};

/// In-memory [`StateBus`]: a state cache, an area table and a broadcast
/// feed of every write. Service calls are recorded, not executed.
///
/// Publishing succeeds even when there are no active subscribers
/// (the change is simply dropped).
pub struct InProcessStateBus {
    id: BusId,
    sender: broadcast::Sender<RawStateChange>,
    states: Mutex<HashMap<String, EntityState>>,
    areas: Mutex<HashMap<String, Area>>,
    calls: Mutex<Vec<ServiceCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InProcessStateBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            id: BusId::new(),
            sender,
            states: Mutex::new(HashMap::new()),
            areas: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Write a state and publish the resulting change.
    ///
    /// Missing timestamps are filled in: `last_updated` is now,
    /// `last_changed` is now when the state string differs from the cached
    /// one and is carried over otherwise.
    pub fn set_state(&self, state: EntityState) -> RawStateChange {
        let ts = Utc::now();
        let mut states = lock(&self.states);
        let entity_id = state.entity_id().to_string();
        let old = states.get(&entity_id).cloned();

        let state_changed = old.as_ref().map(EntityState::state) != Some(state.state());
        let last_changed = state
            .last_changed()
            .or_else(|| {
                if state_changed {
                    None
                } else {
                    old.as_ref().and_then(EntityState::last_changed)
                }
            })
            .unwrap_or(ts);
        let last_updated = state.last_updated().unwrap_or(ts);
        let new = state
            .with_last_changed(last_changed)
            .with_last_updated(last_updated);

        states.insert(entity_id.clone(), new.clone());
        let change = RawStateChange {
            entity_id,
            old,
            new: Some(new),
        };
        tracing::trace!(entity_id = %change.entity_id, "state written");
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(change.clone());
        change
    }

    /// Forget an entity and publish its removal.
    pub fn remove_state(&self, entity_id: &str) -> Option<RawStateChange> {
        let mut states = lock(&self.states);
        let old = states.remove(entity_id)?;
        let change = RawStateChange {
            entity_id: entity_id.to_string(),
            old: Some(old),
            new: None,
        };
        let _ = self.sender.send(change.clone());
        Some(change)
    }

    /// Assign an entity to an area.
    pub fn set_area(&self, entity_id: impl Into<String>, area: Area) {
        lock(&self.areas).insert(entity_id.into(), area);
    }

    /// Every service call received so far, in order.
    #[must_use]
    pub fn service_calls(&self) -> Vec<ServiceCall> {
        lock(&self.calls).clone()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl StateBus for InProcessStateBus {
    fn id(&self) -> BusId {
        self.id
    }

    fn current_state(&self, entity_id: &str) -> Option<EntityState> {
        lock(&self.states).get(entity_id).cloned()
    }

    fn area_of(&self, entity_id: &str) -> Option<Area> {
        lock(&self.areas).get(entity_id).cloned()
    }

    fn subscribe_all_changes(&self) -> RawChangeStream {
        let changes = BroadcastStream::new(self.sender.subscribe()).map(|result| match result {
            Ok(change) => Ok(change),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "state change subscriber lagged, some changes were dropped");
                Err(BusError::Lagged { skipped })
            }
        });
        Box::pin(changes.chain(tokio_stream::once(Err(BusError::Closed))))
    }

    fn call_service(&self, call: ServiceCall) -> impl Future<Output = Result<(), HubError>> + Send {
        tracing::debug!(
            domain = %call.domain,
            service = %call.service,
            entities = call.target.entity_ids().len(),
            "service call"
        );
        lock(&self.calls).push(call);
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubkit_domain::service::ServiceTarget;

    #[tokio::test]
    async fn should_deliver_change_to_subscriber() {
        let bus = InProcessStateBus::new(16);
        let mut changes = bus.subscribe_all_changes();

        bus.set_state(EntityState::new("light.kitchen", Some("on")));

        let change = changes.next().await.unwrap().unwrap();
        assert_eq!(change.entity_id, "light.kitchen");
        assert!(change.old.is_none());
        assert_eq!(change.new.unwrap().state(), Some("on"));
    }

    #[tokio::test]
    async fn should_deliver_change_to_multiple_subscribers() {
        let bus = InProcessStateBus::new(16);
        let mut first = bus.subscribe_all_changes();
        let mut second = bus.subscribe_all_changes();

        bus.set_state(EntityState::new("switch.fan", Some("off")));

        assert_eq!(first.next().await.unwrap().unwrap().entity_id, "switch.fan");
        assert_eq!(second.next().await.unwrap().unwrap().entity_id, "switch.fan");
    }

    #[tokio::test]
    async fn should_not_deliver_changes_published_before_subscription() {
        let bus = InProcessStateBus::new(16);
        bus.set_state(EntityState::new("light.kitchen", Some("on")));

        let mut changes = bus.subscribe_all_changes();
        bus.set_state(EntityState::new("light.kitchen", Some("off")));

        let change = changes.next().await.unwrap().unwrap();
        assert_eq!(change.old.unwrap().state(), Some("on"));
        assert_eq!(change.new.unwrap().state(), Some("off"));
    }

    #[test]
    fn should_succeed_when_no_subscribers() {
        let bus = InProcessStateBus::new(16);
        let change = bus.set_state(EntityState::new("light.kitchen", Some("on")));
        assert!(change.new.is_some());
        assert_eq!(
            bus.current_state("light.kitchen").unwrap().state(),
            Some("on")
        );
    }

    #[test]
    fn should_keep_last_changed_when_only_attributes_change() {
        let bus = InProcessStateBus::new(16);
        let first = bus.set_state(EntityState::new("light.kitchen", Some("on")));
        let second = bus.set_state(
            EntityState::new("light.kitchen", Some("on"))
                .with_attributes(serde_json::json!({"brightness": 12})),
        );
        assert_eq!(
            second.new.unwrap().last_changed(),
            first.new.unwrap().last_changed()
        );
    }

    #[tokio::test]
    async fn should_report_lag_when_subscriber_falls_behind() {
        let bus = InProcessStateBus::new(1);
        let mut changes = bus.subscribe_all_changes();
        for state in ["1", "2", "3"] {
            bus.set_state(EntityState::new("sensor.counter", Some(state)));
        }

        let err = changes.next().await.unwrap().unwrap_err();
        assert_eq!(err, BusError::Lagged { skipped: 2 });
    }

    #[tokio::test]
    async fn should_publish_removal() {
        let bus = InProcessStateBus::new(16);
        bus.set_state(EntityState::new("light.kitchen", Some("on")));
        let mut changes = bus.subscribe_all_changes();

        bus.remove_state("light.kitchen");

        let change = changes.next().await.unwrap().unwrap();
        assert!(change.new.is_none());
        assert!(bus.current_state("light.kitchen").is_none());
        assert!(bus.remove_state("light.kitchen").is_none());
    }

    #[tokio::test]
    async fn should_record_service_calls() {
        let bus = InProcessStateBus::new(16);
        let call = ServiceCall {
            domain: "light".to_string(),
            service: "turn_on".to_string(),
            target: ServiceTarget::Entity("light.kitchen".to_string()),
            data: None,
        };
        bus.call_service(call.clone()).await.unwrap();
        assert_eq!(bus.service_calls(), vec![call]);
    }

    #[test]
    fn should_look_up_area() {
        let bus = InProcessStateBus::new(16);
        bus.set_area("light.kitchen", Area::new("kitchen", "Kitchen"));
        assert_eq!(bus.area_of("light.kitchen").unwrap().name, "Kitchen");
        assert!(bus.area_of("light.bedroom").is_none());
    }
}
