//! State bus port: the live connection to the hub.
//!
//! Entity handles never own state: every read goes through the bus cache
//! and every change stream is carved out of the single shared feed.

use std::future::Future;
use std::pin::Pin;

use hubkit_domain::area::Area;
use hubkit_domain::error::{BusError, HubError};
use hubkit_domain::id::BusId;
use hubkit_domain::service::ServiceCall;
use hubkit_domain::state::{EntityState, RawStateChange};
use tokio_stream::Stream;

/// Every state change seen by the bus after subscription.
pub type RawChangeStream = Pin<Box<dyn Stream<Item = Result<RawStateChange, BusError>> + Send>>;

/// Producer of raw state changes, current-state cache and service sink.
pub trait StateBus: Send + Sync + 'static {
    /// Identity of this connection.
    fn id(&self) -> BusId;

    /// Last known state of an entity.
    fn current_state(&self, entity_id: &str) -> Option<EntityState>;

    /// Area an entity is assigned to.
    fn area_of(&self, entity_id: &str) -> Option<Area>;

    /// Subscribe to every subsequent change, for all entities.
    fn subscribe_all_changes(&self) -> RawChangeStream;

    /// Forward a resolved service call to the hub.
    fn call_service(&self, call: ServiceCall) -> impl Future<Output = Result<(), HubError>> + Send;
}
