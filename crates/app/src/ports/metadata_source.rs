//! Metadata source port: where generation gets its input from.

use std::future::Future;

use hubkit_domain::error::HubError;
use hubkit_domain::sample::EntitySample;
use hubkit_domain::service::ServiceDomainDescriptor;

/// Provides a snapshot of every entity and the hub's service catalog.
pub trait MetadataSource {
    /// Every entity currently known to the hub.
    fn fetch_entity_samples(
        &self,
    ) -> impl Future<Output = Result<Vec<EntitySample>, HubError>> + Send;

    /// Every declared service, grouped by domain.
    fn fetch_service_catalog(
        &self,
    ) -> impl Future<Output = Result<Vec<ServiceDomainDescriptor>, HubError>> + Send;
}

impl<T: MetadataSource + Send + Sync> MetadataSource for std::sync::Arc<T> {
    fn fetch_entity_samples(
        &self,
    ) -> impl Future<Output = Result<Vec<EntitySample>, HubError>> + Send {
        (**self).fetch_entity_samples()
    }

    fn fetch_service_catalog(
        &self,
    ) -> impl Future<Output = Result<Vec<ServiceDomainDescriptor>, HubError>> + Send {
        (**self).fetch_service_catalog()
    }
}
