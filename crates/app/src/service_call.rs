//! Service name resolution and bulk service calls.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use hubkit_domain::entity_id;
use hubkit_domain::error::{HubError, ServiceCallError};
use hubkit_domain::id::BusId;
use hubkit_domain::service::{ServiceCall, ServiceTarget};

use crate::entity::EntityHandle;
use crate::ports::StateBus;

/// Split `service` into `(domain, name)` for a call on `entity_id`.
///
/// `domain.name` keeps its domain; a bare name takes the entity's domain.
///
/// # Errors
///
/// - [`ServiceCallError::EmptyServiceName`] when the name is empty.
/// - [`ServiceCallError::MissingDomain`] for a bare name on an entity id
///   without domain.
pub fn resolve_service(entity_id: &str, service: &str) -> Result<(String, String), ServiceCallError> {
    match entity_id::split_at_dot(service) {
        (_, "") => Err(ServiceCallError::EmptyServiceName),
        (Some(domain), name) => Ok((domain.to_string(), name.to_string())),
        (None, name) => entity_id::domain_of(entity_id)
            .map(|domain| (domain.to_string(), name.to_string()))
            .ok_or_else(|| ServiceCallError::MissingDomain {
                entity_id: entity_id.to_string(),
                service: name.to_string(),
            }),
    }
}

/// Call one service for several handles.
///
/// Nothing happens for an empty input. With a bare service name every
/// handle must share one domain, otherwise no call is issued at all.
/// Handles are grouped by bus; each bus receives one call targeting all of
/// its entities.
///
/// # Errors
///
/// Returns [`HubError::ServiceCall`] when the name is empty, a handle has
/// no domain, or the domains differ; then the first error a bus reports.
pub async fn call_service_for<'a, H, I>(
    handles: I,
    service: &str,
    data: Option<Value>,
) -> Result<(), HubError>
where
    H: EntityHandle + 'a,
    I: IntoIterator<Item = &'a H>,
{
    let handles: Vec<&H> = handles.into_iter().collect();
    let Some(first) = handles.first() else {
        return Ok(());
    };

    let (domain, name) = resolve_service(first.entity_id(), service)?;
    if entity_id::domain_of(service).is_none() {
        let mut domains = BTreeSet::new();
        for handle in &handles {
            let (domain, _) = resolve_service(handle.entity_id(), service)?;
            domains.insert(domain);
        }
        if domains.len() > 1 {
            return Err(ServiceCallError::MixedDomains {
                service: service.to_string(),
                domains: domains.into_iter().collect(),
            }
            .into());
        }
    }

    let mut groups: BTreeMap<BusId, (Arc<H::Bus>, Vec<String>)> = BTreeMap::new();
    for handle in handles {
        groups
            .entry(handle.bus().id())
            .or_insert_with(|| (Arc::clone(handle.bus()), Vec::new()))
            .1
            .push(handle.entity_id().to_string());
    }

    for (bus_id, (bus, entity_ids)) in groups {
        tracing::debug!(
            %bus_id,
            domain = %domain,
            service = %name,
            entities = entity_ids.len(),
            "bulk service call"
        );
        bus.call_service(ServiceCall {
            domain: domain.clone(),
            service: name.clone(),
            target: ServiceTarget::Entities(entity_ids),
            data: data.clone(),
        })
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::state_bus::InProcessStateBus;
    use serde_json::json;

    #[test]
    fn should_resolve_bare_service_to_entity_domain() {
        assert_eq!(
            resolve_service("light.kitchen", "turn_on"),
            Ok(("light".to_string(), "turn_on".to_string()))
        );
    }

    #[test]
    fn should_keep_explicit_domain() {
        assert_eq!(
            resolve_service("light.kitchen", "homeassistant.turn_on"),
            Ok(("homeassistant".to_string(), "turn_on".to_string()))
        );
    }

    #[test]
    fn should_reject_empty_names() {
        assert_eq!(
            resolve_service("light.kitchen", ""),
            Err(ServiceCallError::EmptyServiceName)
        );
        assert_eq!(
            resolve_service("light.kitchen", "light."),
            Err(ServiceCallError::EmptyServiceName)
        );
    }

    #[tokio::test]
    async fn should_do_nothing_when_no_handles() {
        let handles: Vec<Entity<InProcessStateBus>> = Vec::new();
        call_service_for(&handles, "turn_on", None).await.unwrap();
    }

    #[tokio::test]
    async fn should_issue_one_call_per_bus() {
        let bus = Arc::new(InProcessStateBus::new(16));
        let handles = vec![
            Entity::new(Arc::clone(&bus), "light.kitchen"),
            Entity::new(Arc::clone(&bus), "light.bedroom"),
        ];

        call_service_for(&handles, "turn_off", Some(json!({"transition": 2})))
            .await
            .unwrap();

        assert_eq!(
            bus.service_calls(),
            vec![ServiceCall {
                domain: "light".to_string(),
                service: "turn_off".to_string(),
                target: ServiceTarget::Entities(vec![
                    "light.kitchen".to_string(),
                    "light.bedroom".to_string(),
                ]),
                data: Some(json!({"transition": 2})),
            }]
        );
    }

    #[tokio::test]
    async fn should_group_handles_by_bus() {
        let first = Arc::new(InProcessStateBus::new(16));
        let second = Arc::new(InProcessStateBus::new(16));
        let handles = vec![
            Entity::new(Arc::clone(&first), "switch.a"),
            Entity::new(Arc::clone(&second), "switch.b"),
            Entity::new(Arc::clone(&first), "switch.c"),
        ];

        call_service_for(&handles, "toggle", None).await.unwrap();

        assert_eq!(
            first.service_calls()[0].target,
            ServiceTarget::Entities(vec!["switch.a".to_string(), "switch.c".to_string()])
        );
        assert_eq!(
            second.service_calls()[0].target,
            ServiceTarget::Entities(vec!["switch.b".to_string()])
        );
    }

    #[tokio::test]
    async fn should_fail_without_any_call_when_domains_are_mixed() {
        let bus = Arc::new(InProcessStateBus::new(16));
        let handles = vec![
            Entity::new(Arc::clone(&bus), "light.kitchen"),
            Entity::new(Arc::clone(&bus), "switch.fan"),
        ];

        let err = call_service_for(&handles, "turn_on", None).await.unwrap_err();

        assert!(matches!(
            err,
            HubError::ServiceCall(ServiceCallError::MixedDomains { ref domains, .. })
                if domains == &["light".to_string(), "switch".to_string()]
        ));
        assert!(bus.service_calls().is_empty());
    }

    #[tokio::test]
    async fn should_skip_domain_check_when_service_is_qualified() {
        let bus = Arc::new(InProcessStateBus::new(16));
        let handles = vec![
            Entity::new(Arc::clone(&bus), "light.kitchen"),
            Entity::new(Arc::clone(&bus), "switch.fan"),
        ];

        call_service_for(&handles, "homeassistant.turn_off", None)
            .await
            .unwrap();

        let calls = bus.service_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].domain, "homeassistant");
    }
}
