//! Model generation: schema groups and service catalog in, ordered type
//! list out.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::entity_id;
use crate::error::GenerationError;
use crate::naming::{
    self, CanonicalName, ENTITY_PREFIX, FIELD_PREFIX, canonical_names, domain_type_prefix,
};
use crate::schema::EntitySchema;
use crate::service::{ServiceDescriptor, ServiceDomainDescriptor};

use super::{
    AggregatorMember, DomainAggregator, ENTITIES_TYPE_NAME, EntityExtensions, EntityProperty,
    EntityType, FieldDefinition, FieldRecord, GeneratedModel, REGISTRATION_TYPE_NAME,
    RootAggregator, SERVICES_TYPE_NAME, ServiceGroup, ServiceMethod, TypeDefinition,
};

/// Build the generated model.
///
/// Output order: registration, root entities, one aggregator per entity
/// domain, entity types, attribute records, root services, one group per
/// service domain, parameter records, entity extensions. Identical input
/// gives an identical model.
///
/// # Errors
///
/// Fails on the first [`GenerationError`]: an unknown service field type,
/// two types sharing a name, or two members of a type sharing a name.
pub fn generate(
    schemas: &[EntitySchema],
    catalog: &[ServiceDomainDescriptor],
) -> Result<GeneratedModel, GenerationError> {
    let entity_section = EntitySection::build(schemas);
    let service_section = ServiceSection::build(catalog)?;

    let mut injectable = vec![ENTITIES_TYPE_NAME.to_string()];
    injectable.extend(entity_section.aggregators.iter().map(|a| a.name.clone()));
    injectable.push(SERVICES_TYPE_NAME.to_string());
    injectable.extend(service_section.groups.iter().map(|g| g.name.clone()));

    let extensions = service_section
        .groups
        .iter()
        .filter_map(|group| {
            let entity_types = entity_section.entity_types_of(&group.domain);
            if entity_types.is_empty() {
                return None;
            }
            Some(EntityExtensions {
                name: format!("{}EntityExtensions", domain_type_prefix(&group.domain)),
                domain: group.domain.clone(),
                entity_types,
                methods: group.methods.clone(),
            })
        })
        .collect::<Vec<_>>();

    let mut types = vec![
        TypeDefinition::Registration(super::Registration {
            name: REGISTRATION_TYPE_NAME.to_string(),
            injectable,
        }),
        TypeDefinition::RootEntities(entity_section.root),
    ];
    types.extend(
        entity_section
            .aggregators
            .into_iter()
            .map(TypeDefinition::DomainEntities),
    );
    types.extend(entity_section.entity_types.into_iter().map(TypeDefinition::Entity));
    types.extend(
        entity_section
            .attribute_records
            .into_iter()
            .map(TypeDefinition::AttributeRecord),
    );
    types.push(TypeDefinition::RootServices(service_section.root));
    types.extend(service_section.groups.into_iter().map(TypeDefinition::ServiceGroup));
    types.extend(
        service_section
            .parameters
            .into_iter()
            .map(TypeDefinition::ServiceParameters),
    );
    types.extend(extensions.into_iter().map(TypeDefinition::EntityExtensions));

    validate(&types)?;
    Ok(GeneratedModel { types })
}

struct EntitySection {
    root: RootAggregator,
    aggregators: Vec<DomainAggregator>,
    entity_types: Vec<EntityType>,
    attribute_records: Vec<FieldRecord>,
}

impl EntitySection {
    fn build(schemas: &[EntitySchema]) -> Self {
        let mut flags: BTreeMap<&str, BTreeSet<bool>> = BTreeMap::new();
        for schema in schemas {
            flags
                .entry(schema.domain.as_str())
                .or_default()
                .insert(schema.is_numeric);
        }

        let mut entity_types = Vec::with_capacity(schemas.len());
        let mut attribute_records = Vec::with_capacity(schemas.len());
        // domain -> (entity id, entity type name)
        let mut members: BTreeMap<&str, Vec<(&str, String)>> = BTreeMap::new();

        for schema in schemas {
            let mixed = flags
                .get(schema.domain.as_str())
                .is_some_and(|f| f.len() > 1);
            let numeric_prefix = if schema.is_numeric && mixed { "Numeric" } else { "" };
            let base = format!("{numeric_prefix}{}", domain_type_prefix(&schema.domain));
            let entity_type = format!("{base}Entity");
            let attributes = format!("{base}EntityAttributes");

            let resolved: HashMap<&str, _> = schema
                .attributes
                .iter()
                .map(|a| (a.name.as_str(), a.resolved_type))
                .collect();
            let fields = canonical_names(schema.attributes.iter().map(|a| a.name.as_str()), FIELD_PREFIX)
                .into_iter()
                .filter_map(|CanonicalName { source_key, identifier }| {
                    let field_type = *resolved.get(source_key.as_str())?;
                    Some(FieldDefinition {
                        identifier,
                        source_key,
                        field_type,
                        required: false,
                        description: None,
                    })
                })
                .collect();

            let origin = if schema.is_numeric {
                format!("{} (numeric)", schema.domain)
            } else {
                schema.domain.clone()
            };
            attribute_records.push(FieldRecord {
                name: attributes.clone(),
                origin,
                fields,
            });

            let slot = members.entry(schema.domain.as_str()).or_default();
            slot.extend(
                schema
                    .entities
                    .iter()
                    .map(|e| (e.entity_id.as_str(), entity_type.clone())),
            );

            entity_types.push(EntityType {
                name: entity_type,
                domain: schema.domain.clone(),
                numeric: schema.is_numeric,
                attributes,
            });
        }

        let aggregators: Vec<DomainAggregator> = members
            .into_iter()
            .map(|(domain, entities)| domain_aggregator(domain, &entities))
            .collect();

        let root = RootAggregator {
            name: ENTITIES_TYPE_NAME.to_string(),
            members: aggregators
                .iter()
                .map(|a| AggregatorMember {
                    identifier: domain_type_prefix(&a.domain),
                    domain: a.domain.clone(),
                    type_name: a.name.clone(),
                })
                .collect(),
        };

        Self {
            root,
            aggregators,
            entity_types,
            attribute_records,
        }
    }

    fn entity_types_of(&self, domain: &str) -> Vec<String> {
        self.entity_types
            .iter()
            .filter(|t| t.domain == domain)
            .map(|t| t.name.clone())
            .collect()
    }
}

fn domain_aggregator(domain: &str, entities: &[(&str, String)]) -> DomainAggregator {
    let items: Vec<(String, String)> = entities
        .iter()
        .map(|(id, _)| {
            let object = entity_id::object_id(id);
            let key = if object.is_empty() { *id } else { object };
            (naming::resolve(key, ENTITY_PREFIX), (*id).to_string())
        })
        .collect();
    let identifiers = naming::dedupe(&items);

    let mut properties: Vec<EntityProperty> = entities
        .iter()
        .zip(identifiers)
        .map(|((id, entity_type), identifier)| EntityProperty {
            identifier,
            entity_id: (*id).to_string(),
            entity_type: entity_type.clone(),
        })
        .collect();
    properties.sort_by(|a, b| {
        a.identifier
            .cmp(&b.identifier)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    DomainAggregator {
        name: format!("{}Entities", domain_type_prefix(domain)),
        domain: domain.to_string(),
        entities: properties,
    }
}

struct ServiceSection {
    root: RootAggregator,
    groups: Vec<ServiceGroup>,
    parameters: Vec<FieldRecord>,
}

impl ServiceSection {
    fn build(catalog: &[ServiceDomainDescriptor]) -> Result<Self, GenerationError> {
        let mut domains: Vec<&ServiceDomainDescriptor> =
            catalog.iter().filter(|d| !d.services.is_empty()).collect();
        domains.sort_by(|a, b| a.domain.cmp(&b.domain));

        let mut groups = Vec::with_capacity(domains.len());
        let mut parameters = Vec::new();
        for descriptor in domains {
            let (group, records) = service_group(descriptor)?;
            groups.push(group);
            parameters.extend(records);
        }

        let root = RootAggregator {
            name: SERVICES_TYPE_NAME.to_string(),
            members: groups
                .iter()
                .map(|g| AggregatorMember {
                    identifier: domain_type_prefix(&g.domain),
                    domain: g.domain.clone(),
                    type_name: g.name.clone(),
                })
                .collect(),
        };

        Ok(Self {
            root,
            groups,
            parameters,
        })
    }
}

fn service_group(
    descriptor: &ServiceDomainDescriptor,
) -> Result<(ServiceGroup, Vec<FieldRecord>), GenerationError> {
    let domain = descriptor.domain.as_str();
    let prefix = domain_type_prefix(domain);
    let by_name: HashMap<&str, &ServiceDescriptor> = descriptor
        .services
        .iter()
        .map(|s| (s.name.as_str(), s))
        .collect();

    let mut services: Vec<&ServiceDescriptor> = descriptor.services.iter().collect();
    services.sort_by(|a, b| a.name.cmp(&b.name));

    let mut methods = Vec::with_capacity(services.len());
    let mut records = Vec::new();
    for CanonicalName { source_key, identifier } in
        canonical_names(services.iter().map(|s| s.name.as_str()), FIELD_PREFIX)
    {
        let Some(service) = by_name.get(source_key.as_str()) else {
            continue;
        };

        let parameters = if service.fields.is_empty() {
            None
        } else {
            let record = parameter_record(domain, &prefix, &identifier, service)?;
            let name = record.name.clone();
            records.push(record);
            Some(name)
        };

        methods.push(ServiceMethod {
            identifier,
            service: service.name.clone(),
            description: service.description.clone(),
            parameters,
        });
    }

    let group = ServiceGroup {
        name: format!("{prefix}Services"),
        domain: domain.to_string(),
        methods,
    };
    Ok((group, records))
}

fn parameter_record(
    domain: &str,
    domain_prefix: &str,
    method: &str,
    service: &ServiceDescriptor,
) -> Result<FieldRecord, GenerationError> {
    let by_name: HashMap<&str, _> = service.fields.iter().map(|f| (f.name.as_str(), f)).collect();

    let mut fields = Vec::with_capacity(service.fields.len());
    for CanonicalName { source_key, identifier } in
        canonical_names(service.fields.iter().map(|f| f.name.as_str()), FIELD_PREFIX)
    {
        let Some(field) = by_name.get(source_key.as_str()) else {
            continue;
        };
        fields.push(FieldDefinition {
            field_type: field.resolved_type(domain, &service.name)?,
            identifier,
            source_key,
            required: field.required,
            description: field.description.clone(),
        });
    }

    Ok(FieldRecord {
        name: format!("{domain_prefix}{method}Parameters"),
        origin: format!("{domain}.{}", service.name),
        fields,
    })
}

fn validate(types: &[TypeDefinition]) -> Result<(), GenerationError> {
    let mut seen: HashMap<&str, &TypeDefinition> = HashMap::with_capacity(types.len());
    for definition in types {
        if let Some(first) = seen.insert(definition.name(), definition) {
            return Err(GenerationError::DuplicateTypeName {
                name: definition.name().to_string(),
                first: first.origin(),
                second: definition.origin(),
            });
        }
    }

    for definition in types {
        let mut members = HashSet::new();
        for member in definition.member_identifiers() {
            if !members.insert(member) {
                return Err(GenerationError::DuplicateMemberName {
                    type_name: definition.name().to_string(),
                    member: member.to_string(),
                });
            }
        }
    }
    Ok(())
}
