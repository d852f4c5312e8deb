//! Rust source renderer.
//!
//! The output is a single module meant to be dropped into a crate that
//! depends on `hubkit-app`, `hubkit-domain`, `serde` (with `derive`) and
//! `serde_json`. Every item is reachable from `Entities<B>` and
//! `Services<B>`, both built from an `Arc` of the state bus.

use std::fmt::Write;

use hubkit_app::ports::ModelRenderer;
use hubkit_domain::error::HubError;
use hubkit_domain::inference::AttributeType;
use hubkit_domain::model::{
    DomainAggregator, EntityExtensions, EntityType, FieldRecord, GeneratedModel, Registration,
    RootAggregator, ServiceGroup, ServiceMethod, TypeDefinition,
};

use crate::error::RenderError;
use crate::ident::member_name;

const INDENT: &str = "    ";

/// Renders a [`GeneratedModel`] as Rust source.
#[derive(Debug, Clone)]
pub struct RustRenderer {
    app_crate: String,
    domain_crate: String,
}

impl Default for RustRenderer {
    fn default() -> Self {
        Self {
            app_crate: "hubkit_app".to_string(),
            domain_crate: "hubkit_domain".to_string(),
        }
    }
}

impl ModelRenderer for RustRenderer {
    fn render(&self, model: &GeneratedModel) -> Result<String, HubError> {
        Ok(self.render_source(model)?)
    }
}

impl RustRenderer {
    /// Use other paths for the runtime crates, e.g. when they are
    /// re-exported.
    pub fn with_crate_paths(app_crate: impl Into<String>, domain_crate: impl Into<String>) -> Self {
        Self {
            app_crate: app_crate.into(),
            domain_crate: domain_crate.into(),
        }
    }

    /// Render the whole model.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Format`] if writing to the buffer fails.
    pub fn render_source(&self, model: &GeneratedModel) -> Result<String, RenderError> {
        tracing::debug!(types = model.types.len(), "rendering rust source");
        let mut out = String::new();
        writeln!(out, "// @generated by hubkit-codegen. Do not edit by hand.")?;
        self.write_helpers(&mut out)?;

        for definition in &model.types {
            writeln!(out)?;
            match definition {
                TypeDefinition::Registration(registration) => {
                    write_registration(&mut out, registration)?;
                }
                TypeDefinition::RootEntities(root) => {
                    self.write_root(&mut out, root, "Entity aggregators of every domain.")?;
                }
                TypeDefinition::RootServices(root) => {
                    self.write_root(&mut out, root, "Service groups of every domain.")?;
                }
                TypeDefinition::DomainEntities(aggregator) => {
                    self.write_domain_entities(&mut out, aggregator)?;
                }
                TypeDefinition::Entity(entity) => self.write_entity_type(&mut out, entity)?,
                TypeDefinition::AttributeRecord(record) => {
                    self.write_attribute_record(&mut out, record)?;
                }
                TypeDefinition::ServiceGroup(group) => self.write_service_group(&mut out, group)?,
                TypeDefinition::ServiceParameters(record) => write_parameters(&mut out, record)?,
                TypeDefinition::EntityExtensions(extensions) => {
                    self.write_extensions(&mut out, extensions)?;
                }
            }
        }
        Ok(out)
    }

    fn hub_error(&self) -> String {
        format!("{}::error::HubError", self.domain_crate)
    }

    fn state_bus(&self) -> String {
        format!("{}::ports::StateBus", self.app_crate)
    }

    fn write_helpers(&self, out: &mut String) -> Result<(), RenderError> {
        let error = self.hub_error();
        writeln!(out)?;
        writeln!(out, "#[allow(dead_code)]")?;
        writeln!(
            out,
            "fn service_data<T: ::serde::Serialize>(data: &T) -> Result<::serde_json::Value, {error}> {{"
        )?;
        writeln!(
            out,
            "{INDENT}::serde_json::to_value(data).map_err(|err| {error}::Source(::std::boxed::Box::new(err)))"
        )?;
        writeln!(out, "}}")?;
        Ok(())
    }

    fn write_root(
        &self,
        out: &mut String,
        root: &RootAggregator,
        summary: &str,
    ) -> Result<(), RenderError> {
        write_doc(out, "", summary)?;
        write_bus_holder(out, &root.name)?;
        writeln!(out, "impl<B: {}> {}<B> {{", self.state_bus(), root.name)?;
        for (index, member) in root.members.iter().enumerate() {
            if index > 0 {
                writeln!(out)?;
            }
            write_doc(out, INDENT, &format!("Domain `{}`.", member.domain))?;
            writeln!(
                out,
                "{INDENT}pub fn {}(&self) -> {}<B> {{",
                member_name(&member.identifier),
                member.type_name
            )?;
            writeln!(
                out,
                "{INDENT}{INDENT}<{}<B> as ::std::convert::From<::std::sync::Arc<B>>>::from(::std::sync::Arc::clone(&self.bus))",
                member.type_name
            )?;
            writeln!(out, "{INDENT}}}")?;
        }
        writeln!(out, "}}")?;
        Ok(())
    }

    fn write_domain_entities(
        &self,
        out: &mut String,
        aggregator: &DomainAggregator,
    ) -> Result<(), RenderError> {
        write_doc(out, "", &format!("Entities of domain `{}`.", aggregator.domain))?;
        write_bus_holder(out, &aggregator.name)?;
        writeln!(out, "impl<B: {}> {}<B> {{", self.state_bus(), aggregator.name)?;
        for (index, property) in aggregator.entities.iter().enumerate() {
            if index > 0 {
                writeln!(out)?;
            }
            write_doc(out, INDENT, &format!("`{}`", property.entity_id))?;
            writeln!(
                out,
                "{INDENT}pub fn {}(&self) -> {}<B> {{",
                member_name(&property.identifier),
                property.entity_type
            )?;
            writeln!(
                out,
                "{INDENT}{INDENT}{}::new(::std::sync::Arc::clone(&self.bus), {:?})",
                property.entity_type, property.entity_id
            )?;
            writeln!(out, "{INDENT}}}")?;
        }
        writeln!(out, "}}")?;
        Ok(())
    }

    fn write_entity_type(&self, out: &mut String, entity: &EntityType) -> Result<(), RenderError> {
        let app = &self.app_crate;
        let bus = self.state_bus();
        let name = &entity.name;
        let decoder = format!(
            "{}::state::SerdeDecoder<{}>",
            self.domain_crate, entity.attributes
        );
        let (inner, narrow) = if entity.numeric {
            (
                format!("{app}::entity::NumericEntity<B, {decoder}>"),
                ".as_numeric()",
            )
        } else {
            (format!("{app}::entity::Entity<B, {decoder}>"), "")
        };

        let kind = if entity.numeric { "Numeric entity" } else { "Entity" };
        write_doc(out, "", &format!("{kind} of domain `{}`.", entity.domain))?;
        writeln!(out, "pub struct {name}<B>(pub {inner});")?;
        writeln!(out)?;

        writeln!(out, "impl<B: {bus}> {name}<B> {{")?;
        writeln!(
            out,
            "{INDENT}pub fn new(bus: ::std::sync::Arc<B>, entity_id: &str) -> Self {{"
        )?;
        writeln!(
            out,
            "{INDENT}{INDENT}Self({app}::entity::Entity::new(bus, entity_id).with_attributes_as::<{}>(){narrow})",
            entity.attributes
        )?;
        writeln!(out, "{INDENT}}}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "impl<B> ::std::clone::Clone for {name}<B> {{")?;
        writeln!(out, "{INDENT}fn clone(&self) -> Self {{")?;
        writeln!(out, "{INDENT}{INDENT}Self(self.0.clone())")?;
        writeln!(out, "{INDENT}}}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "impl<B: {bus}> ::std::fmt::Debug for {name}<B> {{")?;
        writeln!(
            out,
            "{INDENT}fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {{"
        )?;
        writeln!(out, "{INDENT}{INDENT}f.debug_tuple({name:?}).field(&self.0).finish()")?;
        writeln!(out, "{INDENT}}}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "impl<B: {bus}> ::std::cmp::PartialEq for {name}<B> {{")?;
        writeln!(out, "{INDENT}fn eq(&self, other: &Self) -> bool {{")?;
        writeln!(out, "{INDENT}{INDENT}self.0 == other.0")?;
        writeln!(out, "{INDENT}}}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "impl<B> ::std::ops::Deref for {name}<B> {{")?;
        writeln!(out, "{INDENT}type Target = {inner};")?;
        writeln!(out)?;
        writeln!(out, "{INDENT}fn deref(&self) -> &Self::Target {{")?;
        writeln!(out, "{INDENT}{INDENT}&self.0")?;
        writeln!(out, "{INDENT}}}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "impl<B: {bus}> {app}::entity::EntityHandle for {name}<B> {{")?;
        writeln!(out, "{INDENT}type Bus = B;")?;
        writeln!(out)?;
        writeln!(out, "{INDENT}fn bus(&self) -> &::std::sync::Arc<B> {{")?;
        writeln!(out, "{INDENT}{INDENT}{app}::entity::EntityHandle::bus(&self.0)")?;
        writeln!(out, "{INDENT}}}")?;
        writeln!(out)?;
        writeln!(out, "{INDENT}fn entity_id(&self) -> &str {{")?;
        writeln!(out, "{INDENT}{INDENT}{app}::entity::EntityHandle::entity_id(&self.0)")?;
        writeln!(out, "{INDENT}}}")?;
        writeln!(out, "}}")?;
        Ok(())
    }

    fn write_attribute_record(&self, out: &mut String, record: &FieldRecord) -> Result<(), RenderError> {
        write_doc(out, "", &format!("Attributes of `{}` entities.", record.origin))?;
        writeln!(
            out,
            "#[derive(Debug, Clone, Default, PartialEq, ::serde::Deserialize)]"
        )?;
        writeln!(out, "pub struct {} {{", record.name)?;
        for field in &record.fields {
            writeln!(
                out,
                "{INDENT}#[serde(rename = {:?}, default, deserialize_with = \"{}::state::lenient_field\")]",
                field.source_key, self.domain_crate
            )?;
            writeln!(
                out,
                "{INDENT}pub {}: Option<{}>,",
                member_name(&field.identifier),
                rust_type(field.field_type)
            )?;
        }
        writeln!(out, "}}")?;
        Ok(())
    }

    fn write_service_group(&self, out: &mut String, group: &ServiceGroup) -> Result<(), RenderError> {
        let error = self.hub_error();
        let domain_crate = &self.domain_crate;

        write_doc(out, "", &format!("Services of domain `{}`.", group.domain))?;
        write_bus_holder(out, &group.name)?;
        writeln!(out, "impl<B: {}> {}<B> {{", self.state_bus(), group.name)?;
        for (index, method) in group.methods.iter().enumerate() {
            if index > 0 {
                writeln!(out)?;
            }
            write_method_doc(out, INDENT, &group.domain, method)?;
            let data_param = method
                .parameters
                .as_ref()
                .map(|record| format!(", data: {record}"))
                .unwrap_or_default();
            writeln!(
                out,
                "{INDENT}pub async fn {}(&self, target: {domain_crate}::service::ServiceTarget{data_param}) -> Result<(), {error}> {{",
                member_name(&method.identifier)
            )?;
            let data = if method.parameters.is_some() {
                writeln!(out, "{INDENT}{INDENT}let data = service_data(&data)?;")?;
                "Some(data)"
            } else {
                "None"
            };
            writeln!(out, "{INDENT}{INDENT}let call = {domain_crate}::service::ServiceCall {{")?;
            writeln!(out, "{INDENT}{INDENT}{INDENT}domain: {:?}.to_string(),", group.domain)?;
            writeln!(out, "{INDENT}{INDENT}{INDENT}service: {:?}.to_string(),", method.service)?;
            writeln!(out, "{INDENT}{INDENT}{INDENT}target,")?;
            writeln!(out, "{INDENT}{INDENT}{INDENT}data: {data},")?;
            writeln!(out, "{INDENT}{INDENT}}};")?;
            writeln!(
                out,
                "{INDENT}{INDENT}{}::call_service(&*self.bus, call).await",
                self.state_bus()
            )?;
            writeln!(out, "{INDENT}}}")?;
        }
        writeln!(out, "}}")?;
        Ok(())
    }

    fn write_extensions(&self, out: &mut String, extensions: &EntityExtensions) -> Result<(), RenderError> {
        let error = self.hub_error();
        let future = format!("impl ::std::future::Future<Output = Result<(), {error}>> + Send");

        write_doc(
            out,
            "",
            &format!("Services of domain `{}` called on its entities.", extensions.domain),
        )?;
        writeln!(out, "pub trait {} {{", extensions.name)?;
        for (index, method) in extensions.methods.iter().enumerate() {
            if index > 0 {
                writeln!(out)?;
            }
            write_method_doc(out, INDENT, &extensions.domain, method)?;
            writeln!(out, "{INDENT}{};", extension_signature(method, &future))?;
        }
        writeln!(out, "}}")?;

        for entity_type in &extensions.entity_types {
            writeln!(out)?;
            writeln!(
                out,
                "impl<B: {}> {} for {entity_type}<B> {{",
                self.state_bus(),
                extensions.name
            )?;
            for (index, method) in extensions.methods.iter().enumerate() {
                if index > 0 {
                    writeln!(out)?;
                }
                let qualified = format!("{}.{}", extensions.domain, method.service);
                writeln!(out, "{INDENT}{} {{", extension_signature(method, &future))?;
                if method.parameters.is_some() {
                    writeln!(out, "{INDENT}{INDENT}async move {{")?;
                    writeln!(out, "{INDENT}{INDENT}{INDENT}let data = service_data(&data)?;")?;
                    writeln!(
                        out,
                        "{INDENT}{INDENT}{INDENT}self.0.call_service({qualified:?}, Some(data)).await"
                    )?;
                    writeln!(out, "{INDENT}{INDENT}}}")?;
                } else {
                    writeln!(out, "{INDENT}{INDENT}self.0.call_service({qualified:?}, None)")?;
                }
                writeln!(out, "{INDENT}}}")?;
            }
            writeln!(out, "}}")?;
        }
        Ok(())
    }
}

fn write_bus_holder(out: &mut String, name: &str) -> Result<(), RenderError> {
    writeln!(out, "pub struct {name}<B> {{")?;
    writeln!(out, "{INDENT}bus: ::std::sync::Arc<B>,")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(
        out,
        "impl<B> ::std::convert::From<::std::sync::Arc<B>> for {name}<B> {{"
    )?;
    writeln!(out, "{INDENT}fn from(bus: ::std::sync::Arc<B>) -> Self {{")?;
    writeln!(out, "{INDENT}{INDENT}Self {{ bus }}")?;
    writeln!(out, "{INDENT}}}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    Ok(())
}

fn write_registration(out: &mut String, registration: &Registration) -> Result<(), RenderError> {
    write_doc(out, "", "Every injectable type of this model.")?;
    writeln!(out, "pub fn registered_types() -> &'static [&'static str] {{")?;
    writeln!(out, "{INDENT}&[")?;
    for name in &registration.injectable {
        writeln!(out, "{INDENT}{INDENT}{name:?},")?;
    }
    writeln!(out, "{INDENT}]")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn write_parameters(out: &mut String, record: &FieldRecord) -> Result<(), RenderError> {
    write_doc(out, "", &format!("Parameters of `{}`.", record.origin))?;
    writeln!(out, "#[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize)]")?;
    writeln!(out, "pub struct {} {{", record.name)?;
    for field in &record.fields {
        if let Some(description) = &field.description {
            write_doc(out, INDENT, description)?;
        }
        if field.required {
            write_doc(out, INDENT, "Required.")?;
        }
        writeln!(
            out,
            "{INDENT}#[serde(rename = {:?}, skip_serializing_if = \"Option::is_none\")]",
            field.source_key
        )?;
        writeln!(
            out,
            "{INDENT}pub {}: Option<{}>,",
            member_name(&field.identifier),
            rust_type(field.field_type)
        )?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

fn extension_signature(method: &ServiceMethod, future: &str) -> String {
    let data_param = method
        .parameters
        .as_ref()
        .map(|record| format!(", data: {record}"))
        .unwrap_or_default();
    format!(
        "fn {}(&self{data_param}) -> {future}",
        member_name(&method.identifier)
    )
}

fn write_method_doc(
    out: &mut String,
    indent: &str,
    domain: &str,
    method: &ServiceMethod,
) -> Result<(), RenderError> {
    match &method.description {
        Some(description) => write_doc(out, indent, description)?,
        None => write_doc(out, indent, &format!("`{domain}.{}`", method.service))?,
    }
    Ok(())
}

fn write_doc(out: &mut String, indent: &str, text: &str) -> Result<(), RenderError> {
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            writeln!(out, "{indent}///")?;
        } else {
            writeln!(out, "{indent}/// {line}")?;
        }
    }
    Ok(())
}

fn rust_type(field_type: AttributeType) -> &'static str {
    match field_type {
        AttributeType::String => "String",
        AttributeType::Number => "f64",
        AttributeType::Boolean => "bool",
        AttributeType::Opaque => "::serde_json::Value",
    }
}
