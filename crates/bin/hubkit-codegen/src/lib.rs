//! # hubkit-codegen
//!
//! Composition root that wires the snapshot source, the model service and
//! the renderers together.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct the snapshot `MetadataSource` adapter
//! - Run the `ModelService` and the configured `ModelRenderer`
//! - Write the rendered model to disk
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

pub mod config;
pub mod pipeline;
