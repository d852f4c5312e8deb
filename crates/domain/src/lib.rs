//! # hubkit-domain
//!
//! Pure domain model for hubkit, the typed client toolkit for a home
//! automation hub.
//!
//! ## Responsibilities
//! - Foundational types: bus identifiers, error conventions
//! - Describe **entity samples** and group them into typed **schemas**
//! - Infer scalar **attribute types** and resolve raw keys into identifiers
//! - Build the declarative **generated model** renderers consume
//! - Define runtime **entity states**, attribute decoders and **service calls**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod area;
pub mod entity_id;
pub mod inference;
pub mod model;
pub mod naming;
pub mod sample;
pub mod schema;
pub mod service;
pub mod state;
