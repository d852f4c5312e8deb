//! # hubkit-app
//!
//! Application layer: runtime entity handles, state-change streams, and
//! **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `MetadataSource`: entity snapshot and service catalog
//!   - `StateBus`: live state-change feed, state cache, areas, service calls
//!   - `ModelRenderer`: generated model to source text
//! - Define **driving/inbound** use-cases:
//!   - `ModelService`: fetch, assemble, generate, render
//!   - `Entity` / `NumericEntity`: typed handles over a state bus
//!   - stream combinators (changed-only, fan-in, `when_state_is_for`)
//!   - bulk service calls over several handles
//! - Provide **in-process infrastructure** (state bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `hubkit-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod entity;
pub mod ports;
pub mod service_call;
pub mod services;
pub mod state_bus;
pub mod state_change;
pub mod stream;
pub mod temporal;
