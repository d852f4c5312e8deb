//! # hubkit-adapter-codegen-rust
//!
//! Renderers for the generated model.
//!
//! ## Responsibilities
//! - Implement the `ModelRenderer` port defined in `hubkit-app::ports`
//! - `RustRenderer`: one Rust source file with typed attribute records,
//!   entity handles, aggregators, service groups and extension traits
//! - `JsonRenderer`: the declarative model itself, for other toolchains
//!
//! ## Dependency rule
//! Depends on `hubkit-app` (for port traits) and `hubkit-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod ident;
pub mod json;
pub mod rust;

pub use error::RenderError;
pub use json::JsonRenderer;
pub use rust::RustRenderer;
