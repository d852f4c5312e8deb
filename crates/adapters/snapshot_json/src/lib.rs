//! # hubkit-adapter-snapshot-json
//!
//! File-backed metadata source.
//!
//! ## Responsibilities
//! - Implement the `MetadataSource` port defined in `hubkit-app::ports`
//! - Parse the hub's REST-shaped dump: a `states` list and a `services` list
//! - Map service field selectors onto declared field types
//!
//! ## Dependency rule
//! Depends on `hubkit-app` (for port traits) and `hubkit-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod format;
pub mod source;

pub use error::SnapshotError;
pub use format::Snapshot;
pub use source::SnapshotSource;
