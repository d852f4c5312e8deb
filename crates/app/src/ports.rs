//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod metadata_source;
pub mod renderer;
pub mod state_bus;

pub use metadata_source::MetadataSource;
pub use renderer::ModelRenderer;
pub use state_bus::{RawChangeStream, StateBus};
