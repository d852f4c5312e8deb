//! # hubkit-model-fixture
//!
//! Rust model rendered from `fixtures/snapshot.json` by the build script.
//!
//! The crate only exists so the rendered source goes through the compiler;
//! its tests drive the generated handles against the in-process bus.

#[allow(clippy::all, clippy::pedantic, dead_code)]
pub mod model {
    include!(concat!(env!("OUT_DIR"), "/model.rs"));
}
