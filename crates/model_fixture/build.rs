use std::path::{Path, PathBuf};

use hubkit_adapter_codegen_rust::RustRenderer;
use hubkit_adapter_snapshot_json::Snapshot;
use hubkit_domain::model::generate;
use hubkit_domain::schema::{SchemaOptions, assemble};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Path::new("fixtures/snapshot.json");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", fixture.display());

    let snapshot = Snapshot::from_slice(&std::fs::read(fixture)?)?;
    let schemas = assemble(&snapshot.states, &SchemaOptions::default());
    let model = generate(&schemas, &snapshot.service_catalog())?;
    let source = RustRenderer::default().render_source(&model)?;

    let out = PathBuf::from(std::env::var("OUT_DIR")?).join("model.rs");
    std::fs::write(out, source)?;
    Ok(())
}
