//! End-to-end runs of the generation pipeline.
//!
//! Each test reads the fixture snapshot through the real file source,
//! generates the model and writes it into a scratch directory.

use std::path::{Path, PathBuf};

use hubkit_codegen::config::{Config, OutputFormat};
use hubkit_codegen::pipeline;
use hubkit_domain::model::{GeneratedModel, TypeDefinition};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/snapshot.json")
}

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hubkit-codegen-{}-{name}", std::process::id()))
}

fn config(snapshot: PathBuf, output: PathBuf, format: OutputFormat) -> Config {
    let mut config = Config::default();
    config.source.snapshot = snapshot;
    config.output.path = output;
    config.output.format = format;
    config
}

// ---------------------------------------------------------------------------
// Rust output
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_write_rust_model_when_snapshot_is_valid() {
    let dir = scratch("rust");
    let output = dir.join("nested/model.rs");

    let summary = pipeline::run(&config(fixture(), output.clone(), OutputFormat::Rust))
        .await
        .unwrap();

    let source = std::fs::read_to_string(&output).unwrap();
    assert_eq!(summary.output, output);
    assert_eq!(summary.bytes, source.len());
    assert!(source.starts_with("// @generated by hubkit-codegen"));
    assert!(source.contains("pub struct LightEntities<B> {"));
    assert!(source.contains("    pub fn living_room(&self) -> LightEntity<B> {"));
    assert!(source.contains("pub struct NumericSensorEntity<B>"));
    assert!(source.contains("pub struct SensorEntity<B>"));
    assert!(source.contains("pub struct InputNumberEntity<B>(pub hubkit_app::entity::NumericEntity<"));
    assert!(source.contains("pub struct LightTurnOnParameters {"));
    assert!(source.contains("    pub flash: Option<String>,"));
    assert!(source.contains("pub trait InputNumberEntityExtensions {"));
    assert!(!source.contains("PersistentNotification"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn should_produce_identical_output_when_run_twice() {
    let dir = scratch("twice");
    let first = dir.join("first.rs");
    let second = dir.join("second.rs");

    pipeline::run(&config(fixture(), first.clone(), OutputFormat::Rust))
        .await
        .unwrap();
    pipeline::run(&config(fixture(), second.clone(), OutputFormat::Rust))
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(first).unwrap(),
        std::fs::read_to_string(second).unwrap()
    );
    std::fs::remove_dir_all(dir).unwrap();
}

// ---------------------------------------------------------------------------
// JSON output
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_write_declarative_model_when_format_is_json() {
    let dir = scratch("json");
    let output = dir.join("model.json");

    let summary = pipeline::run(&config(fixture(), output.clone(), OutputFormat::Json))
        .await
        .unwrap();

    let model: GeneratedModel =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(model.types.len(), summary.types);
    let Some(TypeDefinition::Registration(registration)) = model.find("Registration") else {
        panic!("missing Registration");
    };
    assert_eq!(
        registration.injectable,
        vec![
            "Entities",
            "InputNumberEntities",
            "LightEntities",
            "SensorEntities",
            "Services",
            "InputNumberServices",
            "LightServices",
        ]
    );
    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn should_honour_numeric_domains_from_config() {
    let dir = scratch("numeric");
    let output = dir.join("model.json");
    let mut config = config(fixture(), output.clone(), OutputFormat::Json);
    config.schema.numeric_domains = Vec::new();

    pipeline::run(&config).await.unwrap();

    let model: GeneratedModel =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let Some(TypeDefinition::Entity(entity)) = model.find("InputNumberEntity") else {
        panic!("missing InputNumberEntity");
    };
    assert!(!entity.numeric);
    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn should_write_model_when_selector_kind_is_unknown() {
    let dir = scratch("unknown");
    std::fs::create_dir_all(&dir).unwrap();
    let snapshot = dir.join("snapshot.json");
    std::fs::write(
        &snapshot,
        r#"{"states": [], "services": [{"domain": "area_tools", "services": {"move": {"fields": {"floor_id": {"required": true, "selector": {"floor": {}}}}}}}]}"#,
    )
    .unwrap();
    let output = dir.join("model.rs");

    pipeline::run(&config(snapshot, output.clone(), OutputFormat::Rust))
        .await
        .unwrap();

    let source = std::fs::read_to_string(&output).unwrap();
    assert!(source.contains("pub struct AreaToolsMoveParameters {"));
    assert!(source.contains("    pub floor_id: Option<::serde_json::Value>,"));
    std::fs::remove_dir_all(dir).unwrap();
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_fail_without_writing_when_snapshot_is_missing() {
    let dir = scratch("missing");
    let output = dir.join("model.rs");

    let result = pipeline::run(&config(
        dir.join("absent.json"),
        output.clone(),
        OutputFormat::Rust,
    ))
    .await;

    assert!(result.is_err());
    assert!(!output.exists());
}
