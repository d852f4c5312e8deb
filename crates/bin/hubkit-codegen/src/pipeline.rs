//! One generation run: snapshot in, rendered model out.

use std::path::PathBuf;

use anyhow::Context;

use hubkit_adapter_codegen_rust::{JsonRenderer, RustRenderer};
use hubkit_adapter_snapshot_json::SnapshotSource;
use hubkit_app::ports::ModelRenderer;
use hubkit_app::services::model_service::ModelService;

use crate::config::{Config, OutputFormat};

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub types: usize,
    pub bytes: usize,
    pub output: PathBuf,
}

/// Generate the model described by `config` and write it to the output
/// path, creating parent directories as needed.
///
/// # Errors
///
/// Fails when the snapshot cannot be read, generation reports a
/// collision, or the output cannot be written.
pub async fn run(config: &Config) -> anyhow::Result<Summary> {
    let source = SnapshotSource::new(&config.source.snapshot);
    let service = ModelService::new(source, config.schema_options());

    let model = service.generate().await.with_context(|| {
        format!(
            "failed to generate model from {}",
            config.source.snapshot.display()
        )
    })?;

    let rendered = match config.output.format {
        OutputFormat::Rust => RustRenderer::default().render(&model)?,
        OutputFormat::Json => JsonRenderer.render(&model)?,
    };

    let output = &config.output.path;
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(output, rendered.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok(Summary {
        types: model.types.len(),
        bytes: rendered.len(),
        output: output.clone(),
    })
}
