use hubkit_codegen::config::Config;
use hubkit_codegen::pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(&config.logging.filter)?)
        .init();

    tracing::info!(
        snapshot = %config.source.snapshot.display(),
        format = ?config.output.format,
        "generating model"
    );

    let summary = pipeline::run(&config).await?;

    tracing::info!(
        types = summary.types,
        bytes = summary.bytes,
        output = %summary.output.display(),
        "model written"
    );
    Ok(())
}
