//! Model service: the build-time pipeline from hub metadata to source text.

use hubkit_domain::error::HubError;
use hubkit_domain::model::{GeneratedModel, generate};
use hubkit_domain::schema::{SchemaOptions, assemble};

use crate::ports::{MetadataSource, ModelRenderer};

/// Fetches metadata, assembles schemas and generates the model.
pub struct ModelService<M> {
    source: M,
    options: SchemaOptions,
}

impl<M: MetadataSource> ModelService<M> {
    /// Create a new service reading from the given source.
    pub fn new(source: M, options: SchemaOptions) -> Self {
        Self { source, options }
    }

    /// Fetch a fresh snapshot and build the generated model.
    ///
    /// # Errors
    ///
    /// Returns the source's error when fetching fails, or
    /// [`HubError::Generation`] when the snapshot cannot be turned into a
    /// consistent model.
    #[tracing::instrument(skip(self), err)]
    pub async fn generate(&self) -> Result<GeneratedModel, HubError> {
        let samples = self.source.fetch_entity_samples().await?;
        let catalog = self.source.fetch_service_catalog().await?;

        let schemas = assemble(&samples, &self.options);
        tracing::info!(
            entities = samples.len(),
            groups = schemas.len(),
            service_domains = catalog.len(),
            "assembled entity schemas"
        );

        let model = generate(&schemas, &catalog)?;
        tracing::info!(types = model.types.len(), "generated model");
        Ok(model)
    }

    /// Generate the model and render it with `renderer`.
    ///
    /// # Errors
    ///
    /// Same as [`generate`](Self::generate), plus the renderer's error.
    #[tracing::instrument(skip(self, renderer))]
    pub async fn render<R: ModelRenderer>(&self, renderer: &R) -> Result<String, HubError> {
        let model = self.generate().await?;
        let output = renderer.render(&model)?;
        tracing::debug!(bytes = output.len(), "rendered model");
        Ok(output)
    }
}
