//! Renderer port: turns a generated model into source text.

use hubkit_domain::error::HubError;
use hubkit_domain::model::GeneratedModel;

/// A code generation backend.
pub trait ModelRenderer {
    /// Render the whole model as a single file.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Source`] when the backend cannot express part of
    /// the model.
    fn render(&self, model: &GeneratedModel) -> Result<String, HubError>;
}
