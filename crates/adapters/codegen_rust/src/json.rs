//! JSON dump of the generated model.

use hubkit_app::ports::ModelRenderer;
use hubkit_domain::error::HubError;
use hubkit_domain::model::GeneratedModel;

use crate::error::RenderError;

/// Renders the model as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ModelRenderer for JsonRenderer {
    fn render(&self, model: &GeneratedModel) -> Result<String, HubError> {
        let mut output = serde_json::to_string_pretty(model).map_err(RenderError::from)?;
        output.push('\n');
        Ok(output)
    }
}
