//! Renderer error types.

use hubkit_domain::error::HubError;

/// Errors specific to rendering a generated model.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Writing into the output buffer failed.
    #[error("failed to write generated source")]
    Format(#[from] std::fmt::Error),

    /// The model could not be serialized.
    #[error("failed to serialize generated model")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    /// Convert into a [`HubError::Source`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> HubError {
        HubError::Source(Box::new(self))
    }
}

impl From<RenderError> for HubError {
    fn from(err: RenderError) -> Self {
        err.into_domain()
    }
}
