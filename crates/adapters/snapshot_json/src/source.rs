//! [`MetadataSource`] reading a snapshot file.

use std::future::Future;
use std::path::{Path, PathBuf};

use hubkit_app::ports::MetadataSource;
use hubkit_domain::error::HubError;
use hubkit_domain::sample::EntitySample;
use hubkit_domain::service::ServiceDomainDescriptor;

use crate::error::SnapshotError;
use crate::format::Snapshot;

/// Reads the snapshot file on every fetch, so edits are picked up without a
/// restart.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Io`] when the file cannot be read and
    /// [`SnapshotError::Parse`] when it is not a snapshot.
    pub async fn load(&self) -> Result<Snapshot, SnapshotError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SnapshotError::Io {
                path: self.path.clone(),
                source,
            })?;
        let snapshot = Snapshot::from_slice(&bytes)?;
        tracing::debug!(
            path = %self.path.display(),
            states = snapshot.states.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }
}

impl MetadataSource for SnapshotSource {
    fn fetch_entity_samples(
        &self,
    ) -> impl Future<Output = Result<Vec<EntitySample>, HubError>> + Send {
        async move { Ok(self.load().await?.states) }
    }

    fn fetch_service_catalog(
        &self,
    ) -> impl Future<Output = Result<Vec<ServiceDomainDescriptor>, HubError>> + Send {
        async move { Ok(self.load().await?.service_catalog()) }
    }
}
