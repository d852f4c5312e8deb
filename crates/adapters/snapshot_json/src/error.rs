//! Snapshot adapter error types.

use std::path::PathBuf;

use hubkit_domain::error::HubError;

/// Errors specific to reading a snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot file could not be read.
    #[error("failed to read snapshot {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid snapshot document.
    #[error("failed to parse snapshot")]
    Parse(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Convert into a [`HubError::Source`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> HubError {
        HubError::Source(Box::new(self))
    }
}

impl From<SnapshotError> for HubError {
    fn from(err: SnapshotError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_io_error_with_path() {
        let err = SnapshotError::Io {
            path: PathBuf::from("/tmp/missing.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "failed to read snapshot /tmp/missing.json");
    }

    #[test]
    fn should_convert_parse_error_to_source_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err: HubError = SnapshotError::Parse(json_err).into();
        assert!(matches!(err, HubError::Source(_)));
    }
}
