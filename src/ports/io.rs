use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Read failed for {0}: {1}")]
    OperationFailed(String, String),
}

/// Read-only access to the small text files limit detection depends on
/// (the mount table and the cgroup accounting files).
pub trait LimitSource {
    fn read_to_string(&self, path: &Path) -> Result<String, SourceError>;
}
