//! Error types for the folder organizer.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the folder organizer.
#[derive(Error, Debug)]
pub enum Error {
    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Destination already exists: {0}")]
    DestinationExists(String),

    // Staging errors
    #[error("Cannot create staging directory {path}: {reason}")]
    StagingUnavailable { path: String, reason: String },

    #[error("Refusing to delete protected location: {0}")]
    DangerousRoot(String),

    // Transform errors
    #[error("Transform failed: {0}")]
    TransformFailed(String),

    #[error("Transform produced an empty result: {0}")]
    EmptyOutput(String),

    #[error("Transform cancelled")]
    Cancelled,

    // Plan/Execute errors
    #[error("Invalid plan file: {0}")]
    InvalidPlanFile(String),

    #[error("Executor error: {0}")]
    ExecuteError(String),

    // Journal errors
    #[error("Invalid journal file: {0}")]
    InvalidJournalFile(String),

    #[error("Undo conflict: {0}")]
    UndoConflict(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error ends the whole run rather than a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::StagingUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_error_is_fatal() {
        let err = Error::StagingUnavailable {
            path: "/x/.temp".to_string(),
            reason: "read-only".to_string(),
        };
        assert!(err.is_fatal());
        assert!(!Error::Cancelled.is_fatal());
        assert!(!Error::other("boom").is_fatal());
    }
}
