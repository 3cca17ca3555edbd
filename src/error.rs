// ============================================================
// Error Taxonomy
// ============================================================
// Every failure the core can surface to a caller. The CLI layer
// wraps these in anyhow; everything below it returns them typed
// so the routing layer can map them onto client / unavailable
// responses without string matching.

use thiserror::Error;

use crate::domain::artifact::VersionId;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// How a failure should be presented to whoever asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself is bad; retrying the same input will fail again.
    Client,
    /// No usable model right now; the caller may retry later.
    Unavailable,
    /// A training run failed; serving is unaffected.
    Training,
    /// Storage or numeric failure inside the core.
    Internal,
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("input is not valid UTF-8 text: {0}")]
    InvalidEncoding(String),

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("model version {0} not found")]
    VersionNotFound(VersionId),

    #[error("no model has been published yet")]
    ModelUnavailable,

    #[error("insufficient training data: {0}")]
    InsufficientData(String),

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("operation cancelled by caller")]
    Cancelled,

    #[error("cannot read corpus: {0}")]
    Corpus(String),

    #[error("artifact store failure: {0}")]
    Storage(#[from] StoreError),

    #[error("model computation failed: {0}")]
    Compute(String),
}

impl ClassifierError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ClassifierError::InvalidEncoding(_) | ClassifierError::Cancelled => ErrorClass::Client,
            ClassifierError::VersionNotFound(_) | ClassifierError::ModelUnavailable => {
                ErrorClass::Unavailable
            }
            ClassifierError::InvalidArtifact(_)
            | ClassifierError::InsufficientData(_)
            | ClassifierError::InvalidConfig(_)
            | ClassifierError::Corpus(_) => ErrorClass::Training,
            ClassifierError::Storage(_) | ClassifierError::Compute(_) => ErrorClass::Internal,
        }
    }
}

/// Failures reported by an [`ArtifactStore`](crate::domain::traits::ArtifactStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no artifact stored for version {0}")]
    NotFound(VersionId),

    /// A create-only write or compare-and-swap lost a race.
    #[error("concurrent modification detected")]
    Conflict,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt store record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io { context: context.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(ClassifierError::InvalidEncoding("x".into()).class(), ErrorClass::Client);
        assert_eq!(ClassifierError::ModelUnavailable.class(), ErrorClass::Unavailable);
        assert_eq!(ClassifierError::VersionNotFound(VersionId::new(3)).class(), ErrorClass::Unavailable);
        assert_eq!(ClassifierError::InsufficientData("x".into()).class(), ErrorClass::Training);
        assert_eq!(ClassifierError::InvalidConfig("x".into()).class(), ErrorClass::Training);
        assert_eq!(ClassifierError::from(StoreError::Conflict).class(), ErrorClass::Internal);
    }

    #[test]
    fn test_version_in_message() {
        let err = ClassifierError::VersionNotFound(VersionId::new(42));
        assert_eq!(err.to_string(), "model version 42 not found");
    }
}
