//! Errors surfaced by the tracking operations.

use thiserror::Error;

use crate::store::StoreError;

/// Request-scoped failure of a tracking operation. Nothing here is fatal to
/// the process and nothing is retried internally.
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// The record changed between read and write; the caller may resubmit
    #[error("{0}")]
    Conflict(String),

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for TrackingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing(id) => TrackingError::NotFound(format!("Record '{}' not found", id)),
            StoreError::Duplicate(_)
            | StoreError::VersionConflict { .. }
            | StoreError::SessionSuperseded(_) => {
                TrackingError::Conflict(err.to_string())
            }
            StoreError::Io(_) | StoreError::Serialization(_) => {
                TrackingError::StoreUnavailable(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let missing: TrackingError = StoreError::Missing("s1".to_string()).into();
        assert!(matches!(missing, TrackingError::NotFound(msg) if msg.contains("s1")));

        let conflict: TrackingError = StoreError::VersionConflict {
            id: "s1".to_string(),
            expected: 2,
            found: 3,
        }
        .into();
        assert!(matches!(conflict, TrackingError::Conflict(_)));

        let io: TrackingError =
            StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")).into();
        assert!(matches!(io, TrackingError::StoreUnavailable(msg) if msg.contains("disk full")));
    }
}
