//! Error types for vma-fleet

use thiserror::Error;

/// Errors raised by fleet collaborators (directory, template store, image
/// registry, legacy sink).
#[derive(Error, Debug)]
pub enum FleetError {
    /// The named resource does not exist
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A call to the cloud API failed (network, permission, throttling, conflict)
    #[error("{operation} failed: {message}")]
    Upstream {
        operation: &'static str,
        message: String,
    },

    /// The API answered, but the payload is missing a field we rely on
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No client was configured for the requested region
    #[error("Region not configured: {0}")]
    UnknownRegion(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FleetError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        FleetError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn upstream(operation: &'static str, message: impl Into<String>) -> Self {
        FleetError::Upstream {
            operation,
            message: message.into(),
        }
    }

    /// `true` for [`FleetError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, FleetError::NotFound { .. })
    }
}
