//! Error taxonomy for the reconciler.

use thiserror::Error;
use vma_fleet::{FleetError, UnrecognizedSelector};

/// Reconciler errors.
///
/// Everything except [`ReconcileError::Listing`] and
/// [`ReconcileError::AsgNotFound`] is scoped to a single group and ends up as
/// that group's `Failed` outcome.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error(transparent)]
    UnrecognizedSelector(#[from] UnrecognizedSelector),

    /// Published a new version but could not point anything at it.
    #[error("published version {new_version} but pointer update failed: {reason}")]
    PointerUpdate { new_version: u64, reason: String },

    #[error("cannot list auto scaling groups in {region}: {source}")]
    Listing {
        region: String,
        #[source]
        source: FleetError,
    },

    #[error("auto scaling group {name} not found in {region}")]
    AsgNotFound { name: String, region: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FleetError> for ReconcileError {
    fn from(err: FleetError) -> Self {
        match err {
            FleetError::NotFound { .. } => ReconcileError::NotFound(err.to_string()),
            other => ReconcileError::Upstream(other.to_string()),
        }
    }
}

/// Result type for reconciler operations.
pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;
