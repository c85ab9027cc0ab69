//! VMA Core Library
//!
//! Reconciles the `Vendor_Managed_AMI` provenance tag across auto-scaling
//! fleets. Launch-template versions are never edited: a group missing the tag
//! gets a new version carrying every existing tag plus the marker, and the
//! group (or the template default) is repointed at it.

pub mod classifier;
pub mod config;
pub mod error;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod outcome;
pub mod policy;
pub mod publisher;
pub mod resolver;
pub mod tagging;
pub mod telemetry;

pub use classifier::{PlaceholderClassifier, ProvenanceClassifier};
pub use config::{AsgFilter, ReconcileConfig, DEFAULT_REGIONS, REGIONS_ENV};
pub use error::{ReconcileError, ReconcileResult};
pub use orchestrator::{Collaborators, Reconciler};
pub use outcome::{AsgOutcome, RemediationOutcome, RunReport, RunSummary};
pub use policy::{PointerUpdateKind, RemediationPolicy};
pub use publisher::VersionPublisher;
pub use resolver::TemplateResolver;
pub use tagging::{has_marker, marker_value, with_marker_merged, INSTANCE_RESOURCE_TYPE, MARKER_KEY};
pub use telemetry::init_tracing;

pub use vma_fleet::{
    AutoScalingGroup, ImageMetadata, LaunchBinding, LaunchTemplateVersion, ResourceTags, Tag,
    TagSpecification, VersionSelector,
};
