//! VMA Fleet: fleet records and collaborator bindings for the VMA reconciler
//!
//! This crate owns every call the reconciler makes against the outside world.
//! It validates response payloads once and hands typed records upward.
//!
//! ## Key Components
//!
//! - `records`: `AutoScalingGroup`, `LaunchTemplateVersion`, `TagSpecification`, ...
//! - `directory`: the collaborator traits the reconciler depends on
//! - `AwsFleet`: AWS Auto Scaling / EC2 implementation of those traits
//! - `JsonlLegacySink`: append-only file for groups that cannot be remediated
//! - `fakes`: in-memory implementations for tests

pub mod aws;
pub mod directory;
mod error;
pub mod fakes;
pub mod legacy_log;
pub mod records;

pub use aws::AwsFleet;
pub use directory::{
    AutoScalingDirectory, FleetResult, ImageRegistry, LaunchTemplateStore, LegacyAsgSink,
};
pub use error::FleetError;
pub use legacy_log::{JsonlLegacySink, LegacyAsgRecord, DEFAULT_LEGACY_LOG};
pub use records::{
    AutoScalingGroup, ImageMetadata, LaunchBinding, LaunchTemplateVersion, ResourceTags, Tag,
    TagSpecification, UnrecognizedSelector, VersionSelector,
};
