//! Collaborator traits for the VMA reconciler
//!
//! These traits are the only way the reconciler touches the fleet:
//! - `AutoScalingDirectory`: list groups, repoint a group at a template version
//! - `LaunchTemplateStore`: read a version, create a version, move the default
//! - `ImageRegistry`: resolve an image id to its metadata
//! - `LegacyAsgSink`: escape hatch for groups that cannot be remediated
//!
//! All traits are async and backend-agnostic. Implementations return complete
//! (already paginated) result sets and do not retry. In-memory fakes are
//! provided for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::FleetError;
use crate::records::{
    AutoScalingGroup, ImageMetadata, LaunchTemplateVersion, TagSpecification, VersionSelector,
};

/// Result type for collaborator calls
pub type FleetResult<T> = std::result::Result<T, FleetError>;

/// Auto-scaling group directory.
#[async_trait]
pub trait AutoScalingDirectory: Send + Sync {
    /// List every group in `region`, or only the group called `name`.
    ///
    /// A filtered listing for an absent group returns an empty list.
    async fn list_auto_scaling_groups(
        &self,
        region: &str,
        name: Option<&str>,
    ) -> FleetResult<Vec<AutoScalingGroup>>;

    /// Pin `asg_name` to an explicit version of `template_name`.
    async fn set_group_template_version(
        &self,
        region: &str,
        asg_name: &str,
        template_name: &str,
        version: u64,
    ) -> FleetResult<()>;
}

/// Launch template version store.
///
/// Versions are immutable: the store only ever reads them or creates new ones.
#[async_trait]
pub trait LaunchTemplateStore: Send + Sync {
    /// Fetch the single version `selector` resolves to.
    /// Returns `FleetError::NotFound` if the template or version is absent.
    async fn get_version(
        &self,
        region: &str,
        template_name: &str,
        selector: &VersionSelector,
    ) -> FleetResult<LaunchTemplateVersion>;

    /// Create a new version identical to `source_version` except that its tag
    /// specification is replaced wholesale by `tags`. Returns the version
    /// number the store assigned.
    async fn create_version(
        &self,
        region: &str,
        template_name: &str,
        source_version: u64,
        tags: &TagSpecification,
    ) -> FleetResult<u64>;

    /// Move the template's default pointer to `version`.
    async fn set_default_version(
        &self,
        region: &str,
        template_name: &str,
        version: u64,
    ) -> FleetResult<()>;
}

/// Image registry.
#[async_trait]
pub trait ImageRegistry: Send + Sync {
    /// Describe `image_id`. Returns `Ok(None)` if the registry has no such image.
    async fn describe_image(&self, region: &str, image_id: &str)
        -> FleetResult<Option<ImageMetadata>>;
}

/// Escape-hatch sink for groups the reconciler cannot process.
///
/// At-least-once append semantics: a group may be recorded more than once
/// across runs.
#[async_trait]
pub trait LegacyAsgSink: Send + Sync {
    async fn record_legacy_asg(&self, region: &str, asg_name: &str) -> FleetResult<()>;
}
