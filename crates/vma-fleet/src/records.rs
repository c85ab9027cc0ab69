//! Typed fleet records
//!
//! Response payloads are validated once, at the collaborator boundary, and
//! handed to the reconciler as these records:
//! - `AutoScalingGroup` / `LaunchBinding`: how a group launches instances
//! - `VersionSelector`: which template version a group is pinned to
//! - `LaunchTemplateVersion` / `TagSpecification`: one immutable template version
//! - `ImageMetadata`: what the image registry knows about an AMI

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Auto-scaling groups
// ---------------------------------------------------------------------------

/// Snapshot of one auto-scaling group, fetched at the start of its processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoScalingGroup {
    pub name: String,
    pub region: String,
    pub binding: LaunchBinding,
}

impl AutoScalingGroup {
    /// Group launched from a launch template, pinned by the raw selector `version`.
    pub fn with_template(
        name: impl Into<String>,
        region: impl Into<String>,
        template_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            binding: LaunchBinding::LaunchTemplate {
                template_name: template_name.into(),
                version: version.into(),
            },
        }
    }

    /// Group launched from a legacy launch configuration.
    pub fn with_launch_configuration(
        name: impl Into<String>,
        region: impl Into<String>,
        launch_configuration: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            binding: LaunchBinding::LaunchConfiguration {
                name: launch_configuration,
            },
        }
    }
}

/// How a group launches its instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaunchBinding {
    /// Legacy launch configuration, or no direct launch template at all.
    /// Launch configurations are immutable and cannot be remediated.
    LaunchConfiguration { name: Option<String> },
    /// Launch template reference. `version` is the selector exactly as the
    /// directory reported it; parse it with [`VersionSelector::from_str`].
    LaunchTemplate {
        template_name: String,
        version: String,
    },
}

/// Which template version a group (or a lookup) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSelector {
    /// `$Default`: whatever the template's default pointer says.
    Default,
    /// `$Latest`: the most recently created version.
    Latest,
    /// A fixed version number.
    Explicit(u64),
}

impl VersionSelector {
    pub const DEFAULT: &'static str = "$Default";
    pub const LATEST: &'static str = "$Latest";
}

/// A selector string outside `$Default`, `$Latest` and unsigned integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized version selector: {0:?}")]
pub struct UnrecognizedSelector(pub String);

impl FromStr for VersionSelector {
    type Err = UnrecognizedSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            VersionSelector::DEFAULT => Ok(VersionSelector::Default),
            VersionSelector::LATEST => Ok(VersionSelector::Latest),
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => digits
                .parse()
                .map(VersionSelector::Explicit)
                .map_err(|_| UnrecognizedSelector(s.to_string())),
            _ => Err(UnrecognizedSelector(s.to_string())),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Default => f.write_str(Self::DEFAULT),
            VersionSelector::Latest => f.write_str(Self::LATEST),
            VersionSelector::Explicit(n) => write!(f, "{}", n),
        }
    }
}

// ---------------------------------------------------------------------------
// Launch templates and tags
// ---------------------------------------------------------------------------

/// One `{key, value}` tag pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Tags applied to one resource type (e.g. `"instance"`, `"volume"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTags {
    pub resource_type: String,
    pub tags: Vec<Tag>,
}

impl ResourceTags {
    pub fn new(resource_type: impl Into<String>, tags: Vec<Tag>) -> Self {
        ResourceTags {
            resource_type: resource_type.into(),
            tags,
        }
    }
}

/// Ordered list of per-resource-type tag groups carried by a template version.
///
/// Well-formed input holds at most one entry per resource type; the list is
/// kept as-is so that malformed input round-trips untouched through reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSpecification(pub Vec<ResourceTags>);

impl TagSpecification {
    pub fn new(entries: Vec<ResourceTags>) -> Self {
        TagSpecification(entries)
    }

    pub fn entries(&self) -> &[ResourceTags] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First entry for `resource_type`, if any.
    pub fn entry(&self, resource_type: &str) -> Option<&ResourceTags> {
        self.0.iter().find(|e| e.resource_type == resource_type)
    }
}

impl From<Vec<ResourceTags>> for TagSpecification {
    fn from(entries: Vec<ResourceTags>) -> Self {
        TagSpecification(entries)
    }
}

/// One immutable launch template version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchTemplateVersion {
    pub template_name: String,
    /// Assigned by the template store on creation; never chosen locally.
    pub version_number: u64,
    pub image_id: String,
    pub tag_specification: TagSpecification,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Image registry view of an AMI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub image_id: String,
    pub location: String,
    pub name: String,
    pub owner_id: String,
}

impl ImageMetadata {
    /// Placeholder value for every field the registry could not supply.
    pub const UNKNOWN: &'static str = "none";

    /// Metadata for an image the registry no longer knows about.
    pub fn unresolved(image_id: impl Into<String>) -> Self {
        ImageMetadata {
            image_id: image_id.into(),
            location: Self::UNKNOWN.to_string(),
            name: Self::UNKNOWN.to_string(),
            owner_id: Self::UNKNOWN.to_string(),
        }
    }
}
