//! In-memory fakes for the collaborator traits (testing only)
//!
//! `MemoryFleet` implements `AutoScalingDirectory`, `LaunchTemplateStore` and
//! `ImageRegistry` over one shared state so that version creation, default
//! pointer moves and group updates are visible to later reads. Every call is
//! recorded for assertions, and any operation can be made to fail.
//! `MemoryLegacySink` collects escape-hatch records.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::directory::*;
use crate::error::FleetError;
use crate::records::*;

// ---------------------------------------------------------------------------
// Call log
// ---------------------------------------------------------------------------

/// Collaborator operation, used for call assertions and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FleetOperation {
    ListGroups,
    SetGroupTemplateVersion,
    GetVersion,
    CreateVersion,
    SetDefaultVersion,
    DescribeImage,
}

impl FleetOperation {
    /// Operations that mutate the fleet.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            FleetOperation::SetGroupTemplateVersion
                | FleetOperation::CreateVersion
                | FleetOperation::SetDefaultVersion
        )
    }

    fn api_name(&self) -> &'static str {
        match self {
            FleetOperation::ListGroups => "DescribeAutoScalingGroups",
            FleetOperation::SetGroupTemplateVersion => "UpdateAutoScalingGroup",
            FleetOperation::GetVersion => "DescribeLaunchTemplateVersions",
            FleetOperation::CreateVersion => "CreateLaunchTemplateVersion",
            FleetOperation::SetDefaultVersion => "ModifyLaunchTemplate",
            FleetOperation::DescribeImage => "DescribeImages",
        }
    }
}

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetCall {
    ListGroups {
        region: String,
        name: Option<String>,
    },
    SetGroupTemplateVersion {
        region: String,
        asg_name: String,
        template_name: String,
        version: u64,
    },
    GetVersion {
        region: String,
        template_name: String,
        selector: VersionSelector,
    },
    CreateVersion {
        region: String,
        template_name: String,
        source_version: u64,
        tags: TagSpecification,
    },
    SetDefaultVersion {
        region: String,
        template_name: String,
        version: u64,
    },
    DescribeImage {
        region: String,
        image_id: String,
    },
}

impl FleetCall {
    pub fn operation(&self) -> FleetOperation {
        match self {
            FleetCall::ListGroups { .. } => FleetOperation::ListGroups,
            FleetCall::SetGroupTemplateVersion { .. } => FleetOperation::SetGroupTemplateVersion,
            FleetCall::GetVersion { .. } => FleetOperation::GetVersion,
            FleetCall::CreateVersion { .. } => FleetOperation::CreateVersion,
            FleetCall::SetDefaultVersion { .. } => FleetOperation::SetDefaultVersion,
            FleetCall::DescribeImage { .. } => FleetOperation::DescribeImage,
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryFleet
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct TemplateState {
    versions: BTreeMap<u64, LaunchTemplateVersion>,
    default_version: u64,
}

impl TemplateState {
    fn latest_version(&self) -> u64 {
        self.versions.keys().next_back().copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct FleetState {
    groups: Vec<AutoScalingGroup>,
    templates: HashMap<(String, String), TemplateState>,
    images: HashMap<(String, String), ImageMetadata>,
    calls: Vec<FleetCall>,
    /// `(operation, target)` → message. A `None` target fails every call.
    failures: HashMap<(FleetOperation, Option<String>), String>,
}

impl FleetState {
    fn check_failure(&self, op: FleetOperation, target: &str) -> FleetResult<()> {
        let message = self
            .failures
            .get(&(op, Some(target.to_string())))
            .or_else(|| self.failures.get(&(op, None)));
        match message {
            Some(message) => Err(FleetError::upstream(op.api_name(), message.clone())),
            None => Ok(()),
        }
    }

    fn template(&self, region: &str, template_name: &str) -> FleetResult<&TemplateState> {
        self.templates
            .get(&(region.to_string(), template_name.to_string()))
            .ok_or_else(|| FleetError::not_found("launch template", template_name))
    }

    fn template_mut(
        &mut self,
        region: &str,
        template_name: &str,
    ) -> FleetResult<&mut TemplateState> {
        self.templates
            .get_mut(&(region.to_string(), template_name.to_string()))
            .ok_or_else(|| FleetError::not_found("launch template", template_name))
    }
}

/// In-memory fleet: groups, launch templates and images for any number of regions.
#[derive(Debug, Default)]
pub struct MemoryFleet {
    state: Mutex<FleetState>,
}

impl MemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group. Listing order is insertion order.
    pub fn add_group(&self, group: AutoScalingGroup) {
        self.state.lock().unwrap().groups.push(group);
    }

    /// Add a template version. The first version added to a template becomes
    /// its default.
    pub fn add_template_version(&self, region: &str, version: LaunchTemplateVersion) {
        let mut state = self.state.lock().unwrap();
        let key = (region.to_string(), version.template_name.clone());
        let template = state.templates.entry(key).or_insert_with(|| TemplateState {
            versions: BTreeMap::new(),
            default_version: version.version_number,
        });
        template.versions.insert(version.version_number, version);
    }

    pub fn add_image(&self, region: &str, image: ImageMetadata) {
        let mut state = self.state.lock().unwrap();
        state
            .images
            .insert((region.to_string(), image.image_id.clone()), image);
    }

    /// Make every call of `op` fail with an upstream error.
    pub fn fail_on(&self, op: FleetOperation, message: &str) {
        let mut state = self.state.lock().unwrap();
        state.failures.insert((op, None), message.to_string());
    }

    /// Make calls of `op` against `target` fail. The target is the region for
    /// listings, the group name for group updates, the image id for image
    /// lookups and the template name otherwise.
    pub fn fail_on_target(&self, op: FleetOperation, target: &str, message: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .failures
            .insert((op, Some(target.to_string())), message.to_string());
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<FleetCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Every mutating call so far, in order.
    pub fn writes(&self) -> Vec<FleetCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation().is_write())
            .collect()
    }

    pub fn count(&self, op: FleetOperation) -> usize {
        self.calls().iter().filter(|c| c.operation() == op).count()
    }

    pub fn group(&self, region: &str, name: &str) -> Option<AutoScalingGroup> {
        let state = self.state.lock().unwrap();
        state
            .groups
            .iter()
            .find(|g| g.region == region && g.name == name)
            .cloned()
    }

    pub fn template_version(
        &self,
        region: &str,
        template_name: &str,
        version: u64,
    ) -> Option<LaunchTemplateVersion> {
        let state = self.state.lock().unwrap();
        state
            .template(region, template_name)
            .ok()
            .and_then(|t| t.versions.get(&version).cloned())
    }

    pub fn default_version(&self, region: &str, template_name: &str) -> Option<u64> {
        let state = self.state.lock().unwrap();
        state
            .template(region, template_name)
            .ok()
            .map(|t| t.default_version)
    }

    pub fn latest_version(&self, region: &str, template_name: &str) -> Option<u64> {
        let state = self.state.lock().unwrap();
        state
            .template(region, template_name)
            .ok()
            .map(|t| t.latest_version())
    }
}

#[async_trait]
impl AutoScalingDirectory for MemoryFleet {
    async fn list_auto_scaling_groups(
        &self,
        region: &str,
        name: Option<&str>,
    ) -> FleetResult<Vec<AutoScalingGroup>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FleetCall::ListGroups {
            region: region.to_string(),
            name: name.map(str::to_string),
        });
        state.check_failure(FleetOperation::ListGroups, region)?;
        Ok(state
            .groups
            .iter()
            .filter(|g| g.region == region)
            .filter(|g| name.map_or(true, |n| g.name == n))
            .cloned()
            .collect())
    }

    async fn set_group_template_version(
        &self,
        region: &str,
        asg_name: &str,
        template_name: &str,
        version: u64,
    ) -> FleetResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FleetCall::SetGroupTemplateVersion {
            region: region.to_string(),
            asg_name: asg_name.to_string(),
            template_name: template_name.to_string(),
            version,
        });
        state.check_failure(FleetOperation::SetGroupTemplateVersion, asg_name)?;
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.region == region && g.name == asg_name)
            .ok_or_else(|| FleetError::not_found("auto scaling group", asg_name))?;
        group.binding = LaunchBinding::LaunchTemplate {
            template_name: template_name.to_string(),
            version: version.to_string(),
        };
        Ok(())
    }
}

#[async_trait]
impl LaunchTemplateStore for MemoryFleet {
    async fn get_version(
        &self,
        region: &str,
        template_name: &str,
        selector: &VersionSelector,
    ) -> FleetResult<LaunchTemplateVersion> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FleetCall::GetVersion {
            region: region.to_string(),
            template_name: template_name.to_string(),
            selector: *selector,
        });
        state.check_failure(FleetOperation::GetVersion, template_name)?;
        let template = state.template(region, template_name)?;
        let number = match selector {
            VersionSelector::Default => template.default_version,
            VersionSelector::Latest => template.latest_version(),
            VersionSelector::Explicit(n) => *n,
        };
        template.versions.get(&number).cloned().ok_or_else(|| {
            FleetError::not_found(
                "launch template version",
                format!("{}:{}", template_name, selector),
            )
        })
    }

    async fn create_version(
        &self,
        region: &str,
        template_name: &str,
        source_version: u64,
        tags: &TagSpecification,
    ) -> FleetResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FleetCall::CreateVersion {
            region: region.to_string(),
            template_name: template_name.to_string(),
            source_version,
            tags: tags.clone(),
        });
        state.check_failure(FleetOperation::CreateVersion, template_name)?;
        let template = state.template_mut(region, template_name)?;
        let source = template.versions.get(&source_version).ok_or_else(|| {
            FleetError::not_found(
                "launch template version",
                format!("{}:{}", template_name, source_version),
            )
        })?;
        let number = template.latest_version() + 1;
        let created = LaunchTemplateVersion {
            version_number: number,
            tag_specification: tags.clone(),
            ..source.clone()
        };
        template.versions.insert(number, created);
        Ok(number)
    }

    async fn set_default_version(
        &self,
        region: &str,
        template_name: &str,
        version: u64,
    ) -> FleetResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FleetCall::SetDefaultVersion {
            region: region.to_string(),
            template_name: template_name.to_string(),
            version,
        });
        state.check_failure(FleetOperation::SetDefaultVersion, template_name)?;
        let template = state.template_mut(region, template_name)?;
        if !template.versions.contains_key(&version) {
            return Err(FleetError::not_found(
                "launch template version",
                format!("{}:{}", template_name, version),
            ));
        }
        template.default_version = version;
        Ok(())
    }
}

#[async_trait]
impl ImageRegistry for MemoryFleet {
    async fn describe_image(
        &self,
        region: &str,
        image_id: &str,
    ) -> FleetResult<Option<ImageMetadata>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FleetCall::DescribeImage {
            region: region.to_string(),
            image_id: image_id.to_string(),
        });
        state.check_failure(FleetOperation::DescribeImage, image_id)?;
        Ok(state
            .images
            .get(&(region.to_string(), image_id.to_string()))
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryLegacySink
// ---------------------------------------------------------------------------

/// In-memory escape-hatch sink backed by a `Vec<(region, asg_name)>`.
#[derive(Debug, Default)]
pub struct MemoryLegacySink {
    records: Mutex<Vec<(String, String)>>,
    failure: Mutex<Option<String>>,
}

impl MemoryLegacySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// `(region, asg_name)` pairs recorded so far, in order.
    pub fn records(&self) -> Vec<(String, String)> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl LegacyAsgSink for MemoryLegacySink {
    async fn record_legacy_asg(&self, region: &str, asg_name: &str) -> FleetResult<()> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(FleetError::upstream("RecordLegacyAsg", message));
        }
        self.records
            .lock()
            .unwrap()
            .push((region.to_string(), asg_name.to_string()));
        Ok(())
    }
}
