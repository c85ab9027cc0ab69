//! AWS bindings for the collaborator traits
//!
//! `AwsFleet` keeps one Auto Scaling client and one EC2 client per configured
//! region. Listings go through the SDK paginators, so callers always see the
//! complete result set. Nothing here retries beyond what the SDK's own retry
//! configuration does.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_autoscaling::types::LaunchTemplateSpecification;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::{
    LaunchTemplateTagSpecificationRequest, RequestLaunchTemplateData, ResourceType,
};
use tracing::{debug, info, warn};

use crate::directory::*;
use crate::error::FleetError;
use crate::records::*;

/// EC2 error codes meaning the template or the requested version is absent.
const TEMPLATE_NOT_FOUND_CODES: &[&str] = &[
    "InvalidLaunchTemplateName.NotFoundException",
    "InvalidLaunchTemplateId.NotFound",
    "InvalidLaunchTemplateId.VersionNotFound",
];

/// EC2 error codes meaning the image no longer exists (deregistered or never shared).
const IMAGE_NOT_FOUND_CODES: &[&str] = &["InvalidAMIID.NotFound", "InvalidAMIID.Unavailable"];

struct RegionClients {
    autoscaling: aws_sdk_autoscaling::Client,
    ec2: aws_sdk_ec2::Client,
}

/// Fleet collaborators backed by the AWS APIs.
pub struct AwsFleet {
    clients: HashMap<String, RegionClients>,
}

impl AwsFleet {
    /// Build clients for every region in `regions` from the default
    /// credential chain.
    pub async fn connect<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut clients = HashMap::new();
        for region in regions {
            let region = region.as_ref().to_string();
            let config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.clone()))
                .load()
                .await;
            info!(region = %region, "AWS clients configured");
            clients.insert(
                region,
                RegionClients {
                    autoscaling: aws_sdk_autoscaling::Client::new(&config),
                    ec2: aws_sdk_ec2::Client::new(&config),
                },
            );
        }
        Self { clients }
    }

    /// Regions this fleet has clients for.
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        regions.sort_unstable();
        regions
    }

    fn clients(&self, region: &str) -> FleetResult<&RegionClients> {
        self.clients
            .get(region)
            .ok_or_else(|| FleetError::UnknownRegion(region.to_string()))
    }
}

fn upstream<E>(operation: &'static str, err: E) -> FleetError
where
    E: std::error::Error + 'static,
{
    FleetError::upstream(operation, DisplayErrorContext(&err).to_string())
}

fn error_code<E, R>(err: &SdkError<E, R>) -> Option<&str>
where
    E: ProvideErrorMetadata,
{
    err.as_service_error().and_then(|e| e.code())
}

fn version_number(raw: Option<i64>, template_name: &str) -> FleetResult<u64> {
    let raw = raw.ok_or_else(|| {
        FleetError::MalformedResponse(format!(
            "launch template {} version without a version number",
            template_name
        ))
    })?;
    u64::try_from(raw).map_err(|_| {
        FleetError::MalformedResponse(format!(
            "launch template {} reported version number {}",
            template_name, raw
        ))
    })
}

fn group_from_sdk(
    region: &str,
    group: &aws_sdk_autoscaling::types::AutoScalingGroup,
) -> FleetResult<AutoScalingGroup> {
    // Required in the API model; newer SDK releases drop the Option.
    let name: Option<&str> = group.auto_scaling_group_name().into();
    let name = name
        .ok_or_else(|| FleetError::MalformedResponse("auto scaling group without a name".into()))?
        .to_string();

    let template = group
        .launch_template()
        .map(|spec| (spec.launch_template_name(), spec.version()));
    let binding = launch_binding(&name, template, group.launch_configuration_name())?;

    Ok(AutoScalingGroup {
        name,
        region: region.to_string(),
        binding,
    })
}

/// `template` is the group's `(template name, version)` reference, if any.
fn launch_binding(
    asg_name: &str,
    template: Option<(Option<&str>, Option<&str>)>,
    launch_configuration: Option<&str>,
) -> FleetResult<LaunchBinding> {
    match template {
        Some((template_name, version)) => {
            let template_name = template_name.ok_or_else(|| {
                FleetError::MalformedResponse(format!(
                    "group {} references a launch template without a name",
                    asg_name
                ))
            })?;
            Ok(LaunchBinding::LaunchTemplate {
                template_name: template_name.to_string(),
                // An omitted version means the template default.
                version: version.unwrap_or(VersionSelector::DEFAULT).to_string(),
            })
        }
        None => Ok(LaunchBinding::LaunchConfiguration {
            name: launch_configuration.map(str::to_string),
        }),
    }
}

fn template_version_from_sdk(
    template_name: &str,
    version: &aws_sdk_ec2::types::LaunchTemplateVersion,
) -> FleetResult<LaunchTemplateVersion> {
    let version_number = version_number(version.version_number(), template_name)?;
    let data = version.launch_template_data();
    let image_id = data.and_then(|d| d.image_id()).ok_or_else(|| {
        FleetError::MalformedResponse(format!(
            "launch template {} version {} has no image id",
            template_name, version_number
        ))
    })?;

    let entries = data
        .map(|d| d.tag_specifications())
        .unwrap_or_default()
        .iter()
        .map(|spec| ResourceTags {
            resource_type: spec
                .resource_type()
                .map(|r| r.as_str().to_string())
                .unwrap_or_default(),
            tags: spec
                .tags()
                .iter()
                .map(|t| Tag::new(t.key().unwrap_or_default(), t.value().unwrap_or_default()))
                .collect(),
        })
        .collect();

    Ok(LaunchTemplateVersion {
        template_name: template_name.to_string(),
        version_number,
        image_id: image_id.to_string(),
        tag_specification: TagSpecification::new(entries),
    })
}

fn tag_spec_request(entry: &ResourceTags) -> LaunchTemplateTagSpecificationRequest {
    LaunchTemplateTagSpecificationRequest::builder()
        .resource_type(ResourceType::from(entry.resource_type.as_str()))
        .set_tags(Some(
            entry
                .tags
                .iter()
                .map(|t| {
                    aws_sdk_ec2::types::Tag::builder()
                        .key(&t.key)
                        .value(&t.value)
                        .build()
                })
                .collect(),
        ))
        .build()
}

#[async_trait]
impl AutoScalingDirectory for AwsFleet {
    async fn list_auto_scaling_groups(
        &self,
        region: &str,
        name: Option<&str>,
    ) -> FleetResult<Vec<AutoScalingGroup>> {
        let clients = self.clients(region)?;
        let mut request = clients.autoscaling.describe_auto_scaling_groups();
        if let Some(name) = name {
            request = request.auto_scaling_group_names(name);
        }
        let groups = request
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| upstream("DescribeAutoScalingGroups", e))?;

        debug!(region = %region, count = groups.len(), "auto scaling groups listed");
        groups.iter().map(|g| group_from_sdk(region, g)).collect()
    }

    async fn set_group_template_version(
        &self,
        region: &str,
        asg_name: &str,
        template_name: &str,
        version: u64,
    ) -> FleetResult<()> {
        let clients = self.clients(region)?;
        let spec = LaunchTemplateSpecification::builder()
            .launch_template_name(template_name)
            .version(version.to_string())
            .build();
        clients
            .autoscaling
            .update_auto_scaling_group()
            .auto_scaling_group_name(asg_name)
            .launch_template(spec)
            .send()
            .await
            .map_err(|e| upstream("UpdateAutoScalingGroup", e))?;
        Ok(())
    }
}

#[async_trait]
impl LaunchTemplateStore for AwsFleet {
    async fn get_version(
        &self,
        region: &str,
        template_name: &str,
        selector: &VersionSelector,
    ) -> FleetResult<LaunchTemplateVersion> {
        let clients = self.clients(region)?;
        let not_found = || {
            FleetError::not_found(
                "launch template version",
                format!("{}:{}", template_name, selector),
            )
        };

        let resp = clients
            .ec2
            .describe_launch_template_versions()
            .launch_template_name(template_name)
            .versions(selector.to_string())
            .send()
            .await
            .map_err(|e| match error_code(&e) {
                Some(code) if TEMPLATE_NOT_FOUND_CODES.contains(&code) => not_found(),
                _ => upstream("DescribeLaunchTemplateVersions", e),
            })?;

        let version = resp
            .launch_template_versions()
            .first()
            .ok_or_else(not_found)?;
        template_version_from_sdk(template_name, version)
    }

    async fn create_version(
        &self,
        region: &str,
        template_name: &str,
        source_version: u64,
        tags: &TagSpecification,
    ) -> FleetResult<u64> {
        let clients = self.clients(region)?;
        let data = RequestLaunchTemplateData::builder()
            .set_tag_specifications(Some(tags.entries().iter().map(tag_spec_request).collect()))
            .build();

        let resp = clients
            .ec2
            .create_launch_template_version()
            .launch_template_name(template_name)
            .source_version(source_version.to_string())
            .launch_template_data(data)
            .send()
            .await
            .map_err(|e| upstream("CreateLaunchTemplateVersion", e))?;

        if let Some(warning) = resp.warning() {
            warn!(template = %template_name, ?warning, "template version created with warnings");
        }
        version_number(
            resp.launch_template_version()
                .and_then(|v| v.version_number()),
            template_name,
        )
    }

    async fn set_default_version(
        &self,
        region: &str,
        template_name: &str,
        version: u64,
    ) -> FleetResult<()> {
        let clients = self.clients(region)?;
        clients
            .ec2
            .modify_launch_template()
            .launch_template_name(template_name)
            .default_version(version.to_string())
            .send()
            .await
            .map_err(|e| upstream("ModifyLaunchTemplate", e))?;
        Ok(())
    }
}

#[async_trait]
impl ImageRegistry for AwsFleet {
    async fn describe_image(
        &self,
        region: &str,
        image_id: &str,
    ) -> FleetResult<Option<ImageMetadata>> {
        let clients = self.clients(region)?;
        match clients.ec2.describe_images().image_ids(image_id).send().await {
            Ok(resp) => Ok(resp.images().first().map(|image| ImageMetadata {
                image_id: image_id.to_string(),
                location: image
                    .image_location()
                    .unwrap_or(ImageMetadata::UNKNOWN)
                    .to_string(),
                name: image.name().unwrap_or(ImageMetadata::UNKNOWN).to_string(),
                owner_id: image
                    .owner_id()
                    .unwrap_or(ImageMetadata::UNKNOWN)
                    .to_string(),
            })),
            Err(e) if matches!(error_code(&e), Some(code) if IMAGE_NOT_FOUND_CODES.contains(&code)) => {
                debug!(region = %region, image = %image_id, "image not found");
                Ok(None)
            }
            Err(e) => Err(upstream("DescribeImages", e)),
        }
    }
}
