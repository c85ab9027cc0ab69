//! ASG remediation policy: which pointer moves to a freshly published version.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use vma_fleet::{AutoScalingDirectory, LaunchTemplateStore, VersionSelector};

use crate::error::{ReconcileError, ReconcileResult};

/// The pointer update a selector calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerUpdateKind {
    /// The group pins an exact number; repoint the group.
    AsgVersion,
    /// The group follows `$Default`; move the template's default.
    TemplateDefault,
    /// The group follows `$Latest`; the new version is already latest.
    NoneRequired,
}

impl PointerUpdateKind {
    pub fn for_selector(selector: &VersionSelector) -> Self {
        match selector {
            VersionSelector::Explicit(_) => PointerUpdateKind::AsgVersion,
            VersionSelector::Default => PointerUpdateKind::TemplateDefault,
            VersionSelector::Latest => PointerUpdateKind::NoneRequired,
        }
    }
}

/// Applies the pointer update for a group after a version was published.
#[derive(Clone)]
pub struct RemediationPolicy {
    groups: Arc<dyn AutoScalingDirectory>,
    templates: Arc<dyn LaunchTemplateStore>,
}

impl RemediationPolicy {
    pub fn new(
        groups: Arc<dyn AutoScalingDirectory>,
        templates: Arc<dyn LaunchTemplateStore>,
    ) -> Self {
        Self { groups, templates }
    }

    /// Repoint according to `selector` and report which update happened.
    ///
    /// Exactly one directory call for `Explicit` and `Default`, none for
    /// `Latest`. An explicit selector that happens to equal the template
    /// default still repoints the group, never the default.
    pub async fn apply(
        &self,
        region: &str,
        asg_name: &str,
        template_name: &str,
        selector: &VersionSelector,
        new_version: u64,
    ) -> ReconcileResult<PointerUpdateKind> {
        let kind = PointerUpdateKind::for_selector(selector);
        let result = match kind {
            PointerUpdateKind::AsgVersion => {
                self.groups
                    .set_group_template_version(region, asg_name, template_name, new_version)
                    .await
            }
            PointerUpdateKind::TemplateDefault => {
                self.templates
                    .set_default_version(region, template_name, new_version)
                    .await
            }
            PointerUpdateKind::NoneRequired => Ok(()),
        };

        result.map_err(|e| ReconcileError::PointerUpdate {
            new_version,
            reason: e.to_string(),
        })?;

        info!(
            region = %region,
            asg = %asg_name,
            template = %template_name,
            new_version,
            pointer_update = ?kind,
            "pointer updated"
        );
        Ok(kind)
    }
}
