//! Launch-template resolution: group template reference → concrete version.

use std::sync::Arc;

use tracing::debug;
use vma_fleet::{LaunchTemplateStore, LaunchTemplateVersion, VersionSelector};

use crate::error::ReconcileResult;

/// Fetches the template version a group is pinned to.
///
/// One lookup per call, no retries: `NotFound` when the store has no match,
/// `Upstream` for anything else.
#[derive(Clone)]
pub struct TemplateResolver {
    store: Arc<dyn LaunchTemplateStore>,
}

impl TemplateResolver {
    pub fn new(store: Arc<dyn LaunchTemplateStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        region: &str,
        template_name: &str,
        selector: &VersionSelector,
    ) -> ReconcileResult<LaunchTemplateVersion> {
        let version = self
            .store
            .get_version(region, template_name, selector)
            .await?;
        debug!(
            region = %region,
            template = %template_name,
            selector = %selector,
            version = version.version_number,
            image = %version.image_id,
            "template version resolved"
        );
        Ok(version)
    }
}
