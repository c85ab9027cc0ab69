//! Template version publishing.

use std::sync::Arc;

use tracing::info;
use vma_fleet::{LaunchTemplateStore, TagSpecification};

use crate::error::ReconcileResult;

/// Creates new template versions; never edits an existing one.
#[derive(Clone)]
pub struct VersionPublisher {
    store: Arc<dyn LaunchTemplateStore>,
}

impl VersionPublisher {
    pub fn new(store: Arc<dyn LaunchTemplateStore>) -> Self {
        Self { store }
    }

    /// Create a version equal to `source_version` with its tag specification
    /// replaced by `merged`, returning the number the store assigned.
    pub async fn publish(
        &self,
        region: &str,
        template_name: &str,
        source_version: u64,
        merged: &TagSpecification,
    ) -> ReconcileResult<u64> {
        let new_version = self
            .store
            .create_version(region, template_name, source_version, merged)
            .await?;
        info!(
            region = %region,
            template = %template_name,
            source_version,
            new_version,
            "template version published"
        );
        Ok(new_version)
    }
}
