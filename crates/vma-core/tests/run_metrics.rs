//! Run counters describe the latest run only.
//!
//! Kept in its own test binary: `METRICS` is process-wide.

use std::sync::Arc;

use vma_core::metrics::METRICS;
use vma_core::{Collaborators, ReconcileConfig, Reconciler};
use vma_fleet::fakes::{MemoryFleet, MemoryLegacySink};
use vma_fleet::{AutoScalingGroup, LaunchTemplateVersion, TagSpecification};

#[tokio::test]
async fn second_run_counts_only_its_own_groups() {
    let fleet = Arc::new(MemoryFleet::new());
    fleet.add_group(AutoScalingGroup::with_template("web-asg", "us-west-2", "web-lt", "$Latest"));
    fleet.add_group(AutoScalingGroup::with_template("odd-asg", "us-west-2", "web-lt", "$Newest"));
    fleet.add_template_version(
        "us-west-2",
        LaunchTemplateVersion {
            template_name: "web-lt".to_string(),
            version_number: 1,
            image_id: "ami-1".to_string(),
            tag_specification: TagSpecification::default(),
        },
    );
    let reconciler = Reconciler::new(
        ReconcileConfig::default()
            .with_regions(["us-west-2"])
            .with_dry_run(false),
        Collaborators::from_fleet(fleet, Arc::new(MemoryLegacySink::new())),
    );

    reconciler.run().await.unwrap();
    assert_eq!(METRICS.groups_processed(), 2);
    assert_eq!(METRICS.versions_published(), 1);
    assert_eq!(METRICS.pointer_updates(), 0);
    assert_eq!(METRICS.failures(), 1);

    // web-asg is tagged now and skips; odd-asg fails again.
    reconciler.run().await.unwrap();
    assert_eq!(METRICS.groups_processed(), 2);
    assert_eq!(METRICS.versions_published(), 0);
    assert_eq!(METRICS.failures(), 1);
}
