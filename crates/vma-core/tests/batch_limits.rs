//! Processing-cap behaviour across regions.

use std::sync::Arc;

use vma_core::{Collaborators, ReconcileConfig, Reconciler, RemediationOutcome};
use vma_fleet::fakes::{FleetCall, FleetOperation, MemoryFleet, MemoryLegacySink};
use vma_fleet::{AutoScalingGroup, LaunchTemplateVersion, TagSpecification};

const WEST: &str = "us-west-2";
const EAST: &str = "us-east-1";

/// Five eligible template groups per region, each with its own template.
fn fleet_of_ten() -> Arc<MemoryFleet> {
    let fleet = Arc::new(MemoryFleet::new());
    for region in [WEST, EAST] {
        for i in 0..5 {
            let template = format!("lt-{}", i);
            fleet.add_group(AutoScalingGroup::with_template(
                format!("asg-{}-{}", region, i),
                region,
                template.clone(),
                "1",
            ));
            fleet.add_template_version(
                region,
                LaunchTemplateVersion {
                    template_name: template,
                    version_number: 1,
                    image_id: format!("ami-{}", i),
                    tag_specification: TagSpecification::default(),
                },
            );
        }
    }
    fleet
}

fn reconciler(fleet: &Arc<MemoryFleet>, limit: Option<usize>) -> Reconciler {
    let config = ReconcileConfig::default()
        .with_regions([WEST, EAST])
        .with_dry_run(false)
        .with_limit(limit);
    Reconciler::new(
        config,
        Collaborators::from_fleet(fleet.clone(), Arc::new(MemoryLegacySink::new())),
    )
}

fn listed_regions(fleet: &MemoryFleet) -> Vec<String> {
    fleet
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            FleetCall::ListGroups { region, .. } => Some(region),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn limit_three_of_ten_yields_three_outcomes() {
    let fleet = fleet_of_ten();

    let report = reconciler(&fleet, Some(3)).run().await.unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.stopped_at_limit);
    assert!(report.outcomes.iter().all(|o| o.region == WEST));
    assert_eq!(fleet.count(FleetOperation::CreateVersion), 3);
    assert_eq!(listed_regions(&fleet), vec![WEST.to_string()]);
}

#[tokio::test]
async fn limit_spans_region_boundary() {
    let fleet = fleet_of_ten();

    let report = reconciler(&fleet, Some(7)).run().await.unwrap();

    assert_eq!(report.outcomes.len(), 7);
    let east = report.outcomes.iter().filter(|o| o.region == EAST).count();
    assert_eq!(east, 2);
    assert_eq!(listed_regions(&fleet), vec![WEST.to_string(), EAST.to_string()]);
}

#[tokio::test]
async fn skipped_and_deferred_groups_count_toward_limit() {
    let fleet = Arc::new(MemoryFleet::new());
    fleet.add_group(AutoScalingGroup::with_launch_configuration("legacy-1", WEST, None));
    fleet.add_group(AutoScalingGroup::with_template("tagged", WEST, "tagged-lt", "1"));
    fleet.add_group(AutoScalingGroup::with_template("fresh", WEST, "fresh-lt", "1"));
    fleet.add_template_version(
        WEST,
        LaunchTemplateVersion {
            template_name: "tagged-lt".to_string(),
            version_number: 1,
            image_id: "ami-t".to_string(),
            tag_specification: vma_core::with_marker_merged(&TagSpecification::default(), "true"),
        },
    );
    fleet.add_template_version(
        WEST,
        LaunchTemplateVersion {
            template_name: "fresh-lt".to_string(),
            version_number: 1,
            image_id: "ami-f".to_string(),
            tag_specification: TagSpecification::default(),
        },
    );

    let report = reconciler(&fleet, Some(2)).run().await.unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert!(matches!(
        report.outcomes[0].outcome,
        RemediationOutcome::Deferred { .. }
    ));
    assert!(matches!(
        report.outcomes[1].outcome,
        RemediationOutcome::Skipped { .. }
    ));
    assert!(fleet.writes().is_empty());
}

#[tokio::test]
async fn no_limit_processes_everything() {
    let fleet = fleet_of_ten();

    let report = reconciler(&fleet, None).run().await.unwrap();

    assert_eq!(report.outcomes.len(), 10);
    assert!(!report.stopped_at_limit);
    assert_eq!(report.summary().applied, 10);
}

#[tokio::test]
async fn limit_above_fleet_size_is_not_a_stop() {
    let fleet = fleet_of_ten();

    let report = reconciler(&fleet, Some(50)).run().await.unwrap();

    assert_eq!(report.outcomes.len(), 10);
    assert!(!report.stopped_at_limit);
}
