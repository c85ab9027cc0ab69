//! Batch orchestrator: regions × groups, one group at a time.
//!
//! Per group: resolve the pinned template version, stop early if it already
//! carries the marker, otherwise classify the image, merge the marker into the
//! tag specification, publish a new version and move the pointer the group's
//! selector calls for. Launch-configuration groups go to the legacy sink.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;
use vma_fleet::{
    AutoScalingDirectory, AutoScalingGroup, ImageMetadata, ImageRegistry, LaunchBinding,
    LaunchTemplateStore, LegacyAsgSink, VersionSelector,
};

use crate::classifier::{PlaceholderClassifier, ProvenanceClassifier};
use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::metrics::METRICS;
use crate::obs::{
    emit_group_outcome, emit_limit_reached, emit_run_finished, emit_run_started, RunSpan,
};
use crate::outcome::{AsgOutcome, RemediationOutcome, RunReport};
use crate::policy::{PointerUpdateKind, RemediationPolicy};
use crate::publisher::VersionPublisher;
use crate::resolver::TemplateResolver;
use crate::tagging::{has_marker, with_marker_merged};

/// The external systems a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub groups: Arc<dyn AutoScalingDirectory>,
    pub templates: Arc<dyn LaunchTemplateStore>,
    pub images: Arc<dyn ImageRegistry>,
    pub legacy: Arc<dyn LegacyAsgSink>,
}

impl Collaborators {
    /// Use one value for all three fleet roles.
    pub fn from_fleet<F>(fleet: Arc<F>, legacy: Arc<dyn LegacyAsgSink>) -> Self
    where
        F: AutoScalingDirectory + LaunchTemplateStore + ImageRegistry + 'static,
    {
        Self {
            groups: fleet.clone(),
            templates: fleet.clone(),
            images: fleet,
            legacy,
        }
    }
}

pub struct Reconciler {
    config: ReconcileConfig,
    groups: Arc<dyn AutoScalingDirectory>,
    images: Arc<dyn ImageRegistry>,
    legacy: Arc<dyn LegacyAsgSink>,
    resolver: TemplateResolver,
    publisher: VersionPublisher,
    policy: RemediationPolicy,
    classifier: Arc<dyn ProvenanceClassifier>,
}

impl Reconciler {
    /// Reconciler using [`PlaceholderClassifier`].
    pub fn new(config: ReconcileConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            groups,
            templates,
            images,
            legacy,
        } = collaborators;
        Self {
            config,
            resolver: TemplateResolver::new(templates.clone()),
            publisher: VersionPublisher::new(templates.clone()),
            policy: RemediationPolicy::new(groups.clone(), templates),
            groups,
            images,
            legacy,
            classifier: Arc::new(PlaceholderClassifier),
        }
    }

    pub fn with_classifier<C>(mut self, classifier: C) -> Self
    where
        C: ProvenanceClassifier + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Run one reconciliation pass.
    ///
    /// Group-level failures become `Failed` outcomes and the batch goes on.
    /// A failed listing, or a single-group filter that matches nothing, aborts
    /// the run. Reaching the limit ends the run normally with
    /// `stopped_at_limit` set.
    pub async fn run(&self) -> ReconcileResult<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        RunSpan::new(&run_id).instrument(self.run_batch(run_id.clone())).await
    }

    async fn run_batch(&self, run_id: String) -> ReconcileResult<RunReport> {
        METRICS.reset();
        let started_at = Utc::now();
        let regions = self.config.target_regions();
        emit_run_started(&run_id, &regions, self.config.dry_run, self.config.limit);

        let mut outcomes: Vec<AsgOutcome> = Vec::new();
        let mut stopped_at_limit = self.limit_reached(0);

        'regions: for region in &regions {
            if stopped_at_limit {
                break;
            }
            let groups = self.list_groups(region).await?;
            for group in groups {
                let outcome = self.process_group(&group).await;
                METRICS.inc_groups_processed();
                if outcome.is_failure() {
                    METRICS.inc_failures();
                }
                let entry = AsgOutcome {
                    region: group.region,
                    asg_name: group.name,
                    outcome,
                };
                emit_group_outcome(&run_id, &entry);
                outcomes.push(entry);

                if self.limit_reached(outcomes.len()) {
                    stopped_at_limit = true;
                    break 'regions;
                }
            }
        }

        if stopped_at_limit {
            if let Some(limit) = self.config.limit {
                emit_limit_reached(&run_id, limit);
            }
        }

        let report = RunReport {
            run_id,
            dry_run: self.config.dry_run,
            started_at,
            finished_at: Utc::now(),
            stopped_at_limit,
            outcomes,
        };
        emit_run_finished(
            &report.run_id,
            report.duration_ms(),
            &report.summary(),
            report.stopped_at_limit,
        );
        METRICS.flush();
        Ok(report)
    }

    fn limit_reached(&self, processed: usize) -> bool {
        self.config.limit.map_or(false, |limit| processed >= limit)
    }

    async fn list_groups(&self, region: &str) -> ReconcileResult<Vec<AutoScalingGroup>> {
        let name = self.config.asg_filter.as_ref().map(|f| f.name.as_str());
        let groups = self
            .groups
            .list_auto_scaling_groups(region, name)
            .await
            .map_err(|source| ReconcileError::Listing {
                region: region.to_string(),
                source,
            })?;

        if let Some(name) = name {
            if groups.is_empty() {
                return Err(ReconcileError::AsgNotFound {
                    name: name.to_string(),
                    region: region.to_string(),
                });
            }
        }
        debug!(region = %region, groups = groups.len(), "listed auto scaling groups");
        Ok(groups)
    }

    async fn process_group(&self, group: &AutoScalingGroup) -> RemediationOutcome {
        match self.remediate(group).await {
            Ok(outcome) => outcome,
            Err(e) => RemediationOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    async fn remediate(&self, group: &AutoScalingGroup) -> ReconcileResult<RemediationOutcome> {
        let region = group.region.as_str();
        let (template_name, raw_selector) = match &group.binding {
            LaunchBinding::LaunchConfiguration { name } => {
                self.legacy.record_legacy_asg(region, &group.name).await?;
                return Ok(RemediationOutcome::Deferred {
                    launch_configuration: name.clone(),
                });
            }
            LaunchBinding::LaunchTemplate {
                template_name,
                version,
            } => (template_name.as_str(), version.as_str()),
        };

        let selector: VersionSelector = raw_selector.parse()?;
        let current = self
            .resolver
            .resolve(region, template_name, &selector)
            .await?;

        if has_marker(&current.tag_specification) {
            return Ok(RemediationOutcome::Skipped {
                template_name: template_name.to_string(),
                version_number: current.version_number,
            });
        }

        let image = match self.images.describe_image(region, &current.image_id).await? {
            Some(image) => image,
            None => {
                debug!(region = %region, image = %current.image_id, "image not found, classifying as unresolved");
                ImageMetadata::unresolved(&current.image_id)
            }
        };
        let value = self.classifier.classify_image(&image);
        let merged = with_marker_merged(&current.tag_specification, &value);
        let pointer_update = PointerUpdateKind::for_selector(&selector);

        if self.config.dry_run {
            return Ok(RemediationOutcome::Planned {
                template_name: template_name.to_string(),
                source_version: current.version_number,
                tag_specification: merged,
                pointer_update,
            });
        }

        let new_version = self
            .publisher
            .publish(region, template_name, current.version_number, &merged)
            .await?;
        METRICS.inc_versions_published();

        let pointer_update = self
            .policy
            .apply(region, &group.name, template_name, &selector, new_version)
            .await?;
        if pointer_update != PointerUpdateKind::NoneRequired {
            METRICS.inc_pointer_updates();
        }

        Ok(RemediationOutcome::Applied {
            template_name: template_name.to_string(),
            source_version: current.version_number,
            new_version,
            pointer_update,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vma_fleet::fakes::{FleetOperation, MemoryFleet, MemoryLegacySink};
    use vma_fleet::{LaunchTemplateVersion, TagSpecification};

    fn reconciler(fleet: &Arc<MemoryFleet>, config: ReconcileConfig) -> Reconciler {
        let sink = Arc::new(MemoryLegacySink::new());
        Reconciler::new(config, Collaborators::from_fleet(fleet.clone(), sink))
    }

    fn config() -> ReconcileConfig {
        ReconcileConfig::default()
            .with_regions(["us-west-2"])
            .with_dry_run(false)
    }

    #[tokio::test]
    async fn zero_limit_lists_nothing() {
        let fleet = Arc::new(MemoryFleet::new());
        fleet.add_group(AutoScalingGroup::with_launch_configuration(
            "legacy", "us-west-2", None,
        ));

        let report = reconciler(&fleet, config().with_limit(Some(0)))
            .run()
            .await
            .unwrap();

        assert!(report.outcomes.is_empty());
        assert!(report.stopped_at_limit);
        assert!(fleet.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_image_is_classified_as_unresolved() {
        let fleet = Arc::new(MemoryFleet::new());
        fleet.add_group(AutoScalingGroup::with_template(
            "web-asg", "us-west-2", "web-lt", "$Latest",
        ));
        fleet.add_template_version(
            "us-west-2",
            LaunchTemplateVersion {
                template_name: "web-lt".to_string(),
                version_number: 1,
                image_id: "ami-gone".to_string(),
                tag_specification: TagSpecification::default(),
            },
        );

        let report = reconciler(&fleet, config())
            .with_classifier(|location: &str, name: &str, owner: &str| {
                format!("{}/{}/{}", location, name, owner)
            })
            .run()
            .await
            .unwrap();

        let created = fleet.template_version("us-west-2", "web-lt", 2).unwrap();
        assert_eq!(
            crate::tagging::marker_value(&created.tag_specification),
            Some("none/none/none")
        );
        assert_eq!(fleet.count(FleetOperation::DescribeImage), 1);
        assert_eq!(report.summary().applied, 1);
    }

    #[tokio::test]
    async fn published_version_with_failed_repoint_is_reported() {
        let fleet = Arc::new(MemoryFleet::new());
        fleet.add_group(AutoScalingGroup::with_template(
            "web-asg", "us-west-2", "web-lt", "$Default",
        ));
        fleet.add_template_version(
            "us-west-2",
            LaunchTemplateVersion {
                template_name: "web-lt".to_string(),
                version_number: 1,
                image_id: "ami-1".to_string(),
                tag_specification: TagSpecification::default(),
            },
        );
        fleet.fail_on(FleetOperation::SetDefaultVersion, "UnauthorizedOperation");

        let report = reconciler(&fleet, config()).run().await.unwrap();

        match report.outcome_for("us-west-2", "web-asg").unwrap() {
            RemediationOutcome::Failed { reason } => {
                assert!(reason.contains("published version 2"));
                assert!(reason.contains("UnauthorizedOperation"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fleet.latest_version("us-west-2", "web-lt"), Some(2));
        assert_eq!(fleet.default_version("us-west-2", "web-lt"), Some(1));
    }
}
