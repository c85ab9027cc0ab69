//! Per-group outcomes and the run report.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vma_fleet::TagSpecification;

use crate::error::ReconcileResult;
use crate::policy::PointerUpdateKind;

/// What happened to one auto-scaling group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemediationOutcome {
    /// The pinned version already carries the marker.
    Skipped {
        template_name: String,
        version_number: u64,
    },
    /// A new version was published and the pointer moved.
    Applied {
        template_name: String,
        source_version: u64,
        new_version: u64,
        pointer_update: PointerUpdateKind,
    },
    /// Dry run: what would have been published.
    Planned {
        template_name: String,
        source_version: u64,
        tag_specification: TagSpecification,
        pointer_update: PointerUpdateKind,
    },
    /// Launch-configuration group, handed to the legacy sink.
    Deferred { launch_configuration: Option<String> },
    Failed { reason: String },
}

impl RemediationOutcome {
    /// Short label used in logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            RemediationOutcome::Skipped { .. } => "skipped",
            RemediationOutcome::Applied { .. } => "applied",
            RemediationOutcome::Planned { .. } => "planned",
            RemediationOutcome::Deferred { .. } => "deferred",
            RemediationOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RemediationOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsgOutcome {
    pub region: String,
    pub asg_name: String,
    #[serde(flatten)]
    pub outcome: RemediationOutcome,
}

/// Outcome counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub skipped: usize,
    pub applied: usize,
    pub planned: usize,
    pub deferred: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.skipped + self.applied + self.planned + self.deferred + self.failed
    }
}

/// Result of one reconciliation run, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The processing cap ended the run.
    pub stopped_at_limit: bool,
    pub outcomes: Vec<AsgOutcome>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for entry in &self.outcomes {
            match entry.outcome {
                RemediationOutcome::Skipped { .. } => summary.skipped += 1,
                RemediationOutcome::Applied { .. } => summary.applied += 1,
                RemediationOutcome::Planned { .. } => summary.planned += 1,
                RemediationOutcome::Deferred { .. } => summary.deferred += 1,
                RemediationOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    pub fn outcome_for(&self, region: &str, asg_name: &str) -> Option<&RemediationOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.region == region && o.asg_name == asg_name)
            .map(|o| &o.outcome)
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub async fn write_json(&self, path: &Path) -> ReconcileResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
