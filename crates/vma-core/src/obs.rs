//! Structured lifecycle events for reconciliation runs.
//!
//! All events carry an `event` field so log pipelines can filter on it.

use std::future::Future;

use tracing::instrument::Instrumented;
use tracing::{info, warn, Instrument};

use crate::outcome::{AsgOutcome, RemediationOutcome, RunSummary};

/// Span tagged with `run_id` that a whole run executes inside.
///
/// Attached with [`RunSpan::instrument`] rather than entered, so the run
/// future stays `Send` across awaits.
pub struct RunSpan {
    span: tracing::Span,
}

impl RunSpan {
    pub fn new(run_id: &str) -> Self {
        Self {
            span: tracing::info_span!("vma.run", run_id = %run_id),
        }
    }

    pub fn instrument<F: Future>(&self, future: F) -> Instrumented<F> {
        future.instrument(self.span.clone())
    }
}

pub fn emit_run_started(run_id: &str, regions: &[String], dry_run: bool, limit: Option<usize>) {
    info!(
        event = "run.started",
        run_id = %run_id,
        regions = %regions.join(","),
        dry_run = dry_run,
        limit = ?limit,
    );
}

/// Failed groups are logged at `warn`, everything else at `info`.
pub fn emit_group_outcome(run_id: &str, entry: &AsgOutcome) {
    match &entry.outcome {
        RemediationOutcome::Failed { reason } => warn!(
            event = "group.failed",
            run_id = %run_id,
            region = %entry.region,
            asg = %entry.asg_name,
            reason = %reason,
        ),
        other => info!(
            event = "group.outcome",
            run_id = %run_id,
            region = %entry.region,
            asg = %entry.asg_name,
            status = other.label(),
        ),
    }
}

pub fn emit_limit_reached(run_id: &str, limit: usize) {
    info!(event = "run.limit_reached", run_id = %run_id, limit = limit);
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, summary: &RunSummary, stopped_at_limit: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        processed = summary.total(),
        applied = summary.applied,
        planned = summary.planned,
        skipped = summary.skipped,
        deferred = summary.deferred,
        failed = summary.failed,
        stopped_at_limit = stopped_at_limit,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_span_wraps_future() {
        let span = RunSpan::new("test-run-id");
        let value = span.instrument(async { 7 }).await;
        assert_eq!(value, 7);
        emit_group_outcome(
            "test-run-id",
            &AsgOutcome {
                region: "us-west-2".to_string(),
                asg_name: "web-asg".to_string(),
                outcome: RemediationOutcome::Failed {
                    reason: "boom".to_string(),
                },
            },
        );
    }
}
