//! VMA - Vendor-Managed AMI tag reconciler CLI
//!
//! The `vma` command checks every auto-scaling group's launch template for the
//! `Vendor_Managed_AMI` tag and publishes tagged template versions where it is
//! missing.
//!
//! ## Commands
//!
//! - `reconcile`: Scan regions and remediate untagged groups (dry run by default)
//! - `legacy`: Show groups recorded as launch-configuration based

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use vma_core::{
    AsgFilter, Collaborators, ReconcileConfig, Reconciler, RemediationOutcome, RunReport,
};
use vma_fleet::{AwsFleet, JsonlLegacySink, DEFAULT_LEGACY_LOG};

#[derive(Parser)]
#[command(name = "vma")]
#[command(author = "Fleet Platform Engineering")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vendor-Managed AMI tag reconciler", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines and a JSON run report on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag launch templates of every group missing the provenance marker
    Reconcile {
        /// Report what would change without writing (`--dry-run false` applies)
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        dry_run: bool,

        /// Stop after this many groups
        #[arg(long)]
        limit: Option<usize>,

        /// Process only this group (requires --region)
        #[arg(long, requires = "region")]
        asg_name: Option<String>,

        /// Restrict the run to one region
        #[arg(long)]
        region: Option<String>,

        /// Where launch-configuration groups are recorded
        #[arg(long, env = "VMA_LEGACY_LOG", default_value = DEFAULT_LEGACY_LOG)]
        legacy_log: PathBuf,

        /// Write the JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List groups recorded in the legacy log
    Legacy {
        #[arg(long, env = "VMA_LEGACY_LOG", default_value = DEFAULT_LEGACY_LOG)]
        legacy_log: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    vma_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Reconcile {
            dry_run,
            limit,
            asg_name,
            region,
            legacy_log,
            report,
        } => {
            let config = build_config(ReconcileConfig::from_env(), dry_run, limit, asg_name, region);
            cmd_reconcile(config, &legacy_log, report.as_deref(), cli.json).await
        }
        Commands::Legacy { legacy_log } => cmd_legacy(&legacy_log, cli.json).await,
    }
}

/// Apply command-line overrides on top of the environment config.
fn build_config(
    base: ReconcileConfig,
    dry_run: bool,
    limit: Option<usize>,
    asg_name: Option<String>,
    region: Option<String>,
) -> ReconcileConfig {
    let mut config = base.with_dry_run(dry_run).with_limit(limit);
    if let Some(region) = region {
        config = match asg_name {
            Some(name) => config.with_asg_filter(Some(AsgFilter::new(name, region))),
            None => config.with_regions([region]),
        };
    }
    config
}

async fn cmd_reconcile(
    config: ReconcileConfig,
    legacy_log: &Path,
    report_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let fleet = AwsFleet::connect(config.target_regions()).await;
    info!(regions = ?fleet.regions(), "fleet connected");
    let sink = Arc::new(JsonlLegacySink::new(legacy_log));
    let reconciler = Reconciler::new(config, Collaborators::from_fleet(Arc::new(fleet), sink));

    let report = run_and_report(&reconciler, report_path).await?;
    if json {
        println!("{}", report_json(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Run the reconciler and persist the report if a path was given.
async fn run_and_report(reconciler: &Reconciler, report_path: Option<&Path>) -> Result<RunReport> {
    let report = reconciler.run().await.context("Reconciliation aborted")?;
    if let Some(path) = report_path {
        report
            .write_json(path)
            .await
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        info!(path = %path.display(), "run report written");
    }
    Ok(report)
}

/// The `--json` stdout document: the run report and nothing else.
fn report_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize run report")
}

fn print_report(report: &RunReport) {
    let mode = if report.dry_run { " (dry run)" } else { "" };
    println!("Run {}{}", report.run_id, mode);
    for entry in &report.outcomes {
        println!(
            "  {:<10} {}/{}  {}",
            entry.outcome.label(),
            entry.region,
            entry.asg_name,
            describe(&entry.outcome)
        );
    }

    let summary = report.summary();
    println!();
    println!(
        "{} groups: {} applied, {} planned, {} skipped, {} deferred, {} failed",
        summary.total(),
        summary.applied,
        summary.planned,
        summary.skipped,
        summary.deferred,
        summary.failed
    );
    if report.stopped_at_limit {
        println!("Stopped at processing limit.");
    }
}

fn describe(outcome: &RemediationOutcome) -> String {
    match outcome {
        RemediationOutcome::Skipped {
            template_name,
            version_number,
        } => format!("{} v{} already tagged", template_name, version_number),
        RemediationOutcome::Applied {
            template_name,
            source_version,
            new_version,
            pointer_update,
        } => format!(
            "{} v{} -> v{} ({:?})",
            template_name, source_version, new_version, pointer_update
        ),
        RemediationOutcome::Planned {
            template_name,
            source_version,
            pointer_update,
            ..
        } => format!(
            "{} v{} -> new version ({:?})",
            template_name, source_version, pointer_update
        ),
        RemediationOutcome::Deferred {
            launch_configuration,
        } => format!(
            "launch configuration {}",
            launch_configuration.as_deref().unwrap_or("<none>")
        ),
        RemediationOutcome::Failed { reason } => reason.clone(),
    }
}

async fn cmd_legacy(legacy_log: &Path, json: bool) -> Result<()> {
    let records = JsonlLegacySink::new(legacy_log)
        .read_all()
        .await
        .with_context(|| format!("Failed to read {:?}", legacy_log))?;
    info!(path = %legacy_log.display(), records = records.len(), "legacy log read");

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No legacy groups recorded in {}", legacy_log.display());
        return Ok(());
    }
    for record in &records {
        println!(
            "{}  {}/{}",
            record.recorded_at.to_rfc3339(),
            record.region,
            record.asg_name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vma_fleet::fakes::{FleetOperation, MemoryFleet};
    use vma_fleet::{AutoScalingGroup, LaunchTemplateVersion, TagSpecification};

    fn base() -> ReconcileConfig {
        ReconcileConfig::default().with_regions(["us-west-2", "us-east-1"])
    }

    #[test]
    fn dry_run_defaults_to_true() {
        let cli = Cli::try_parse_from(["vma", "reconcile"]).unwrap();
        match cli.command {
            Commands::Reconcile { dry_run, limit, .. } => {
                assert!(dry_run);
                assert!(limit.is_none());
            }
            _ => panic!("expected reconcile"),
        }
    }

    #[test]
    fn dry_run_false_applies() {
        let cli = Cli::try_parse_from(["vma", "reconcile", "--dry-run", "false", "--limit", "3"])
            .unwrap();
        match cli.command {
            Commands::Reconcile { dry_run, limit, .. } => {
                assert!(!dry_run);
                assert_eq!(limit, Some(3));
            }
            _ => panic!("expected reconcile"),
        }
    }

    #[test]
    fn asg_name_requires_region() {
        assert!(Cli::try_parse_from(["vma", "reconcile", "--asg-name", "web-asg"]).is_err());
        assert!(Cli::try_parse_from([
            "vma",
            "reconcile",
            "--asg-name",
            "web-asg",
            "--region",
            "us-west-2"
        ])
        .is_ok());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vma", "legacy", "--json", "-v"]).unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
    }

    #[test]
    fn region_alone_narrows_regions() {
        let config = build_config(base(), true, None, None, Some("eu-west-1".to_string()));
        assert_eq!(config.regions, vec!["eu-west-1".to_string()]);
        assert!(config.asg_filter.is_none());
    }

    #[test]
    fn asg_name_with_region_sets_filter() {
        let config = build_config(
            base(),
            false,
            Some(1),
            Some("web-asg".to_string()),
            Some("us-east-1".to_string()),
        );
        assert_eq!(config.asg_filter, Some(AsgFilter::new("web-asg", "us-east-1")));
        assert_eq!(config.target_regions(), vec!["us-east-1".to_string()]);
        assert!(!config.dry_run);
        assert_eq!(config.limit, Some(1));
    }

    #[test]
    fn describe_names_pointer_update() {
        let text = describe(&RemediationOutcome::Applied {
            template_name: "web-lt".to_string(),
            source_version: 2,
            new_version: 3,
            pointer_update: vma_core::PointerUpdateKind::AsgVersion,
        });
        assert_eq!(text, "web-lt v2 -> v3 (AsgVersion)");
    }

    #[tokio::test]
    async fn json_output_is_a_single_report_document() {
        let fleet = Arc::new(MemoryFleet::new());
        fleet.add_group(AutoScalingGroup::with_launch_configuration(
            "legacy-asg",
            "us-west-2",
            None,
        ));
        let reconciler = Reconciler::new(
            base().with_regions(["us-west-2"]),
            Collaborators::from_fleet(fleet, Arc::new(vma_fleet::fakes::MemoryLegacySink::new())),
        );
        let report = run_and_report(&reconciler, None).await.unwrap();

        let stdout = report_json(&report).unwrap();

        let parsed: RunReport = serde_json::from_str(&stdout).unwrap();
        assert_eq!(parsed, report);
    }

    #[tokio::test]
    async fn run_and_report_writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let fleet = Arc::new(MemoryFleet::new());
        fleet.add_group(AutoScalingGroup::with_template(
            "web-asg", "us-west-2", "web-lt", "$Latest",
        ));
        fleet.add_group(AutoScalingGroup::with_launch_configuration(
            "legacy-asg",
            "us-west-2",
            None,
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
        let sink = Arc::new(JsonlLegacySink::new(dir.path().join("legacy.jsonl")));
        let reconciler = Reconciler::new(
            base().with_regions(["us-west-2"]),
            Collaborators::from_fleet(fleet.clone(), sink.clone()),
        );
        let report_path = dir.path().join("report.json");

        let report = run_and_report(&reconciler, Some(&report_path)).await.unwrap();

        assert_eq!(report.summary().planned, 1);
        assert_eq!(report.summary().deferred, 1);
        assert_eq!(fleet.count(FleetOperation::CreateVersion), 0);
        assert!(report_path.exists());
        assert_eq!(sink.read_all().await.unwrap().len(), 1);
    }
}
