//! JSON-lines escape-hatch sink
//!
//! Groups that still launch from a launch configuration cannot be given a new
//! template version. Each one is appended to a local file as one JSON object
//! per line so it can be migrated by hand later.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::directory::{FleetResult, LegacyAsgSink};
use crate::error::FleetError;

/// Default file name, relative to the working directory.
pub const DEFAULT_LEGACY_LOG: &str = "legacy_asgs.jsonl";

/// One line of the legacy log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAsgRecord {
    pub region: String,
    pub asg_name: String,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only JSON-lines file sink.
#[derive(Debug, Clone)]
pub struct JsonlLegacySink {
    path: PathBuf,
}

impl JsonlLegacySink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record written so far. A missing file yields no records.
    pub async fn read_all(&self) -> FleetResult<Vec<LegacyAsgRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(FleetError::from))
            .collect()
    }
}

#[async_trait]
impl LegacyAsgSink for JsonlLegacySink {
    async fn record_legacy_asg(&self, region: &str, asg_name: &str) -> FleetResult<()> {
        let record = LegacyAsgRecord {
            region: region.to_string(),
            asg_name: asg_name.to_string(),
            recorded_at: Utc::now(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = ?self.path, region = %region, asg = %asg_name, "legacy group recorded");
        Ok(())
    }
}
