//! Run configuration for the reconciler.

use serde::{Deserialize, Serialize};

/// Regions scanned when `VMA_REGIONS` is unset.
pub const DEFAULT_REGIONS: &[&str] = &["us-west-2", "us-east-1"];

/// Environment variable holding a comma-separated region list.
pub const REGIONS_ENV: &str = "VMA_REGIONS";

/// Restricts a run to one named group in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsgFilter {
    pub name: String,
    pub region: String,
}

impl AsgFilter {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Regions in processing order.
    pub regions: Vec<String>,
    /// Perform every read and decision but no fleet write.
    pub dry_run: bool,
    /// Stop after this many groups have been handled. `None` means unbounded.
    pub limit: Option<usize>,
    pub asg_filter: Option<AsgFilter>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        let regions = std::env::var(REGIONS_ENV)
            .ok()
            .map(|raw| parse_regions(&raw))
            .filter(|regions| !regions.is_empty())
            .unwrap_or_else(|| DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect());
        ReconcileConfig {
            regions,
            dry_run: true,
            limit: None,
            asg_filter: None,
        }
    }
}

impl ReconcileConfig {
    /// Config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_asg_filter(mut self, filter: Option<AsgFilter>) -> Self {
        self.asg_filter = filter;
        self
    }

    /// Regions a run will list: the filter's region alone when a filter is
    /// set, otherwise every configured region.
    pub fn target_regions(&self) -> Vec<String> {
        match &self.asg_filter {
            Some(filter) => vec![filter.region.clone()],
            None => self.regions.clone(),
        }
    }
}

/// Split a comma-separated region list, dropping blanks.
pub fn parse_regions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}
