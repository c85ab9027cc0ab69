//! `ReconcileConfig::default()` against the `VMA_REGIONS` variable.
//!
//! Kept in its own test binary with a single test: it mutates process env.

use vma_core::{ReconcileConfig, DEFAULT_REGIONS, REGIONS_ENV};

fn defaults() -> Vec<String> {
    DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect()
}

#[test]
fn regions_come_from_env_with_fallback() {
    std::env::set_var(REGIONS_ENV, "eu-west-1, ap-southeast-2");
    assert_eq!(
        ReconcileConfig::default().regions,
        vec!["eu-west-1".to_string(), "ap-southeast-2".to_string()]
    );

    std::env::set_var(REGIONS_ENV, " , ");
    assert_eq!(ReconcileConfig::default().regions, defaults());

    std::env::set_var(REGIONS_ENV, "");
    assert_eq!(ReconcileConfig::from_env().regions, defaults());

    std::env::remove_var(REGIONS_ENV);
    let config = ReconcileConfig::default();
    assert_eq!(config.regions, defaults());
    assert!(config.dry_run);
}
