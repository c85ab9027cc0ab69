//! Global atomic counters for reconciliation runs.
//!
//! Incremented at the call site; [`Metrics::flush`] logs the current values
//! as one `info!` event at the end of a run. Each reconciliation run resets
//! the counters when it starts.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    groups_processed: AtomicU64,
    versions_published: AtomicU64,
    pointer_updates: AtomicU64,
    failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            groups_processed: AtomicU64::new(0),
            versions_published: AtomicU64::new(0),
            pointer_updates: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn inc_groups_processed(&self) {
        self.groups_processed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "groups_processed", "counter incremented");
    }

    pub fn inc_versions_published(&self) {
        self.versions_published.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "versions_published", "counter incremented");
    }

    /// Counts actual directory calls; `$Latest` groups never increment it.
    pub fn inc_pointer_updates(&self) {
        self.pointer_updates.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "pointer_updates", "counter incremented");
    }

    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "failures", "counter incremented");
    }

    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            groups_processed = self.groups_processed(),
            versions_published = self.versions_published(),
            pointer_updates = self.pointer_updates(),
            failures = self.failures(),
        );
    }

    pub fn groups_processed(&self) -> u64 {
        self.groups_processed.load(Ordering::Relaxed)
    }

    pub fn versions_published(&self) -> u64 {
        self.versions_published.load(Ordering::Relaxed)
    }

    pub fn pointer_updates(&self) -> u64 {
        self.pointer_updates.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.groups_processed.store(0, Ordering::Relaxed);
        self.versions_published.store(0, Ordering::Relaxed);
        self.pointer_updates.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_groups_processed();
        m.inc_groups_processed();
        m.inc_versions_published();
        m.inc_pointer_updates();
        m.inc_failures();
        m.inc_failures();
        m.inc_failures();
        assert_eq!(m.groups_processed(), 2);
        assert_eq!(m.versions_published(), 1);
        assert_eq!(m.pointer_updates(), 1);
        assert_eq!(m.failures(), 3);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_groups_processed();
        m.inc_versions_published();
        m.inc_pointer_updates();
        m.inc_failures();
        m.reset();
        assert_eq!(m.groups_processed(), 0);
        assert_eq!(m.versions_published(), 0);
        assert_eq!(m.pointer_updates(), 0);
        assert_eq!(m.failures(), 0);
    }
}
