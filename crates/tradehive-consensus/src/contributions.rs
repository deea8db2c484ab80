//! Time-pruned contribution log

use parking_lot::Mutex;
use std::collections::VecDeque;
use tradehive_common::{Contribution, Result};

/// Contributions in arrival order, pruned by age and count
pub struct ContributionLog {
    entries: Mutex<VecDeque<Contribution>>,
    /// Entries older than this (relative to the prune time) are dropped
    retention_ms: i64,
    max_entries: usize,
}

impl ContributionLog {
    pub fn new(retention_ms: i64, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            retention_ms: retention_ms.max(0),
            max_entries: max_entries.max(1),
        }
    }

    /// Record a validated contribution; the oldest entry is dropped when full
    pub fn record(&self, contribution: Contribution) -> Result<()> {
        contribution.validate()?;
        let mut entries = self.entries.lock();
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(contribution);
        Ok(())
    }

    /// Contributions with `now - window_ms <= timestamp <= now`
    pub fn window(&self, now_ms: i64, window_ms: i64) -> Vec<Contribution> {
        let start = now_ms.saturating_sub(window_ms);
        self.entries
            .lock()
            .iter()
            .filter(|c| c.timestamp >= start && c.timestamp <= now_ms)
            .cloned()
            .collect()
    }

    /// Drop entries past retention; returns how many were removed
    pub fn prune(&self, now_ms: i64) -> usize {
        let cutoff = now_ms.saturating_sub(self.retention_ms);
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|c| c.timestamp >= cutoff);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
