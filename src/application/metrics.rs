//! Observability metrics for click throttling.
//!
//! Provides counters about throttling behavior for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking click throttling statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Raw clicks fed into windows by the passive recorder
    clicks_recorded: AtomicU64,
    /// Gate decisions that allowed the action unmodified
    actions_allowed: AtomicU64,
    /// Gate decisions that denied the action
    actions_denied: AtomicU64,
    /// Primary confirmations scaled down by an attenuation penalty
    actions_attenuated: AtomicU64,
    /// Cooldowns started by a primary violation
    cooldowns_started: AtomicU64,
    /// Suppress or attenuate penalties written to the ledger
    penalties_applied: AtomicU64,
    /// Ejections requested
    ejections: AtomicU64,
    /// Collaborator panics caught on the decision path
    faults: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_click(&self) {
        self.inner.clicks_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.actions_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_denied(&self) {
        self.inner.actions_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_attenuated(&self) {
        self.inner.actions_attenuated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cooldown(&self) {
        self.inner.cooldowns_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_penalty(&self) {
        self.inner.penalties_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ejection(&self) {
        self.inner.ejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.inner.faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn clicks_recorded(&self) -> u64 {
        self.inner.clicks_recorded.load(Ordering::Relaxed)
    }

    pub fn actions_allowed(&self) -> u64 {
        self.inner.actions_allowed.load(Ordering::Relaxed)
    }

    pub fn actions_denied(&self) -> u64 {
        self.inner.actions_denied.load(Ordering::Relaxed)
    }

    pub fn actions_attenuated(&self) -> u64 {
        self.inner.actions_attenuated.load(Ordering::Relaxed)
    }

    pub fn cooldowns_started(&self) -> u64 {
        self.inner.cooldowns_started.load(Ordering::Relaxed)
    }

    pub fn penalties_applied(&self) -> u64 {
        self.inner.penalties_applied.load(Ordering::Relaxed)
    }

    pub fn ejections(&self) -> u64 {
        self.inner.ejections.load(Ordering::Relaxed)
    }

    pub fn faults(&self) -> u64 {
        self.inner.faults.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            clicks_recorded: self.clicks_recorded(),
            actions_allowed: self.actions_allowed(),
            actions_denied: self.actions_denied(),
            actions_attenuated: self.actions_attenuated(),
            cooldowns_started: self.cooldowns_started(),
            penalties_applied: self.penalties_applied(),
            ejections: self.ejections(),
            faults: self.faults(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        let inner = &self.inner;
        for counter in [
            &inner.clicks_recorded,
            &inner.actions_allowed,
            &inner.actions_denied,
            &inner.actions_attenuated,
            &inner.cooldowns_started,
            &inner.penalties_applied,
            &inner.ejections,
            &inner.faults,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub clicks_recorded: u64,
    pub actions_allowed: u64,
    pub actions_denied: u64,
    pub actions_attenuated: u64,
    pub cooldowns_started: u64,
    pub penalties_applied: u64,
    pub ejections: u64,
    pub faults: u64,
}

impl MetricsSnapshot {
    /// Gate decisions of any outcome.
    pub fn total_decisions(&self) -> u64 {
        self.actions_allowed
            .saturating_add(self.actions_denied)
            .saturating_add(self.actions_attenuated)
    }

    /// Fraction of decisions that denied the action (0.0 to 1.0).
    ///
    /// Returns 0.0 if no decisions have been made.
    pub fn denial_rate(&self) -> f64 {
        let total = self.total_decisions();
        if total == 0 {
            0.0
        } else {
            self.actions_denied as f64 / total as f64
        }
    }
}
