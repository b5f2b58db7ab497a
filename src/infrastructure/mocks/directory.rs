//! Mock actor directory for testing.

use crate::application::ports::ActorDirectory;
use crate::domain::actor::{ActorId, Capabilities, Permissions};
use ahash::AHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct ActorRecord {
    capabilities: Capabilities,
    half_rtt: Option<Duration>,
}

/// In-memory directory with per-actor capabilities and latency.
///
/// Unknown actors hold no permissions and have no latency estimate. Clones
/// share the same records.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    actors: Arc<Mutex<AHashMap<ActorId, ActorRecord>>>,
    panic_on_lookup: Arc<AtomicBool>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a permission to an actor.
    pub fn grant(&self, actor: ActorId, permission: impl Into<String>) {
        self.lock()
            .entry(actor)
            .or_default()
            .capabilities
            .grant(permission);
    }

    /// Revoke a permission. Returns whether the actor held it.
    pub fn revoke(&self, actor: ActorId, permission: &str) -> bool {
        self.lock()
            .get_mut(&actor)
            .is_some_and(|record| record.capabilities.revoke(permission))
    }

    /// Set or clear an actor's latency estimate.
    pub fn set_half_rtt(&self, actor: ActorId, half_rtt: Option<Duration>) {
        self.lock().entry(actor).or_default().half_rtt = half_rtt;
    }

    /// Forget an actor entirely.
    pub fn remove(&self, actor: ActorId) {
        self.lock().remove(&actor);
    }

    /// Make every lookup panic, to exercise fail-closed paths.
    pub fn panic_on_lookup(&self, enabled: bool) {
        self.panic_on_lookup.store(enabled, Ordering::SeqCst);
    }

    fn check_fault(&self) {
        if self.panic_on_lookup.load(Ordering::SeqCst) {
            panic!("MockDirectory lookup failure");
        }
    }

    fn lock(&self) -> MutexGuard<'_, AHashMap<ActorId, ActorRecord>> {
        self.actors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActorDirectory for MockDirectory {
    fn has_permission(&self, actor: ActorId, permission: &str) -> bool {
        self.check_fault();
        self.lock()
            .get(&actor)
            .is_some_and(|record| record.capabilities.has_permission(permission))
    }

    fn half_rtt(&self, actor: ActorId) -> Option<Duration> {
        self.check_fault();
        self.lock().get(&actor).and_then(|record| record.half_rtt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_actor() {
        let directory = MockDirectory::new();
        let actor = ActorId::new(1);
        assert!(!directory.has_permission(actor, "anything"));
        assert_eq!(directory.half_rtt(actor), None);
    }

    #[test]
    fn test_grant_revoke_and_latency() {
        let directory = MockDirectory::new();
        let actor = ActorId::new(1);

        directory.grant(actor, "vip");
        directory.set_half_rtt(actor, Some(Duration::from_millis(30)));
        assert!(directory.has_permission(actor, "vip"));
        assert_eq!(directory.half_rtt(actor), Some(Duration::from_millis(30)));

        assert!(directory.revoke(actor, "vip"));
        assert!(!directory.revoke(actor, "vip"));
        assert!(!directory.has_permission(actor, "vip"));

        directory.remove(actor);
        assert_eq!(directory.half_rtt(actor), None);
    }

    #[test]
    #[should_panic(expected = "MockDirectory lookup failure")]
    fn test_panic_on_lookup() {
        let directory = MockDirectory::new();
        directory.panic_on_lookup(true);
        directory.half_rtt(ActorId::new(1));
    }
}
