//! Per-actor expiring ledgers.
//!
//! Used for both the penalty ledger and the cooldown ledger. An entry is
//! cleaned up by the first read that finds it expired; there is no sweeper.

use crate::application::ports::Storage;
use crate::domain::actor::ActorId;
use crate::domain::penalty::{ActivePenalty, Expiring};
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// At most one expiring value per actor. Setting overwrites.
#[derive(Debug, Clone)]
pub struct ExpiryLedger<V, S>
where
    V: Clone + Send + Sync,
    S: Storage<ActorId, Expiring<V>> + Clone,
{
    storage: S,
    _value: PhantomData<fn() -> V>,
}

/// Ledger of active Suppress/Attenuate penalties.
pub type PenaltyLedger<S> = ExpiryLedger<ActivePenalty, S>;

/// Ledger of primary-action cooldowns.
pub type CooldownLedger<S> = ExpiryLedger<(), S>;

impl<V, S> ExpiryLedger<V, S>
where
    V: Clone + Send + Sync,
    S: Storage<ActorId, Expiring<V>> + Clone,
{
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            _value: PhantomData,
        }
    }

    /// Record `value` for `actor` until `expires_at`, replacing any entry.
    pub fn set(&self, actor: ActorId, value: V, expires_at: Instant) {
        self.storage.insert(actor, Expiring::new(value, expires_at));
    }

    /// Get the actor's value if it is still active at `now`.
    ///
    /// An expired entry is removed and `None` is returned.
    pub fn get_if_active(&self, actor: ActorId, now: Instant) -> Option<V> {
        self.active_entry(actor, now).map(|entry| entry.value)
    }

    /// Time left on the actor's entry, if active.
    pub fn remaining(&self, actor: ActorId, now: Instant) -> Option<Duration> {
        self.active_entry(actor, now)
            .map(|entry| entry.remaining(now))
    }

    fn active_entry(&self, actor: ActorId, now: Instant) -> Option<Expiring<V>> {
        if self
            .storage
            .remove_if(&actor, |entry| !entry.is_active(now))
            .is_some()
        {
            return None;
        }
        self.storage
            .with_existing_mut(&actor, |entry| entry.is_active(now).then(|| entry.clone()))
            .flatten()
    }

    /// Remove the actor's entry. Returns whether one existed.
    pub fn clear(&self, actor: ActorId) -> bool {
        self.storage.remove(&actor).is_some()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}
