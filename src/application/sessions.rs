//! Session gates.
//!
//! Every decision for an actor runs under a shared hold of that actor's
//! gate; session teardown takes the exclusive hold. A gate closed by
//! teardown is removed from the map, so later calls for the same actor id
//! start over with a fresh gate.

use crate::application::ports::Storage;
use crate::domain::actor::ActorId;
use std::sync::{Arc, PoisonError, RwLock};

/// Lifecycle gate for one actor.
#[derive(Debug, Default)]
pub struct SessionGate {
    ended: RwLock<bool>,
}

/// Map of live session gates.
#[derive(Debug, Clone)]
pub struct SessionGates<S>
where
    S: Storage<ActorId, Arc<SessionGate>> + Clone,
{
    storage: S,
}

impl<S> SessionGates<S>
where
    S: Storage<ActorId, Arc<SessionGate>> + Clone,
{
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Run `f` while holding the actor's gate open.
    ///
    /// Mutually exclusive with `end_session` for the same actor and
    /// concurrent with other `enter` calls.
    pub fn enter<F, R>(&self, actor: ActorId, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        loop {
            let gate = self.gate(actor);
            let ended = gate.ended.read().unwrap_or_else(PoisonError::into_inner);
            if !*ended {
                return f();
            }
            // Lost a race with teardown; the closed gate is already gone from the map.
        }
    }

    /// Close the actor's gate, run `teardown` exclusively, and forget the gate.
    ///
    /// Returns `None` if the actor had no gate.
    pub fn end_session<F, R>(&self, actor: ActorId, teardown: F) -> Option<R>
    where
        F: FnOnce() -> R,
    {
        let gate = self
            .storage
            .with_existing_mut(&actor, |gate| Arc::clone(gate))?;
        let mut ended = gate.ended.write().unwrap_or_else(PoisonError::into_inner);
        if *ended {
            return None;
        }
        *ended = true;
        let result = teardown();
        self.storage
            .remove_if(&actor, |current| Arc::ptr_eq(current, &gate));
        Some(result)
    }

    /// Number of actors with a live gate.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    fn gate(&self, actor: ActorId) -> Arc<SessionGate> {
        self.storage
            .with_entry_mut(actor, || Arc::new(SessionGate::default()), |gate| {
                Arc::clone(gate)
            })
    }
}
