//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports, and the host
//! (session manager, network layer, combat code) implements the actor-facing
//! ones.

use crate::application::registry::WindowKey;
use crate::application::sessions::SessionGate;
use crate::domain::actor::ActorId;
use crate::domain::penalty::{ActivePenalty, Expiring};
use crate::domain::window::RateWindow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Port for obtaining current time.
///
/// Must be monotonic. Infrastructure provides `SystemClock` and `MockClock`.
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for concurrent key-value storage.
///
/// Every operation is atomic with respect to a single key: the accessor
/// passed to `with_entry_mut` runs while that entry is exclusively held.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// Creation and access happen under one exclusive hold, so two callers
    /// racing on a missing key end up sharing a single value.
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Access an existing entry with mutable access. Returns `None` if absent.
    fn with_existing_mut<F, R>(&self, key: &K, accessor: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R;

    /// Insert or overwrite a value.
    fn insert(&self, key: K, value: V);

    /// Remove a key and return its value.
    fn remove(&self, key: &K) -> Option<V>;

    /// Remove a key only if the predicate holds for its current value.
    fn remove_if<F>(&self, key: &K, predicate: F) -> Option<V>
    where
        F: FnOnce(&V) -> bool;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;
}

/// A family of storage backends, one per kind of per-actor state.
///
/// Lets the rate limiter stay generic over storage with a single type
/// parameter. Infrastructure provides `Sharded`.
pub trait StorageFamily: Send + Sync + 'static {
    type Windows: Storage<WindowKey, RateWindow> + Clone + Default;
    type Penalties: Storage<ActorId, Expiring<ActivePenalty>> + Clone + Default;
    type Cooldowns: Storage<ActorId, Expiring<()>> + Clone + Default;
    type Gates: Storage<ActorId, Arc<SessionGate>> + Clone + Default;
}

/// Port for looking up live actor attributes.
///
/// Implemented by the host's session layer. Both methods are called on the
/// decision path and must return quickly.
pub trait ActorDirectory: Send + Sync {
    /// Whether the actor currently holds `permission`.
    fn has_permission(&self, actor: ActorId, permission: &str) -> bool;

    /// Half the actor's current round-trip time, or `None` if unknown.
    fn half_rtt(&self, actor: ActorId) -> Option<Duration>;
}

/// Port for actor-facing side effects of the penalty protocol.
pub trait SessionGateway: Send + Sync {
    /// Send a user-facing message to the actor.
    fn notify(&self, actor: ActorId, message: &str);

    /// Request termination of the actor's session.
    fn eject(&self, actor: ActorId, reason: &str);
}

/// Port for text diagnostics.
///
/// Fan-out to subscribers is the sink's business.
pub trait DiagnosticSink: Send + Sync {
    fn diagnostic(&self, message: &str);
}
