//! Storage implementations for per-actor state.
//!
//! Provides concurrent, sharded storage for click windows, ledgers and
//! session gates.

use crate::application::ports::{Storage, StorageFamily};
use crate::application::registry::WindowKey;
use crate::application::sessions::SessionGate;
use crate::domain::actor::ActorId;
use crate::domain::penalty::{ActivePenalty, Expiring};
use crate::domain::window::RateWindow;
use ahash::RandomState;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Thread-safe sharded storage backed by DashMap.
///
/// Each key lives in one shard guarded by its own lock, so actors in
/// different shards never contend and all access to one key is serialized.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, V, RandomState>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Check if a key exists.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// Implement the Storage port
impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let mut value_ref = self.map.entry(key).or_insert_with(factory);
        accessor(&mut value_ref)
    }

    fn with_existing_mut<F, R>(&self, key: &K, accessor: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R,
    {
        self.map
            .get_mut(key)
            .map(|mut value_ref| accessor(&mut value_ref))
    }

    fn insert(&self, key: K, value: V) {
        self.map.insert(key, value);
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.map.remove(key).map(|(_, value)| value)
    }

    fn remove_if<F>(&self, key: &K, predicate: F) -> Option<V>
    where
        F: FnOnce(&V) -> bool,
    {
        self.map
            .remove_if(key, |_, value| predicate(value))
            .map(|(_, value)| value)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// Implement Storage for Arc<ShardedStorage> so clones share one map
impl<K, V> Storage<K, V> for Arc<ShardedStorage<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        (**self).with_entry_mut(key, factory, accessor)
    }

    fn with_existing_mut<F, R>(&self, key: &K, accessor: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R,
    {
        (**self).with_existing_mut(key, accessor)
    }

    fn insert(&self, key: K, value: V) {
        (**self).insert(key, value)
    }

    fn remove(&self, key: &K) -> Option<V> {
        (**self).remove(key)
    }

    fn remove_if<F>(&self, key: &K, predicate: F) -> Option<V>
    where
        F: FnOnce(&V) -> bool,
    {
        (**self).remove_if(key, predicate)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }
}

/// The default storage family: one shared `ShardedStorage` per kind of state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sharded;

impl StorageFamily for Sharded {
    type Windows = Arc<ShardedStorage<WindowKey, RateWindow>>;
    type Penalties = Arc<ShardedStorage<ActorId, Expiring<ActivePenalty>>>;
    type Cooldowns = Arc<ShardedStorage<ActorId, Expiring<()>>>;
    type Gates = Arc<ShardedStorage<ActorId, Arc<SessionGate>>>;
}
