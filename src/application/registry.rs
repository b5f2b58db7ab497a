//! Registry of per-(actor, kind) click windows.
//!
//! Windows are created lazily on first use and exclusively held for the
//! duration of each access, so a read-decide-record sequence on one window
//! can never interleave with another writer on the same window.

use crate::application::ports::Storage;
use crate::domain::actor::{ActorId, ClickKind};
use crate::domain::window::RateWindow;
use std::time::{Duration, Instant};

/// Key identifying one click window.
pub type WindowKey = (ActorId, ClickKind);

/// Registry managing all click windows.
///
/// This type is generic over the storage implementation, allowing different
/// storage backends to be used. In production, use `Arc<ShardedStorage>`.
#[derive(Debug, Clone)]
pub struct WindowRegistry<S>
where
    S: Storage<WindowKey, RateWindow> + Clone,
{
    storage: S,
}

impl<S> WindowRegistry<S>
where
    S: Storage<WindowKey, RateWindow> + Clone,
{
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Access or create the window for `(actor, kind)` with a callback.
    pub fn with_window<F, R>(&self, actor: ActorId, kind: ClickKind, f: F) -> R
    where
        F: FnOnce(&mut RateWindow) -> R,
    {
        self.storage.with_entry_mut((actor, kind), RateWindow::new, f)
    }

    /// Prune the window for `(actor, kind)` and count what remains.
    ///
    /// A missing window counts as empty and is not created.
    pub fn prune_and_count(
        &self,
        actor: ActorId,
        kind: ClickKind,
        now: Instant,
        window: Duration,
    ) -> usize {
        self.storage
            .with_existing_mut(&(actor, kind), |w| w.prune_and_count(now, window))
            .unwrap_or(0)
    }

    /// Number of clicks currently held for `(actor, kind)`, without pruning.
    pub fn window_len(&self, actor: ActorId, kind: ClickKind) -> usize {
        self.storage
            .with_existing_mut(&(actor, kind), |window| window.len())
            .unwrap_or(0)
    }

    /// Drop every window belonging to `actor`. Returns how many existed.
    pub fn discard_actor(&self, actor: ActorId) -> usize {
        ClickKind::ALL
            .iter()
            .filter(|kind| self.storage.remove(&(actor, **kind)).is_some())
            .count()
    }

    /// Get the number of tracked windows.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}
