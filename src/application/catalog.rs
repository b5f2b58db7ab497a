//! Atomically swappable profile catalog.

use crate::domain::profile::ProfileCatalog;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Shared handle to the current `ProfileCatalog`.
///
/// Readers get a consistent snapshot; `replace` swaps the whole catalog in
/// one step, so a decision never sees half of an old catalog and half of a
/// new one.
#[derive(Debug, Clone)]
pub struct SharedCatalog {
    current: Arc<ArcSwap<ProfileCatalog>>,
}

impl SharedCatalog {
    pub fn new(catalog: ProfileCatalog) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(catalog)),
        }
    }

    /// Snapshot of the current catalog.
    pub fn snapshot(&self) -> Arc<ProfileCatalog> {
        self.current.load_full()
    }

    /// Replace the catalog, returning the previous one.
    pub fn replace(&self, catalog: ProfileCatalog) -> Arc<ProfileCatalog> {
        self.current.swap(Arc::new(catalog))
    }
}

impl Default for SharedCatalog {
    fn default() -> Self {
        Self::new(ProfileCatalog::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Capabilities;
    use crate::domain::profile::Profile;

    #[test]
    fn test_snapshot_survives_replace() {
        let shared = SharedCatalog::default();
        let before = shared.snapshot();

        let next = ProfileCatalog::new(Profile::fallback(5, 6).unwrap())
            .with_profile(Profile::new("vip", "vip", 9, 9).unwrap());
        let previous = shared.replace(next);

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.fallback().primary_threshold(), 18);

        let after = shared.snapshot();
        assert_eq!(after.fallback().primary_threshold(), 5);
        assert_eq!(after.resolve(&Capabilities::new().with("vip")).name(), "vip");
    }

    #[test]
    fn test_clones_share_the_catalog() {
        let shared = SharedCatalog::default();
        let clone = shared.clone();

        clone.replace(ProfileCatalog::new(Profile::fallback(2, 2).unwrap()));
        assert_eq!(shared.snapshot().fallback().primary_threshold(), 2);
    }
}
