use std::{
    sync::{Arc, PoisonError, RwLock},
    time::SystemTime,
};
use valwatch_common::{Snapshot, Summary};

/// One successful cycle's snapshot together with the time it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSnapshot {
    pub snapshot: Snapshot,
    pub last_updated: SystemTime,
}

impl CachedSnapshot {
    pub fn summary(&self) -> Summary {
        self.snapshot.summary()
    }
}

/// Shared handle to the latest snapshot.
///
/// Clones share the same state. Readers copy an `Arc` under a read lock and never hold the
/// lock while using the snapshot; the poll loop swaps in a new `Arc` on every successful cycle,
/// so a reader always sees a snapshot and summary from the same cycle.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    current: Arc<RwLock<Option<Arc<CachedSnapshot>>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first successful cycle.
    pub fn get(&self) -> Option<Arc<CachedSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_updated(&self) -> Option<SystemTime> {
        self.get().map(|cached| cached.last_updated)
    }

    pub fn replace(&self, snapshot: Snapshot, last_updated: SystemTime) -> Arc<CachedSnapshot> {
        let new = Arc::new(CachedSnapshot {
            snapshot,
            last_updated,
        });
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(new.clone());
        new
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::BTreeMap, time::Duration};
    use valwatch_common::{BondStatus, ValidatorSnapshotEntry};

    fn snapshot_with(count: usize) -> Snapshot {
        let validators = (0..count)
            .map(|i| {
                (
                    format!("valoper{i}"),
                    ValidatorSnapshotEntry {
                        moniker: format!("node{i}"),
                        uptime_percent: 99.0,
                        status: BondStatus::Bonded,
                        jailed: false,
                        commission: 0.05,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        Snapshot::new(validators)
    }

    #[test]
    fn empty_before_first_replace() {
        let cache = SnapshotCache::new();
        assert!(cache.get().is_none());
        assert!(cache.last_updated().is_none());
    }

    #[test]
    fn clones_observe_replacements() {
        let cache = SnapshotCache::new();
        let reader = cache.clone();
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(60);

        cache.replace(snapshot_with(2), at);

        let cached = reader.get();
        assert_eq!(cached.as_ref().map(|c| c.summary().total), Some(2));
        assert_eq!(reader.last_updated(), Some(at));
    }

    #[test]
    fn readers_keep_their_snapshot_across_replacements() {
        let cache = SnapshotCache::new();
        cache.replace(snapshot_with(1), SystemTime::UNIX_EPOCH);
        let held = cache.get();

        cache.replace(snapshot_with(3), SystemTime::UNIX_EPOCH + Duration::from_secs(240));

        assert_eq!(held.map(|c| c.snapshot.len()), Some(1));
        assert_eq!(cache.get().map(|c| c.summary().active), Some(3));
    }

    #[test]
    fn concurrent_readers_never_see_torn_state() {
        let cache = SnapshotCache::new();
        cache.replace(snapshot_with(1), SystemTime::UNIX_EPOCH);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        if let Some(cached) = cache.get() {
                            let summary = cached.summary();
                            assert_eq!(summary.total, cached.snapshot.len());
                            assert_eq!(summary.active + summary.inactive, summary.total);
                        }
                    }
                })
            })
            .collect();

        for count in 2..50 {
            cache.replace(snapshot_with(count), SystemTime::now());
        }
        for reader in readers {
            assert!(reader.join().is_ok());
        }
    }
}
