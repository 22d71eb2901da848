//! Tenant settings cache
//!
//! Holds an immutable snapshot of every known shell. Readers clone the
//! current snapshot `Arc`; writers build a new snapshot and swap it in, so a
//! reader sees either the old or the new set and never a mix.

use parking_lot::RwLock;
use shellkit_core::{ShellId, ShellSettings};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One consistent view of the cache
#[derive(Debug, Default)]
pub struct CacheSnapshot {
    shells: Vec<Arc<ShellSettings>>,
    index: HashMap<ShellId, usize>,
}

impl CacheSnapshot {
    fn build<I, S>(shells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<ShellSettings>>,
    {
        let mut snapshot = Self::default();
        for settings in shells {
            let settings = settings.into();
            match snapshot.index.get(settings.id()) {
                // Later definitions replace earlier ones in place
                Some(&position) => snapshot.shells[position] = settings,
                None => {
                    snapshot
                        .index
                        .insert(settings.id().clone(), snapshot.shells.len());
                    snapshot.shells.push(settings);
                }
            }
        }
        snapshot
    }

    pub fn shells(&self) -> &[Arc<ShellSettings>] {
        &self.shells
    }

    pub fn get(&self, id: &ShellId) -> Option<&Arc<ShellSettings>> {
        self.index.get(id).map(|&i| &self.shells[i])
    }

    pub fn len(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }
}

/// Process-wide map of shell id to settings
#[derive(Debug, Default)]
pub struct ShellSettingsCache {
    current: RwLock<Arc<CacheSnapshot>>,
}

impl ShellSettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// All shells in load order
    pub fn get_all(&self) -> Vec<Arc<ShellSettings>> {
        self.snapshot().shells.clone()
    }

    pub fn get_by_id(&self, id: &ShellId) -> Option<Arc<ShellSettings>> {
        self.current.read().get(id).cloned()
    }

    pub fn contains(&self, id: &ShellId) -> bool {
        self.current.read().index.contains_key(id)
    }

    /// Replace the entire contents in one step
    ///
    /// Duplicate ids are not rejected here: the last definition wins.
    pub fn load<I, S>(&self, shells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<ShellSettings>>,
    {
        let snapshot = Arc::new(CacheSnapshot::build(shells));
        debug!(count = snapshot.len(), "Loaded shell settings cache");
        *self.current.write() = snapshot;
    }

    pub fn clear(&self) {
        *self.current.write() = Arc::new(CacheSnapshot::default());
    }

    /// The current snapshot, unaffected by later loads
    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.current.read().clone()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_lookup() {
        let cache = ShellSettingsCache::new();
        assert!(cache.is_empty());

        cache.load([ShellSettings::new("Default"), ShellSettings::new("Acme")]);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&ShellId::new("ACME")));
        assert_eq!(cache.get_by_id(&ShellId::new("acme")).unwrap().id().name(), "Acme");
        assert!(cache.get_by_id(&ShellId::new("Other")).is_none());

        let names: Vec<_> = cache.get_all().iter().map(|s| s.id().to_string()).collect();
        assert_eq!(names, vec!["Default", "Acme"]);
    }

    #[test]
    fn test_load_replaces_everything() {
        let cache = ShellSettingsCache::new();
        cache.load([ShellSettings::new("Old1"), ShellSettings::new("Old2")]);
        cache.load([ShellSettings::new("New")]);

        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(&ShellId::new("Old1")));
    }

    #[test]
    fn test_duplicate_ids_keep_last_definition() {
        let cache = ShellSettingsCache::new();
        cache.load([
            ShellSettings::new("Acme").with_feature("Core"),
            ShellSettings::new("Other"),
            ShellSettings::new("ACME").with_feature("Payments"),
        ]);

        assert_eq!(cache.len(), 2);
        let acme = cache.get_by_id(&ShellId::new("acme")).unwrap();
        assert!(acme.is_feature_enabled("Payments"));
        assert_eq!(cache.get_all()[0].id(), &ShellId::new("acme"));
    }

    #[test]
    fn test_snapshot_is_stable_across_loads() {
        let cache = ShellSettingsCache::new();
        cache.load([ShellSettings::new("A")]);
        let before = cache.snapshot();

        cache.load([ShellSettings::new("B"), ShellSettings::new("C")]);
        assert_eq!(before.len(), 1);
        assert!(before.get(&ShellId::new("A")).is_some());
        assert_eq!(cache.snapshot().len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_settings_are_not_copied() {
        let cache = ShellSettingsCache::new();
        let settings = Arc::new(ShellSettings::new("Acme"));
        cache.load([settings.clone()]);
        assert!(Arc::ptr_eq(&settings, &cache.get_by_id(&ShellId::new("acme")).unwrap()));
    }

    #[test]
    fn test_concurrent_readers_see_whole_sets() {
        let cache = Arc::new(ShellSettingsCache::new());
        let old: Vec<_> = (0..20).map(|i| ShellSettings::new(format!("old-{i}"))).collect();
        let new: Vec<_> = (0..30).map(|i| ShellSettings::new(format!("new-{i}"))).collect();
        cache.load(old.clone());

        let reader = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    let all = cache.get_all();
                    let olds = all.iter().filter(|s| s.id().name().starts_with("old")).count();
                    assert!(
                        (olds == 20 && all.len() == 20) || (olds == 0 && all.len() == 30),
                        "mixed snapshot: {} entries, {} old",
                        all.len(),
                        olds
                    );
                }
            })
        };

        for round in 0..200 {
            if round % 2 == 0 {
                cache.load(new.clone());
            } else {
                cache.load(old.clone());
            }
        }
        reader.join().unwrap();
    }
}
