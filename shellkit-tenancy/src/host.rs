//! Shell hosting
//!
//! [`ShellHost`] builds a shell's [`ShellContext`] the first time it is asked
//! for and serves the cached instance afterwards. Concurrent requests for the
//! same uncached shell share a single build; reads of built shells never wait
//! on a build.
//!
//! A build runs these steps and fails as a whole:
//!
//! 1. Look up the shell's settings in the [`ShellSettingsCache`]
//! 2. Order the enabled features and their dependencies
//! 3. Copy the root registrations into a fresh [`ServiceCollection`]
//! 4. Register the shell's `Arc<ShellSettings>` and `ShellId`
//! 5. Run each feature's `configure_services` in dependency order
//! 6. Run each feature's `post_configure_services` in the same order
//! 7. Build the provider and cache the context

use crate::cache::ShellSettingsCache;
use crate::features::{FeatureDependencyResolver, FeatureRegistry, ShellFeature};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use shellkit_core::{Error, Result, ServiceCollection, ServiceProvider, ShellId, ShellSettings};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// A built shell: its settings and its service provider
pub struct ShellContext {
    id: ShellId,
    settings: Arc<ShellSettings>,
    services: ServiceProvider,
}

impl ShellContext {
    pub fn new(settings: Arc<ShellSettings>, services: ServiceProvider) -> Self {
        Self {
            id: settings.id().clone(),
            settings,
            services,
        }
    }

    pub fn id(&self) -> &ShellId {
        &self.id
    }

    pub fn settings(&self) -> &Arc<ShellSettings> {
        &self.settings
    }

    pub fn services(&self) -> &ServiceProvider {
        &self.services
    }
}

impl fmt::Debug for ShellContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellContext")
            .field("id", &self.id)
            .field("features", &self.settings.enabled_features())
            .field("services", &self.services)
            .finish()
    }
}

/// Root-level registrations shared by every shell
///
/// The host copies these once, when it builds its first shell. Registrations
/// added after that point are not seen by any shell.
#[derive(Clone, Default)]
pub struct RootServices {
    services: Arc<RwLock<ServiceCollection>>,
    sealed: Arc<AtomicBool>,
}

impl RootServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_collection(services: ServiceCollection) -> Self {
        Self {
            services: Arc::new(RwLock::new(services)),
            sealed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add or change root registrations
    pub fn configure<F>(&self, configure: F)
    where
        F: FnOnce(&mut ServiceCollection),
    {
        if self.is_sealed() {
            warn!("Root services changed after the first shell was built; existing snapshot is kept");
        }
        configure(&mut self.services.write());
    }

    /// Whether a host has already taken its snapshot
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    fn snapshot(&self) -> ServiceCollection {
        let snapshot = self.services.read().clone();
        self.sealed.store(true, Ordering::Release);
        snapshot
    }
}

/// Builds and caches shell contexts
pub struct ShellHost {
    cache: Arc<ShellSettingsCache>,
    features: Arc<FeatureRegistry>,
    resolver: FeatureDependencyResolver,
    root: RootServices,
    root_snapshot: OnceCell<ServiceCollection>,
    shells: RwLock<HashMap<ShellId, Arc<ShellContext>>>,
    build_locks: Mutex<HashMap<ShellId, Arc<tokio::sync::Mutex<()>>>>,
    builds: AtomicUsize,
}

impl ShellHost {
    pub fn new(cache: Arc<ShellSettingsCache>, features: Arc<FeatureRegistry>, root: RootServices) -> Self {
        Self {
            cache,
            features,
            resolver: FeatureDependencyResolver::new(),
            root,
            root_snapshot: OnceCell::new(),
            shells: RwLock::new(HashMap::new()),
            build_locks: Mutex::new(HashMap::new()),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn cache(&self) -> &Arc<ShellSettingsCache> {
        &self.cache
    }

    pub fn features(&self) -> &Arc<FeatureRegistry> {
        &self.features
    }

    /// Get a shell, building it on first access
    pub async fn get_shell(&self, id: &ShellId) -> Result<Arc<ShellContext>> {
        if let Some(context) = self.built(id) {
            return Ok(context);
        }
        if !self.cache.contains(id) {
            return Err(Error::ShellNotFound(id.clone()));
        }

        let lease = self.build_lock(id);
        let _guard = lease.lock.lock().await;

        // Another caller may have finished the build while we waited
        if let Some(context) = self.built(id) {
            return Ok(context);
        }

        let context = Arc::new(self.build(id)?);
        self.shells.write().insert(id.clone(), context.clone());
        Ok(context)
    }

    /// The `Default` shell
    pub async fn get_default_shell(&self) -> Result<Arc<ShellContext>> {
        self.get_shell(&ShellId::default_shell()).await
    }

    /// Every shell in the settings cache, building those not yet built
    pub async fn get_all_shells(&self) -> Result<Vec<Arc<ShellContext>>> {
        let mut contexts = Vec::new();
        for settings in self.cache.get_all() {
            contexts.push(self.get_shell(settings.id()).await?);
        }
        Ok(contexts)
    }

    /// Shells already built, ordered by name
    pub fn built_shells(&self) -> Vec<Arc<ShellContext>> {
        let mut contexts: Vec<_> = self.shells.read().values().cloned().collect();
        contexts.sort_by_key(|c| c.id().name().to_lowercase());
        contexts
    }

    pub fn is_built(&self, id: &ShellId) -> bool {
        self.shells.read().contains_key(id)
    }

    /// Number of builds that completed successfully
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Drop a built shell so the next request rebuilds it
    ///
    /// Waits for an in-flight build of the same shell to finish first.
    pub async fn evict(&self, id: &ShellId) -> Option<Arc<ShellContext>> {
        let lease = self.build_lock(id);
        let _guard = lease.lock.lock().await;
        let evicted = self.shells.write().remove(id);
        if evicted.is_some() {
            debug!(shell = %id, "Evicted shell context");
        }
        evicted
    }

    /// Drop every built shell
    pub async fn evict_all(&self) -> Vec<Arc<ShellContext>> {
        let ids: Vec<ShellId> = self.shells.read().keys().cloned().collect();
        let mut evicted = Vec::new();
        for id in ids {
            evicted.extend(self.evict(&id).await);
        }
        evicted
    }

    /// Drop built shells whose settings are gone from the cache or differ
    /// from the cached ones
    ///
    /// Builds in flight when this is called are waited for and checked too.
    pub async fn evict_stale(&self) -> Vec<Arc<ShellContext>> {
        let mut ids: Vec<ShellId> = self.shells.read().keys().cloned().collect();
        ids.extend(self.build_locks.lock().keys().cloned());
        ids.sort_by_key(|id| id.name().to_lowercase());
        ids.dedup();

        let mut evicted = Vec::new();
        for id in ids {
            let lease = self.build_lock(&id);
            let _guard = lease.lock.lock().await;
            let stale = self.built(&id).is_some_and(|context| {
                self.cache
                    .get_by_id(&id)
                    .is_none_or(|current| *current != **context.settings())
            });
            if stale {
                evicted.extend(self.shells.write().remove(&id));
                debug!(shell = %id, "Evicted stale shell context");
            }
        }
        evicted
    }

    /// Number of build locks currently held or waited on
    pub fn pending_builds(&self) -> usize {
        self.build_locks.lock().len()
    }

    fn built(&self, id: &ShellId) -> Option<Arc<ShellContext>> {
        self.shells.read().get(id).cloned()
    }

    fn build_lock(&self, id: &ShellId) -> BuildLease<'_> {
        let lock = self
            .build_locks
            .lock()
            .entry(id.clone())
            .or_default()
            .clone();
        BuildLease {
            host: self,
            id: id.clone(),
            lock,
        }
    }

    fn root_snapshot(&self) -> &ServiceCollection {
        self.root_snapshot.get_or_init(|| {
            let snapshot = self.root.snapshot();
            debug!(registrations = snapshot.len(), "Captured root service snapshot");
            snapshot
        })
    }

    fn build(&self, id: &ShellId) -> Result<ShellContext> {
        let settings = self
            .cache
            .get_by_id(id)
            .ok_or_else(|| Error::ShellNotFound(id.clone()))?;

        let catalog = self.features.catalog();
        let ordered = self
            .resolver
            .get_ordered_features(settings.enabled_features(), &catalog)?;

        let features = ordered
            .iter()
            .map(|feature_id| {
                self.features
                    .get(feature_id)
                    .map(|feature| (feature_id.as_str(), feature))
                    .ok_or_else(|| Error::FeatureNotFound {
                        feature: feature_id.clone(),
                        dependent: None,
                    })
            })
            .collect::<Result<Vec<(&str, Arc<dyn ShellFeature>)>>>()?;

        let mut services = self.root_snapshot().clone();
        services.add_singleton(settings.clone());
        services.add_singleton(Arc::new(settings.id().clone()));

        for (feature_id, feature) in &features {
            feature
                .configure_services(&mut services, &settings)
                .map_err(|e| Error::feature_configuration(*feature_id, e))?;
        }
        for (feature_id, feature) in &features {
            feature
                .post_configure_services(&mut services)
                .map_err(|e| Error::feature_configuration(*feature_id, e))?;
        }

        let context = ShellContext::new(settings, services.build());
        self.builds.fetch_add(1, Ordering::SeqCst);
        info!(shell = %id, features = ?ordered, "Built shell");
        Ok(context)
    }
}

/// A shell's build lock, removed from the host once nobody holds it
struct BuildLease<'a> {
    host: &'a ShellHost,
    id: ShellId,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for BuildLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.host.build_locks.lock();
        // The map and this lease are the only owners
        let idle = locks
            .get(&self.id)
            .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(&self.lock) == 2);
        if idle {
            locks.remove(&self.id);
        }
    }
}
