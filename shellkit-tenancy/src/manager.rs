//! Shell lifecycle management
//!
//! [`ShellManager`] adds, removes, updates and reloads shells. Cache mutation
//! and eager builds happen under one async lock; notifications are published
//! after the lock is released so handlers may call back into the manager.

use crate::cache::ShellSettingsCache;
use crate::host::{ShellContext, ShellHost};
use crate::notifications::{ShellActivated, ShellAdded, ShellDeactivating, ShellRemoved, ShellsReloaded};
use shellkit_core::{CancellationToken, Error, Result, ShellId, ShellSettings, ShellSettingsProvider};
use shellkit_events::NotificationPublisher;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub struct ShellManager {
    cache: Arc<ShellSettingsCache>,
    host: Arc<ShellHost>,
    publisher: NotificationPublisher,
    provider: Arc<dyn ShellSettingsProvider>,
    lock: Mutex<()>,
}

impl ShellManager {
    pub fn new(
        host: Arc<ShellHost>,
        publisher: NotificationPublisher,
        provider: Arc<dyn ShellSettingsProvider>,
    ) -> Self {
        Self {
            cache: host.cache().clone(),
            host,
            publisher,
            provider,
            lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<ShellSettingsCache> {
        &self.cache
    }

    pub fn host(&self) -> &Arc<ShellHost> {
        &self.host
    }

    pub fn publisher(&self) -> &NotificationPublisher {
        &self.publisher
    }

    /// Load the initial set of shells from the settings provider
    pub async fn initialize(&self, cancel: &CancellationToken) -> Result<()> {
        info!("Initializing shells");
        self.reload_all_shells(cancel)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to initialize shells"))
    }

    /// Add a shell and build it eagerly
    ///
    /// Fails with [`Error::DuplicateShell`] when the id is already known. If the
    /// build fails the cache is left as it was. An activation failure is
    /// returned after the shell has been added.
    pub async fn add_shell(&self, settings: ShellSettings, cancel: &CancellationToken) -> Result<Arc<ShellContext>> {
        let id = settings.id().clone();

        let context = {
            let _guard = self.lock.lock().await;
            let previous = self.cache.snapshot();
            if previous.get(&id).is_some() {
                return Err(Error::DuplicateShell(id));
            }

            let mut shells = previous.shells().to_vec();
            shells.push(Arc::new(settings.clone()));
            self.cache.load(shells);
            self.host.evict(&id).await;

            match self.host.get_shell(&id).await {
                Ok(context) => context,
                Err(e) => {
                    error!(shell = %id, error = %e, "Failed to build shell; not adding it");
                    self.cache.load(previous.shells().to_vec());
                    self.host.evict(&id).await;
                    return Err(e);
                }
            }
        };

        self.publisher.publish(ShellActivated::new(context.clone()), cancel).await?;
        self.publisher.publish(ShellAdded::new(settings), cancel).await?;
        info!(shell = %id, "Added shell");
        Ok(context)
    }

    /// Deactivate and remove a shell. Unknown ids are not an error.
    pub async fn remove_shell(&self, id: &ShellId, cancel: &CancellationToken) -> Result<()> {
        match self.host.get_shell(id).await {
            Ok(context) => {
                if let Err(e) = self.publisher.publish(ShellDeactivating::new(context), cancel).await {
                    warn!(shell = %id, error = %e, "Deactivation notification failed");
                }
            }
            Err(e) if e.is_shell_not_found() => {
                warn!(shell = %id, "Shell not found; skipping deactivation");
            }
            Err(e) => {
                warn!(shell = %id, error = %e, "Shell could not be built; skipping deactivation");
            }
        }

        {
            let _guard = self.lock.lock().await;
            let remaining: Vec<_> = self
                .cache
                .get_all()
                .into_iter()
                .filter(|s| s.id() != id)
                .collect();
            self.cache.load(remaining);
            self.host.evict(id).await;
        }

        self.publisher.publish(ShellRemoved::new(id.clone()), cancel).await?;
        info!(shell = %id, "Removed shell");
        Ok(())
    }

    /// Replace a shell's settings
    ///
    /// Runs a removal followed by an add, so readers may briefly see the shell
    /// missing.
    pub async fn update_shell(&self, settings: ShellSettings, cancel: &CancellationToken) -> Result<Arc<ShellContext>> {
        debug!(shell = %settings.id(), "Updating shell");
        self.remove_shell(settings.id(), cancel).await?;
        self.add_shell(settings, cancel).await
    }

    /// Replace every shell with the provider's current list
    ///
    /// Built shells that vanished or whose settings changed are evicted and
    /// rebuild on next access. Unchanged shells keep their context.
    pub async fn reload_all_shells(&self, cancel: &CancellationToken) -> Result<()> {
        let shells = self.provider.get_shell_settings(cancel).await?;

        let mut seen = HashSet::new();
        if let Some(duplicate) = shells.iter().find(|s| !seen.insert(s.id().clone())) {
            return Err(Error::DuplicateShell(duplicate.id().clone()));
        }

        {
            let _guard = self.lock.lock().await;
            // Load first so builds starting from here on read the new settings
            self.cache.load(shells.iter().cloned());
            let evicted = self.host.evict_stale().await;
            debug!(shells = shells.len(), evicted = evicted.len(), "Replaced shell settings");
        }

        let count = shells.len();
        self.publisher.publish(ShellsReloaded::new(shells), cancel).await?;
        info!(shells = count, "Reloaded shells");
        Ok(())
    }

    /// Deactivate every built shell and drop them. Returns how many were built.
    pub async fn shutdown(&self, cancel: &CancellationToken) -> usize {
        let built = self.host.built_shells();
        for context in &built {
            if let Err(e) = self.publisher.publish(ShellDeactivating::new(context.clone()), cancel).await {
                warn!(shell = %context.id(), error = %e, "Deactivation notification failed");
            }
        }
        self.host.evict_all().await;
        info!(shells = built.len(), "Shut down shells");
        built.len()
    }
}
