//! Wiring for a complete shell runtime
//!
//! [`ShellsBuilder`] assembles the settings cache, host, notification
//! publisher (with the lifecycle handlers subscribed) and manager.

use crate::cache::ShellSettingsCache;
use crate::features::{FeatureDescriptor, FeatureRegistry, ShellFeature};
use crate::host::{RootServices, ShellContext, ShellHost};
use crate::manager::ShellManager;
use crate::notifications::{ShellActivated, ShellActivationHandler, ShellDeactivating, ShellDeactivationHandler};
use crate::resolution::{ResolutionContext, ShellResolver};
use shellkit_config::InMemoryShellSettingsProvider;
use shellkit_core::{CancellationToken, Result, ServiceCollection, ShellSettings, ShellSettingsProvider};
use shellkit_events::{NotificationPublisher, PublishStrategy, PublisherBuilder};
use std::sync::Arc;
use tracing::{debug, info};

/// Builder for [`Shells`]
///
/// # Examples
///
/// ```
/// use shellkit_tenancy::ShellsBuilder;
/// use shellkit_core::{CancellationToken, ShellSettings};
///
/// # tokio_test::block_on(async {
/// let shells = ShellsBuilder::new()
///     .with_shells(vec![ShellSettings::new("Default"), ShellSettings::new("Acme")])
///     .build()
///     .unwrap();
///
/// shells.initialize(&CancellationToken::new()).await.unwrap();
/// let acme = shells.host().get_shell(&"acme".into()).await.unwrap();
/// assert_eq!(acme.id().name(), "Acme");
/// # });
/// ```
pub struct ShellsBuilder {
    root: RootServices,
    features: FeatureRegistry,
    pending: Vec<(FeatureDescriptor, Arc<dyn ShellFeature>)>,
    discover: bool,
    provider: Option<Arc<dyn ShellSettingsProvider>>,
    publisher: PublisherBuilder,
}

impl Default for ShellsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellsBuilder {
    pub fn new() -> Self {
        Self {
            root: RootServices::new(),
            features: FeatureRegistry::new(),
            pending: Vec::new(),
            discover: false,
            provider: None,
            publisher: NotificationPublisher::builder(),
        }
    }

    /// Share an existing root services handle
    pub fn with_root_services(mut self, root: RootServices) -> Self {
        self.root = root;
        self
    }

    /// Add registrations every shell starts from
    pub fn configure_root<F>(self, configure: F) -> Self
    where
        F: FnOnce(&mut ServiceCollection),
    {
        self.root.configure(configure);
        self
    }

    /// Start from a prepared feature registry
    pub fn with_feature_registry(mut self, features: FeatureRegistry) -> Self {
        self.features = features;
        self
    }

    pub fn with_feature<F: ShellFeature + 'static>(mut self, descriptor: FeatureDescriptor, feature: F) -> Self {
        self.pending.push((descriptor, Arc::new(feature)));
        self
    }

    /// Also register features submitted with `register_shell_feature!`
    pub fn discover_features(mut self) -> Self {
        self.discover = true;
        self
    }

    pub fn with_provider<P: ShellSettingsProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn with_shared_provider(mut self, provider: Arc<dyn ShellSettingsProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Serve a fixed list of shells from memory
    pub fn with_shells(self, shells: Vec<ShellSettings>) -> Self {
        self.with_provider(InMemoryShellSettingsProvider::new(shells))
    }

    pub fn publish_strategy(mut self, strategy: PublishStrategy) -> Self {
        self.publisher = self.publisher.strategy(strategy);
        self
    }

    /// Keep publishing after a notification handler fails
    ///
    /// Activation hook failures still fail `add_shell`.
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.publisher = self.publisher.continue_on_error(enabled);
        self
    }

    /// Assemble the runtime. Fails on duplicate feature ids.
    pub fn build(self) -> Result<Shells> {
        let mut features = self.features;
        if self.discover {
            features.register_discovered()?;
        }
        for (descriptor, feature) in self.pending {
            features.register(descriptor, feature)?;
        }

        let provider: Arc<dyn ShellSettingsProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(InMemoryShellSettingsProvider::new(Vec::new())),
        };

        let publisher = self.publisher.build();
        publisher.subscribe::<ShellActivated, _>(ShellActivationHandler);
        publisher.subscribe::<ShellDeactivating, _>(ShellDeactivationHandler);

        let cache = Arc::new(ShellSettingsCache::new());
        let host = Arc::new(ShellHost::new(cache.clone(), Arc::new(features), self.root.clone()));
        let manager = Arc::new(ShellManager::new(host.clone(), publisher.clone(), provider));

        debug!(features = host.features().len(), "Assembled shell runtime");
        Ok(Shells {
            root: self.root,
            cache,
            host,
            publisher,
            manager,
        })
    }
}

/// A running set of shells
#[derive(Clone)]
pub struct Shells {
    root: RootServices,
    cache: Arc<ShellSettingsCache>,
    host: Arc<ShellHost>,
    publisher: NotificationPublisher,
    manager: Arc<ShellManager>,
}

impl Shells {
    pub fn builder() -> ShellsBuilder {
        ShellsBuilder::new()
    }

    pub fn root(&self) -> &RootServices {
        &self.root
    }

    pub fn cache(&self) -> &Arc<ShellSettingsCache> {
        &self.cache
    }

    pub fn host(&self) -> &Arc<ShellHost> {
        &self.host
    }

    pub fn manager(&self) -> &Arc<ShellManager> {
        &self.manager
    }

    /// Subscribe application handlers here
    pub fn publisher(&self) -> &NotificationPublisher {
        &self.publisher
    }

    pub async fn initialize(&self, cancel: &CancellationToken) -> Result<()> {
        self.manager.initialize(cancel).await?;
        info!(shells = self.cache.len(), "Shells ready");
        Ok(())
    }

    pub async fn shutdown(&self, cancel: &CancellationToken) -> usize {
        self.manager.shutdown(cancel).await
    }

    /// Resolve and fetch the shell for an inbound context
    ///
    /// `Ok(None)` when no strategy matched.
    pub async fn shell_for(
        &self,
        resolver: &dyn ShellResolver,
        context: &ResolutionContext,
    ) -> Result<Option<Arc<ShellContext>>> {
        match resolver.resolve(context) {
            Some(id) => self.host.get_shell(&id).await.map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::ShellResolutionBuilder;
    use shellkit_core::{Error, ShellId};
    use tokio_test::{assert_err, assert_ok};

    struct Marker(&'static str);

    struct MarkerFeature(&'static str);

    impl ShellFeature for MarkerFeature {
        fn configure_services(&self, services: &mut ServiceCollection, _settings: &ShellSettings) -> Result<()> {
            services.add_singleton(Arc::new(Marker(self.0)));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_build_and_initialize() {
        let shells = ShellsBuilder::new()
            .configure_root(|s| {
                s.add_singleton(Arc::new(Marker("root")));
            })
            .with_feature(FeatureDescriptor::new("Billing"), MarkerFeature("billing"))
            .with_shells(vec![ShellSettings::new("Acme").with_feature("Billing"), ShellSettings::new("Default")])
            .build()
            .unwrap();
        let token = CancellationToken::new();
        assert_ok!(shells.initialize(&token).await);
        assert_eq!(shells.cache().len(), 2);

        let acme = assert_ok!(shells.host().get_shell(&ShellId::new("acme")).await);
        let markers: Vec<_> = acme
            .services()
            .get_all::<Marker>()
            .unwrap()
            .iter()
            .map(|m| m.0)
            .collect();
        assert_eq!(markers, vec!["root", "billing"]);
        assert!(shells.root().is_sealed());

        assert_eq!(shells.shutdown(&token).await, 1);
    }

    #[tokio::test]
    async fn test_lifecycle_handlers_are_subscribed() {
        let shells = ShellsBuilder::new().build().unwrap();
        assert_eq!(shells.publisher().handler_count::<ShellActivated>(), 1);
        assert_eq!(shells.publisher().handler_count::<ShellDeactivating>(), 1);
    }

    #[tokio::test]
    async fn test_discovered_features_are_registered() {
        let shells = ShellsBuilder::new().discover_features().build().unwrap();
        assert!(shells.host().features().contains("RegistryTestDiscovered"));
    }

    #[test]
    fn test_duplicate_feature_ids_fail() {
        let result = ShellsBuilder::new()
            .with_feature(FeatureDescriptor::new("Billing"), MarkerFeature("a"))
            .with_feature(FeatureDescriptor::new("billing"), MarkerFeature("b"))
            .build();
        assert!(matches!(result.err(), Some(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_shell_for_resolved_context() {
        let shells = ShellsBuilder::new()
            .with_shells(vec![ShellSettings::new("Acme")])
            .build()
            .unwrap();
        let token = CancellationToken::new();
        assert_ok!(shells.initialize(&token).await);

        let resolver = ShellResolutionBuilder::new()
            .map_path("acme", "Acme")
            .map_path("ghost", "Ghost")
            .build()
            .unwrap();

        let found = assert_ok!(
            shells
                .shell_for(resolver.as_ref(), &ResolutionContext::new().with_path("/acme/x"))
                .await
        );
        assert_eq!(found.map(|c| c.id().clone()), Some(ShellId::new("Acme")));

        let unmatched = assert_ok!(
            shells
                .shell_for(resolver.as_ref(), &ResolutionContext::new().with_path("/other"))
                .await
        );
        assert!(unmatched.is_none());

        let err = assert_err!(
            shells
                .shell_for(resolver.as_ref(), &ResolutionContext::new().with_path("/ghost"))
                .await
        );
        assert!(err.is_shell_not_found());
    }
}
