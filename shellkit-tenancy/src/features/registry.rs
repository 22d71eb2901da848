//! Feature registry
//!
//! Features are registered explicitly with [`FeatureRegistry::register`] or at
//! link time with [`register_shell_feature!`](crate::register_shell_feature),
//! which [`FeatureRegistry::discover`] collects.

use crate::features::{FeatureCatalog, FeatureDescriptor};
use shellkit_core::{Error, Result, ServiceCollection, ShellSettings};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A unit of service registration for a shell
pub trait ShellFeature: Send + Sync {
    /// Register this feature's services into the shell's collection
    fn configure_services(&self, services: &mut ServiceCollection, settings: &ShellSettings) -> Result<()>;

    /// Runs once every enabled feature has configured its services
    fn post_configure_services(&self, _services: &mut ServiceCollection) -> Result<()> {
        Ok(())
    }
}

/// A feature registration collected at link time
pub struct FeatureRegistration {
    pub id: &'static str,
    pub dependencies: &'static [&'static str],
    pub factory: fn() -> Arc<dyn ShellFeature>,
}

inventory::collect!(FeatureRegistration);

impl FeatureRegistration {
    pub fn descriptor(&self) -> FeatureDescriptor {
        FeatureDescriptor::new(self.id).with_dependencies(self.dependencies.iter().copied())
    }
}

#[doc(hidden)]
pub fn default_factory<F: ShellFeature + Default + 'static>() -> Arc<dyn ShellFeature> {
    Arc::new(F::default())
}

/// Register a feature type for [`FeatureRegistry::discover`]
///
/// The type must implement [`ShellFeature`] and `Default`.
///
/// ```ignore
/// register_shell_feature!(PaymentsFeature, "Payments", ["Core"]);
/// ```
#[macro_export]
macro_rules! register_shell_feature {
    ($feature:ty, $id:expr) => {
        $crate::register_shell_feature!($feature, $id, []);
    };
    ($feature:ty, $id:expr, [$($dep:expr),* $(,)?]) => {
        $crate::inventory::submit! {
            $crate::features::FeatureRegistration {
                id: $id,
                dependencies: &[$($dep),*],
                factory: $crate::features::registry::default_factory::<$feature>,
            }
        }
    };
}

struct RegisteredFeature {
    descriptor: FeatureDescriptor,
    feature: Arc<dyn ShellFeature>,
}

/// Every feature available to shells
#[derive(Default)]
pub struct FeatureRegistry {
    features: HashMap<String, RegisteredFeature>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with every link-time registration
    pub fn discover() -> Result<Self> {
        let mut registry = Self::new();
        registry.register_discovered()?;
        Ok(registry)
    }

    /// Add every link-time registration to this registry
    pub fn register_discovered(&mut self) -> Result<&mut Self> {
        for registration in inventory::iter::<FeatureRegistration> {
            self.register(registration.descriptor(), (registration.factory)())?;
        }
        Ok(self)
    }

    /// Register a feature. Ids are unique regardless of case.
    pub fn register<F>(&mut self, descriptor: FeatureDescriptor, feature: Arc<F>) -> Result<&mut Self>
    where
        F: ShellFeature + ?Sized + 'static,
    {
        let key = descriptor.id.to_lowercase();
        if self.features.contains_key(&key) {
            return Err(Error::Configuration(format!(
                "Feature '{}' is registered more than once",
                descriptor.id
            )));
        }

        debug!(feature = %descriptor.id, dependencies = ?descriptor.dependencies, "Registered feature");
        let feature = FeatureHandle(feature).into_dyn();
        self.features.insert(key, RegisteredFeature { descriptor, feature });
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ShellFeature>> {
        self.features.get(&id.to_lowercase()).map(|f| f.feature.clone())
    }

    pub fn descriptor(&self, id: &str) -> Option<&FeatureDescriptor> {
        self.features.get(&id.to_lowercase()).map(|f| &f.descriptor)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.features.contains_key(&id.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Descriptors of every registered feature
    pub fn catalog(&self) -> FeatureCatalog {
        self.features.values().map(|f| f.descriptor.clone()).collect()
    }
}

struct FeatureHandle<F: ?Sized>(Arc<F>);

impl<F: ShellFeature + ?Sized + 'static> FeatureHandle<F> {
    fn into_dyn(self) -> Arc<dyn ShellFeature> {
        Arc::new(self)
    }
}

impl<F: ShellFeature + ?Sized> ShellFeature for FeatureHandle<F> {
    fn configure_services(&self, services: &mut ServiceCollection, settings: &ShellSettings) -> Result<()> {
        self.0.configure_services(services, settings)
    }

    fn post_configure_services(&self, services: &mut ServiceCollection) -> Result<()> {
        self.0.post_configure_services(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct DiscoveredFeature;

    impl ShellFeature for DiscoveredFeature {
        fn configure_services(&self, services: &mut ServiceCollection, _settings: &ShellSettings) -> Result<()> {
            services.add_singleton(Arc::new(String::from("discovered")));
            Ok(())
        }
    }

    crate::register_shell_feature!(DiscoveredFeature, "RegistryTestDiscovered", ["RegistryTestBase"]);
    crate::register_shell_feature!(DiscoveredFeature, "RegistryTestBase");

    #[test]
    fn test_register_and_lookup() {
        let mut registry = FeatureRegistry::new();
        registry
            .register(FeatureDescriptor::new("Core"), Arc::new(DiscoveredFeature))
            .unwrap();

        assert!(registry.contains("core"));
        assert!(registry.get("CORE").is_some());
        assert_eq!(registry.descriptor("Core").map(|d| d.id.as_str()), Some("Core"));
        assert_eq!(registry.catalog().len(), 1);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut registry = FeatureRegistry::new();
        registry
            .register(FeatureDescriptor::new("Core"), Arc::new(DiscoveredFeature))
            .unwrap();

        let err = registry
            .register(FeatureDescriptor::new("CORE"), Arc::new(DiscoveredFeature))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_trait_objects_can_be_registered() {
        let feature: Arc<dyn ShellFeature> = Arc::new(DiscoveredFeature);
        let mut registry = FeatureRegistry::new();
        registry.register(FeatureDescriptor::new("Dyn"), feature).unwrap();

        let mut services = ServiceCollection::new();
        registry
            .get("dyn")
            .unwrap()
            .configure_services(&mut services, &ShellSettings::new("Default"))
            .unwrap();
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn test_discover_collects_link_time_registrations() {
        let registry = FeatureRegistry::discover().unwrap();
        let descriptor = registry.descriptor("RegistryTestDiscovered").unwrap();
        assert_eq!(descriptor.dependencies, vec!["RegistryTestBase"]);
        assert!(registry.contains("RegistryTestBase"));
    }
}
