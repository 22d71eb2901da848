// Capability registry: service collection and built service provider

use crate::error::{BoxError, Error, Result};
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

type AnyInstance = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&ServiceProvider) -> Result<AnyInstance> + Send + Sync>;

/// How long a resolved instance lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance per built provider
    Singleton,
    /// One instance per scope (the root provider is its own scope)
    Scoped,
    /// A new instance on every resolution
    Transient,
}

/// A single registration in a [`ServiceCollection`]
#[derive(Clone)]
pub struct ServiceDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    lifetime: Lifetime,
    factory: Factory,
}

impl ServiceDescriptor {
    /// Describe a pre-built instance. Cloning the descriptor shares the instance.
    pub fn instance<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            lifetime: Lifetime::Singleton,
            factory: Arc::new(move |_| Ok(Arc::new(instance.clone()) as AnyInstance)),
        }
    }

    /// Describe a factory-built service with the given lifetime.
    pub fn factory<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> std::result::Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            lifetime,
            factory: Arc::new(move |provider| {
                factory(provider)
                    .map(|instance| Arc::new(instance) as AnyInstance)
                    .map_err(|source| Error::ServiceFactory {
                        service: type_name.to_string(),
                        source,
                    })
            }),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("type_name", &self.type_name)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// An ordered, mutable list of service registrations
///
/// Capability types may be unsized, so trait objects register directly:
///
/// ```
/// use shellkit_core::ServiceCollection;
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<dyn Greeter>(Arc::new(English));
///
/// let provider = services.build();
/// let greeter = provider.resolve::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
#[derive(Clone, Default, Debug)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor as-is
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        trace!(service = descriptor.type_name, lifetime = ?descriptor.lifetime, "Registering service");
        self.descriptors.push(descriptor);
        self
    }

    /// Register a shared instance
    pub fn add_singleton<T: ?Sized + Send + Sync + 'static>(&mut self, instance: Arc<T>) -> &mut Self {
        self.add(ServiceDescriptor::instance(instance))
    }

    /// Register a singleton created on first resolution
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> std::result::Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory(Lifetime::Singleton, factory))
    }

    /// Register a service created once per scope
    pub fn add_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> std::result::Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory(Lifetime::Scoped, factory))
    }

    /// Register a service created on every resolution
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> std::result::Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory(Lifetime::Transient, factory))
    }

    /// Register a shared instance unless the type already has a registration.
    /// Returns whether the instance was added.
    pub fn try_add_singleton<T: ?Sized + Send + Sync + 'static>(&mut self, instance: Arc<T>) -> bool {
        if self.contains::<T>() {
            return false;
        }
        self.add_singleton(instance);
        true
    }

    /// Check if a type has at least one registration
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.descriptors.iter().any(|d| d.type_id == type_id)
    }

    /// Remove every registration for a type. Returns how many were removed.
    pub fn remove_all<T: ?Sized + 'static>(&mut self) -> usize {
        let type_id = TypeId::of::<T>();
        let before = self.descriptors.len();
        self.descriptors.retain(|d| d.type_id != type_id);
        before - self.descriptors.len()
    }

    /// Append copies of every registration in `other`.
    pub fn extend(&mut self, other: &ServiceCollection) -> &mut Self {
        self.descriptors.extend(other.descriptors.iter().cloned());
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.descriptors.iter()
    }

    /// Finalize the registrations into a queryable provider
    pub fn build(self) -> ServiceProvider {
        let mut index: HashMap<TypeId, Vec<usize>> = HashMap::new();
        for (i, descriptor) in self.descriptors.iter().enumerate() {
            index.entry(descriptor.type_id).or_default().push(i);
        }
        let slots = self.descriptors.len();
        debug!(service_count = slots, "Building service provider");

        ServiceProvider {
            root: Arc::new(ProviderRoot {
                singletons: (0..slots).map(|_| OnceCell::new()).collect(),
                descriptors: self.descriptors,
                index,
            }),
            scope: Arc::new((0..slots).map(|_| OnceCell::new()).collect()),
        }
    }
}

struct ProviderRoot {
    descriptors: Vec<ServiceDescriptor>,
    index: HashMap<TypeId, Vec<usize>>,
    singletons: Vec<OnceCell<AnyInstance>>,
}

/// Resolves services from a built [`ServiceCollection`]
///
/// Cloning is cheap and clones share the same singleton and scope state.
#[derive(Clone)]
pub struct ServiceProvider {
    root: Arc<ProviderRoot>,
    scope: Arc<Vec<OnceCell<AnyInstance>>>,
}

impl ServiceProvider {
    /// Resolve the last registration for a type, if any
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>> {
        match self.root.index.get(&TypeId::of::<T>()).and_then(|slots| slots.last()) {
            Some(&slot) => self.instantiate::<T>(slot).map(Some),
            None => Ok(None),
        }
    }

    /// Resolve the last registration for a type, failing when there is none
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        let resolved = self.get::<T>()?;
        match &resolved {
            Some(_) => trace!(service = type_name, "Service resolved"),
            None => debug!(service = type_name, "Service not found in provider"),
        }
        resolved.ok_or_else(|| Error::ServiceNotFound(type_name.to_string()))
    }

    /// Resolve every registration for a type, in registration order
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>> {
        let Some(slots) = self.root.index.get(&TypeId::of::<T>()) else {
            return Ok(Vec::new());
        };
        slots.iter().map(|&slot| self.instantiate::<T>(slot)).collect()
    }

    /// Check if a type has at least one registration
    pub fn has<T: ?Sized + 'static>(&self) -> bool {
        self.root.index.contains_key(&TypeId::of::<T>())
    }

    /// Number of registrations this provider was built from
    pub fn service_count(&self) -> usize {
        self.root.descriptors.len()
    }

    /// Create a child scope sharing singletons but with fresh scoped instances
    pub fn create_scope(&self) -> ServiceProvider {
        let slots = self.root.descriptors.len();
        ServiceProvider {
            root: self.root.clone(),
            scope: Arc::new((0..slots).map(|_| OnceCell::new()).collect()),
        }
    }

    fn instantiate<T: ?Sized + Send + Sync + 'static>(&self, slot: usize) -> Result<Arc<T>> {
        let descriptor = &self.root.descriptors[slot];
        let instance = match descriptor.lifetime {
            Lifetime::Singleton => self.root.singletons[slot]
                .get_or_try_init(|| (descriptor.factory)(self))?
                .clone(),
            Lifetime::Scoped => self.scope[slot]
                .get_or_try_init(|| (descriptor.factory)(self))?
                .clone(),
            Lifetime::Transient => (descriptor.factory)(self)?,
        };

        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| Error::ServiceNotFound(descriptor.type_name.to_string()))
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("service_count", &self.root.descriptors.len())
            .finish()
    }
}
