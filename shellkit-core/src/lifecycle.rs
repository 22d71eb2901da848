//! Shell lifecycle hooks
//!
//! Handlers are registered into a shell's [`ServiceCollection`] (either at root
//! level or by a feature) and discovered from the shell's provider when the
//! shell is activated or about to be deactivated.
//!
//! - `ShellActivatedHandler` - called after a shell has been built and added
//! - `ShellDeactivatingHandler` - called before a shell is removed
//!
//! Activation runs in ascending `order`, deactivation in descending `order`.
//! Handlers sharing an order keep their registration order.
//!
//! ## Examples
//!
//! ```
//! use shellkit_core::lifecycle::{LifecycleResult, LifecycleServicesExt, ShellActivatedHandler};
//! use shellkit_core::{CancellationToken, ServiceCollection};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct WarmCache;
//!
//! #[async_trait]
//! impl ShellActivatedHandler for WarmCache {
//!     async fn on_activated(&self, _cancel: &CancellationToken) -> LifecycleResult {
//!         Ok(())
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_activated_handler_with_order(Arc::new(WarmCache), -10);
//! ```

use crate::container::ServiceCollection;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Error type for lifecycle operations
pub type LifecycleResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Hook called once a shell has been activated
#[async_trait]
pub trait ShellActivatedHandler: Send + Sync {
    async fn on_activated(&self, cancel: &CancellationToken) -> LifecycleResult;
}

/// Hook called before a shell is deactivated
#[async_trait]
pub trait ShellDeactivatingHandler: Send + Sync {
    async fn on_deactivating(&self, cancel: &CancellationToken) -> LifecycleResult;
}

/// A lifecycle handler together with its name and priority
pub struct LifecycleRegistration<H: ?Sized> {
    pub name: String,
    pub order: i32,
    pub handler: Arc<H>,
}

impl<H: ?Sized> LifecycleRegistration<H> {
    pub fn new(name: impl Into<String>, order: i32, handler: Arc<H>) -> Self {
        Self {
            name: name.into(),
            order,
            handler,
        }
    }
}

impl<H: ?Sized> Clone for LifecycleRegistration<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            order: self.order,
            handler: self.handler.clone(),
        }
    }
}

impl<H: ?Sized> fmt::Debug for LifecycleRegistration<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleRegistration")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish()
    }
}

pub type ActivatedRegistration = LifecycleRegistration<dyn ShellActivatedHandler>;
pub type DeactivatingRegistration = LifecycleRegistration<dyn ShellDeactivatingHandler>;

/// Registration helpers for lifecycle handlers
pub trait LifecycleServicesExt {
    fn add_activated_handler_with_order<H>(&mut self, handler: Arc<H>, order: i32) -> &mut Self
    where
        H: ShellActivatedHandler + 'static;

    fn add_deactivating_handler_with_order<H>(&mut self, handler: Arc<H>, order: i32) -> &mut Self
    where
        H: ShellDeactivatingHandler + 'static;

    /// Register an activation handler with order 0
    fn add_activated_handler<H>(&mut self, handler: Arc<H>) -> &mut Self
    where
        H: ShellActivatedHandler + 'static,
    {
        self.add_activated_handler_with_order(handler, 0)
    }

    /// Register a deactivation handler with order 0
    fn add_deactivating_handler<H>(&mut self, handler: Arc<H>) -> &mut Self
    where
        H: ShellDeactivatingHandler + 'static,
    {
        self.add_deactivating_handler_with_order(handler, 0)
    }
}

impl LifecycleServicesExt for ServiceCollection {
    fn add_activated_handler_with_order<H>(&mut self, handler: Arc<H>, order: i32) -> &mut Self
    where
        H: ShellActivatedHandler + 'static,
    {
        let handler: Arc<dyn ShellActivatedHandler> = handler;
        let registration = LifecycleRegistration::new(std::any::type_name::<H>(), order, handler);
        self.add_singleton(Arc::new(registration))
    }

    fn add_deactivating_handler_with_order<H>(&mut self, handler: Arc<H>, order: i32) -> &mut Self
    where
        H: ShellDeactivatingHandler + 'static,
    {
        let handler: Arc<dyn ShellDeactivatingHandler> = handler;
        let registration = LifecycleRegistration::new(std::any::type_name::<H>(), order, handler);
        self.add_singleton(Arc::new(registration))
    }
}

/// Sort registrations ascending by order, ties in registration order
pub fn order_for_activation<H: ?Sized>(
    mut registrations: Vec<Arc<LifecycleRegistration<H>>>,
) -> Vec<Arc<LifecycleRegistration<H>>> {
    registrations.sort_by_key(|r| r.order);
    registrations
}

/// Sort registrations descending by order, ties in reverse registration order
///
/// The result is the exact inverse of [`order_for_activation`].
pub fn order_for_deactivation<H: ?Sized>(
    mut registrations: Vec<Arc<LifecycleRegistration<H>>>,
) -> Vec<Arc<LifecycleRegistration<H>>> {
    registrations.reverse();
    registrations.sort_by(|a, b| b.order.cmp(&a.order));
    registrations
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named;

    #[async_trait]
    impl ShellActivatedHandler for Named {
        async fn on_activated(&self, _cancel: &CancellationToken) -> LifecycleResult {
            Ok(())
        }
    }

    #[async_trait]
    impl ShellDeactivatingHandler for Named {
        async fn on_deactivating(&self, _cancel: &CancellationToken) -> LifecycleResult {
            Err("teardown failed".into())
        }
    }

    fn registration(name: &str, order: i32) -> Arc<ActivatedRegistration> {
        Arc::new(LifecycleRegistration::new(name, order, Arc::new(Named) as Arc<dyn ShellActivatedHandler>))
    }

    fn names<H: ?Sized>(registrations: &[Arc<LifecycleRegistration<H>>]) -> Vec<&str> {
        registrations.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_activation_order_is_stable_ascending() {
        let ordered = order_for_activation(vec![
            registration("b0", 0),
            registration("late", 10),
            registration("early", -5),
            registration("c0", 0),
        ]);
        assert_eq!(names(&ordered), vec!["early", "b0", "c0", "late"]);
    }

    #[test]
    fn test_deactivation_order_inverts_activation() {
        let ordered = order_for_deactivation(vec![
            registration("b0", 0),
            registration("late", 10),
            registration("early", -5),
            registration("c0", 0),
        ]);
        assert_eq!(names(&ordered), vec!["late", "c0", "b0", "early"]);
    }

    #[test]
    fn test_default_priority_handlers_tear_down_last_registered_first() {
        let registrations = vec![registration("A", 0), registration("B", 0)];
        let activation = order_for_activation(registrations.clone());
        let deactivation = order_for_deactivation(registrations);

        assert_eq!(names(&activation), vec!["A", "B"]);
        assert_eq!(names(&deactivation), vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_registered_handlers_are_discoverable() {
        let mut services = ServiceCollection::new();
        services
            .add_activated_handler(Arc::new(Named))
            .add_deactivating_handler_with_order(Arc::new(Named), 7);

        let provider = services.build();
        let activated = provider.get_all::<ActivatedRegistration>().unwrap();
        assert_eq!(activated.len(), 1);
        assert_eq!(activated[0].order, 0);
        assert!(activated[0].name.ends_with("Named"));

        let deactivating = provider.get_all::<DeactivatingRegistration>().unwrap();
        assert_eq!(deactivating[0].order, 7);

        let token = CancellationToken::new();
        assert!(activated[0].handler.on_activated(&token).await.is_ok());
        assert!(deactivating[0].handler.on_deactivating(&token).await.is_err());
    }
}
