//! Multi-tenant shells for shellkit
//!
//! A shell is an isolated instance of the application with its own enabled
//! features and its own service provider. This crate orders features by their
//! dependencies, builds each shell once on demand, manages shell lifecycles and
//! resolves which shell an inbound operation belongs to.
//!
//! # Features
//!
//! - **Feature ordering** - dependency-first ordering with cycle and missing-dependency detection
//! - **Shell host** - one build per shell, even under concurrent first access
//! - **Lifecycle** - ordered activation and best-effort deactivation hooks
//! - **Resolution** - path, host, header and fallback strategies in a prioritized chain
//! - **Discovery** - link-time feature registration with `register_shell_feature!`
//!
//! # Quick Start
//!
//! ## 1. Define features
//!
//! ```rust,ignore
//! use shellkit_tenancy::prelude::*;
//!
//! #[derive(Default)]
//! struct PaymentsFeature;
//!
//! impl ShellFeature for PaymentsFeature {
//!     fn configure_services(&self, services: &mut ServiceCollection, settings: &ShellSettings) -> Result<()> {
//!         let currency = settings.property_as::<String>("currency").unwrap_or_else(|| "USD".into());
//!         services.add_singleton(Arc::new(PaymentGateway::new(currency)));
//!         Ok(())
//!     }
//! }
//!
//! register_shell_feature!(PaymentsFeature, "Payments", ["Core"]);
//! ```
//!
//! ## 2. Build and run shells
//!
//! ```
//! use shellkit_tenancy::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let shells = ShellsBuilder::new()
//!     .discover_features()
//!     .with_shells(vec![ShellSettings::new("Acme"), ShellSettings::new("Default")])
//!     .build()
//!     .unwrap();
//! let token = CancellationToken::new();
//! shells.initialize(&token).await.unwrap();
//!
//! let resolver = ShellResolutionBuilder::new()
//!     .map_host("acme.example.com", "Acme")
//!     .use_default_shell()
//!     .build()
//!     .unwrap();
//!
//! let ctx = ResolutionContext::new().with_host("acme.example.com");
//! let shell = shells.shell_for(resolver.as_ref(), &ctx).await.unwrap().unwrap();
//! assert_eq!(shell.id().name(), "Acme");
//!
//! shells.shutdown(&token).await;
//! # });
//! ```

pub mod builder;
pub mod cache;
pub mod features;
pub mod host;
pub mod manager;
pub mod notifications;
pub mod resolution;

pub use builder::{Shells, ShellsBuilder};
pub use cache::{CacheSnapshot, ShellSettingsCache};
pub use features::{FeatureCatalog, FeatureDependencyResolver, FeatureDescriptor, FeatureRegistry, ShellFeature};
pub use host::{RootServices, ShellContext, ShellHost};
pub use manager::ShellManager;
pub use notifications::{
    DeactivationReport, ShellActivated, ShellActivationHandler, ShellAdded, ShellDeactivating,
    ShellDeactivationHandler, ShellRemoved, ShellsReloaded,
};
pub use resolution::{ResolutionContext, ShellResolutionBuilder, ShellResolver, ShellResolverStrategy};

#[doc(hidden)]
pub use inventory;

pub mod prelude {
    pub use crate::register_shell_feature;
    pub use crate::{
        FeatureDescriptor, FeatureRegistry, ResolutionContext, RootServices, ShellContext, ShellFeature,
        ShellManager, ShellResolutionBuilder, ShellResolver, ShellResolverStrategy, Shells, ShellsBuilder,
    };
    pub use shellkit_core::lifecycle::LifecycleServicesExt;
    pub use shellkit_core::{
        CancellationToken, Error, Result, ServiceCollection, ServiceProvider, ShellActivatedHandler,
        ShellDeactivatingHandler, ShellId, ShellSettings,
    };
    pub use std::sync::Arc;
}
