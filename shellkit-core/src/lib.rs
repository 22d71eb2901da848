//! Core types for shellkit
//!
//! - [`ShellId`] and [`ShellSettings`] describe a tenant
//! - [`ServiceCollection`] and [`ServiceProvider`] form the capability registry
//! - [`lifecycle`] holds the activation and deactivation hooks
//! - [`ShellSettingsProvider`] abstracts where shell definitions come from

pub mod container;
pub mod error;
pub mod lifecycle;
pub mod provider;
pub mod settings;
pub mod shell_id;

pub use container::{Lifetime, ServiceCollection, ServiceDescriptor, ServiceProvider};
pub use error::{BoxError, Error, Result};
pub use lifecycle::{
    ActivatedRegistration, DeactivatingRegistration, LifecycleRegistration, LifecycleResult,
    LifecycleServicesExt, ShellActivatedHandler, ShellDeactivatingHandler,
};
pub use provider::ShellSettingsProvider;
pub use settings::ShellSettings;
pub use shell_id::{DEFAULT_SHELL_NAME, ShellId};
pub use tokio_util::sync::CancellationToken;
