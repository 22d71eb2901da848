// Shellkit - multi-tenant shells for Rust
//
// Each shell is an isolated instance of the application with its own enabled
// features and service provider, selected per inbound operation by a resolver
// chain.

// Re-export the member crates
pub use shellkit_config;
pub use shellkit_core;
pub use shellkit_events;
pub use shellkit_tenancy;

#[cfg(feature = "log")]
pub use shellkit_log;

pub use shellkit_core::{
    BoxError, CancellationToken, Error, Lifetime, Result, ServiceCollection, ServiceProvider, ShellId,
    ShellSettings, ShellSettingsProvider,
};
pub use shellkit_tenancy::register_shell_feature;

// Prelude for common imports
pub mod prelude {
    pub use shellkit_config::{FileShellSettingsProvider, InMemoryShellSettingsProvider, ShellConfig, ShellsOptions};
    pub use shellkit_events::{Notification, NotificationHandler, NotificationPublisher};
    pub use shellkit_tenancy::notifications::{ShellAdded, ShellRemoved, ShellsReloaded};
    pub use shellkit_tenancy::prelude::*;
}
