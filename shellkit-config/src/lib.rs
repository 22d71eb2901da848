// Shell configuration for shellkit

pub mod env;
pub mod error;
pub mod loader;
pub mod options;
pub mod providers;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use options::{SECTION_NAME, ShellConfig, ShellSettingsFactory, ShellsOptions};
pub use providers::{FileShellSettingsProvider, InMemoryShellSettingsProvider};
