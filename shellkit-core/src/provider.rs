// Source of shell definitions

use crate::error::Result;
use crate::settings::ShellSettings;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Supplies the full list of shell definitions
///
/// Called on initial load and on every reload. Implementations should observe
/// the cancellation token and return [`Error::Cancelled`](crate::Error::Cancelled)
/// when it fires.
#[async_trait]
pub trait ShellSettingsProvider: Send + Sync {
    async fn get_shell_settings(&self, cancel: &CancellationToken) -> Result<Vec<ShellSettings>>;
}
