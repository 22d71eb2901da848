// Shell settings providers

use crate::env::EnvLoader;
use crate::loader::ConfigLoader;
use crate::options::{ShellSettingsFactory, ShellsOptions};
use async_trait::async_trait;
use shellkit_core::{CancellationToken, Error, ShellSettings, ShellSettingsProvider};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serves a fixed list of shells defined in code
#[derive(Debug, Clone, Default)]
pub struct InMemoryShellSettingsProvider {
    shells: Vec<ShellSettings>,
}

impl InMemoryShellSettingsProvider {
    pub fn new(shells: Vec<ShellSettings>) -> Self {
        Self { shells }
    }

    pub fn with_shell(mut self, settings: ShellSettings) -> Self {
        self.shells.push(settings);
        self
    }
}

#[async_trait]
impl ShellSettingsProvider for InMemoryShellSettingsProvider {
    async fn get_shell_settings(&self, cancel: &CancellationToken) -> shellkit_core::Result<Vec<ShellSettings>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(self.shells.clone())
    }
}

/// Reads shells from a JSON or TOML file
///
/// The file is read again on every call so a reload picks up edits.
#[derive(Debug, Clone)]
pub struct FileShellSettingsProvider {
    path: PathBuf,
}

impl FileShellSettingsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the file through `SHELLKIT_CONFIG`
    pub fn from_env() -> crate::Result<Self> {
        EnvLoader::shellkit().config_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> crate::Result<Vec<ShellSettings>> {
        let loader = ConfigLoader::auto(&self.path)?;
        let document = loader.load_file(&self.path).await?;
        let options = ShellsOptions::from_value(document)?;
        ShellSettingsFactory::create_all(&options)
    }
}

#[async_trait]
impl ShellSettingsProvider for FileShellSettingsProvider {
    async fn get_shell_settings(&self, cancel: &CancellationToken) -> shellkit_core::Result<Vec<ShellSettings>> {
        let shells = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            loaded = self.load() => loaded?,
        };
        debug!(path = %self.path.display(), count = shells.len(), "Loaded shell settings");
        Ok(shells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellkit_core::ShellId;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_in_memory_provider() {
        let provider = InMemoryShellSettingsProvider::default()
            .with_shell(ShellSettings::new("Default"))
            .with_shell(ShellSettings::new("Acme"));

        let shells = assert_ok!(provider.get_shell_settings(&CancellationToken::new()).await);
        assert_eq!(shells.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_token_is_honoured() {
        let token = CancellationToken::new();
        token.cancel();

        let provider = InMemoryShellSettingsProvider::new(vec![ShellSettings::new("Default")]);
        let err = assert_err!(provider.get_shell_settings(&token).await);
        assert!(matches!(err, Error::Cancelled));

        let file = write_file(".json", r#"{"Shells": []}"#);
        let provider = FileShellSettingsProvider::new(file.path());
        let err = assert_err!(provider.get_shell_settings(&token).await);
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn test_json_file_provider() {
        let file = write_file(
            ".json",
            r#"{"Shells": [{"Name": "Acme", "Features": ["Core"], "Properties": {"tier": "gold"}}]}"#,
        );

        let provider = FileShellSettingsProvider::new(file.path());
        let shells = assert_ok!(provider.get_shell_settings(&CancellationToken::new()).await);
        assert_eq!(shells.len(), 1);
        assert_eq!(shells[0].id(), &ShellId::new("acme"));
        assert_eq!(shells[0].property_as::<String>("tier").as_deref(), Some("gold"));
    }

    #[tokio::test]
    async fn test_toml_file_provider() {
        let file = write_file(
            ".toml",
            r#"
            [[Shells]]
            Name = "Default"
            Features = ["Core"]

            [[Shells]]
            Name = "Acme"
            Features = ["Core", "Payments"]
            "#,
        );

        let provider = FileShellSettingsProvider::new(file.path());
        let shells = assert_ok!(provider.get_shell_settings(&CancellationToken::new()).await);
        assert_eq!(shells.len(), 2);
        assert!(shells[1].is_feature_enabled("Payments"));
    }

    #[tokio::test]
    async fn test_file_errors_surface_as_settings_errors() {
        let provider = FileShellSettingsProvider::new("/nonexistent/shells.json");
        let err = assert_err!(provider.get_shell_settings(&CancellationToken::new()).await);
        assert!(matches!(err, Error::Settings(_)));

        let file = write_file(".json", r#"{"Shells": [{"Name": ""}]}"#);
        let provider = FileShellSettingsProvider::new(file.path());
        let err = assert_err!(provider.get_shell_settings(&CancellationToken::new()).await);
        assert!(matches!(err, Error::Settings(msg) if msg.contains("empty")));
    }
}
