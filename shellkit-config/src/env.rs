// Environment variable lookup

use crate::{ConfigError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Default prefix for shellkit variables
pub const DEFAULT_PREFIX: &str = "SHELLKIT";

/// Variable (after the prefix) naming the shells configuration file
pub const CONFIG_KEY: &str = "CONFIG";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Loader using the `SHELLKIT_` prefix
    pub fn shellkit() -> Self {
        Self::new(Some(DEFAULT_PREFIX.to_string()))
    }

    /// Full variable name for a key
    pub fn var_name(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        env::var(self.var_name(key)).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Path of the shells configuration file (`<PREFIX>_CONFIG`)
    pub fn config_path(&self) -> Result<PathBuf> {
        self.load_var(CONFIG_KEY).map(PathBuf::from).map_err(|_| {
            ConfigError::LoadError(format!("{} is not set", self.var_name(CONFIG_KEY)))
        })
    }

    /// Load variables from a `.env` file into the process environment.
    ///
    /// A missing default `.env` is ignored; an explicit path must exist.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Ok(())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::shellkit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // std::env::set_var is unsafe, so these tests only read variables.

    #[test]
    fn test_var_name_uses_prefix() {
        assert_eq!(EnvLoader::shellkit().var_name("config"), "SHELLKIT_CONFIG");
        assert_eq!(EnvLoader::new(None).var_name("path"), "PATH");
    }

    #[test]
    fn test_load_var_with_default() {
        let loader = EnvLoader::new(Some("SHELLKIT_TEST".to_string()));
        assert_eq!(loader.load_var_or("NONEXISTENT_12345", "fallback"), "fallback");
        assert!(loader.load_var("NONEXISTENT_67890").is_err());
    }

    #[test]
    fn test_config_path_missing() {
        let loader = EnvLoader::new(Some("SHELLKIT_UNSET_PREFIX_4242".to_string()));
        let err = loader.config_path().unwrap_err();
        assert!(err.to_string().contains("SHELLKIT_UNSET_PREFIX_4242_CONFIG"));
    }

    #[test]
    fn test_missing_explicit_dotenv_file() {
        let loader = EnvLoader::shellkit();
        assert!(loader.load_dotenv(Some(Path::new("/nonexistent/shellkit/.env"))).is_err());
    }
}
