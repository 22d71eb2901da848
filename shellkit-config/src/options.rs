//! Shell definitions as they appear in configuration
//!
//! ```json
//! {
//!   "Shells": [
//!     { "Name": "Default", "Features": ["Core"] },
//!     { "Name": "Acme", "Features": ["Core", "Payments"], "Properties": { "currency": "EUR" } }
//!   ]
//! }
//! ```

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use shellkit_core::ShellSettings;
use std::collections::HashMap;

/// Section holding the list of shells
pub const SECTION_NAME: &str = "Shells";

/// One shell as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(alias = "Name", default)]
    pub name: String,

    #[serde(alias = "Features", default)]
    pub features: Vec<String>,

    #[serde(alias = "Properties", default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl ShellConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// All configured shells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShellsOptions {
    #[serde(rename = "Shells", alias = "shells", default)]
    pub shells: Vec<ShellConfig>,
}

impl ShellsOptions {
    /// Read the options from a parsed configuration document.
    ///
    /// A document without a `Shells` section yields no shells.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }
}

/// Turns configuration entries into [`ShellSettings`]
pub struct ShellSettingsFactory;

impl ShellSettingsFactory {
    pub fn create(config: &ShellConfig) -> Result<ShellSettings> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(ConfigError::ValidationError(
                "shell name must not be empty".to_string(),
            ));
        }

        let settings = ShellSettings::new(name).with_features(config.features.iter().cloned());
        Ok(config
            .properties
            .iter()
            .fold(settings, |s, (k, v)| s.with_property(k.clone(), v.clone())))
    }

    pub fn create_all(options: &ShellsOptions) -> Result<Vec<ShellSettings>> {
        options.shells.iter().map(Self::create).collect()
    }
}
