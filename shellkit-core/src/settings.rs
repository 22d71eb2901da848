//! Shell settings
//!
//! The definition of one tenant: its id, the features it enables and an open
//! bag of properties features may read while registering services.

use crate::shell_id::ShellId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Settings for a single shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellSettings {
    id: ShellId,
    #[serde(default)]
    enabled_features: Vec<String>,
    #[serde(default)]
    properties: HashMap<String, serde_json::Value>,
}

impl ShellSettings {
    /// Create settings for a shell with no features enabled
    ///
    /// # Examples
    ///
    /// ```
    /// use shellkit_core::ShellSettings;
    ///
    /// let settings = ShellSettings::new("acme")
    ///     .with_features(["Core", "Payments"])
    ///     .with_property("currency", "EUR");
    ///
    /// assert!(settings.is_feature_enabled("payments"));
    /// assert_eq!(settings.property_as::<String>("currency").as_deref(), Some("EUR"));
    /// ```
    pub fn new(id: impl Into<ShellId>) -> Self {
        Self {
            id: id.into(),
            enabled_features: Vec::new(),
            properties: HashMap::new(),
        }
    }

    /// Enable a feature. Enabling the same feature twice (in any casing) is a no-op.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        let feature = feature.into();
        if !self.is_feature_enabled(&feature) {
            self.enabled_features.push(feature);
        }
        self
    }

    /// Enable several features, keeping their order.
    pub fn with_features<I, S>(self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        features.into_iter().fold(self, |s, f| s.with_feature(f))
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &ShellId {
        &self.id
    }

    /// Enabled features in declaration order.
    pub fn enabled_features(&self) -> &[String] {
        &self.enabled_features
    }

    pub fn is_feature_enabled(&self, feature: &str) -> bool {
        let feature = feature.to_lowercase();
        self.enabled_features
            .iter()
            .any(|f| f.to_lowercase() == feature)
    }

    pub fn properties(&self) -> &HashMap<String, serde_json::Value> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// Deserialize a property into a concrete type.
    pub fn property_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.properties
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
