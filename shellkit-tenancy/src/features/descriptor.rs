// Feature descriptors and the catalog the dependency resolver walks

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static description of a feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub id: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FeatureDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            metadata: HashMap::new(),
            display_name: None,
            description: None,
        }
    }

    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Display name, falling back to the id
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Feature descriptors keyed case-insensitively by id
#[derive(Debug, Clone, Default)]
pub struct FeatureCatalog {
    features: HashMap<String, FeatureDescriptor>,
}

impl FeatureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor, returning the one it replaced
    pub fn insert(&mut self, descriptor: FeatureDescriptor) -> Option<FeatureDescriptor> {
        self.features.insert(descriptor.id.to_lowercase(), descriptor)
    }

    pub fn get(&self, id: &str) -> Option<&FeatureDescriptor> {
        self.features.get(&id.to_lowercase())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.features.contains_key(&id.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureDescriptor> {
        self.features.values()
    }
}

impl FromIterator<FeatureDescriptor> for FeatureCatalog {
    fn from_iter<I: IntoIterator<Item = FeatureDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.insert(descriptor);
        }
        catalog
    }
}
