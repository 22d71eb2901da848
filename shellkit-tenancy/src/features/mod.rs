//! Features: descriptors, the registry and dependency ordering

pub mod descriptor;
pub mod registry;
pub mod resolver;

pub use descriptor::{FeatureCatalog, FeatureDescriptor};
pub use registry::{FeatureRegistration, FeatureRegistry, ShellFeature};
pub use resolver::FeatureDependencyResolver;
