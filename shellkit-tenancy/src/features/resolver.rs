//! Feature dependency ordering
//!
//! Depth-first post-order walk over the catalog. A feature is emitted once,
//! after every feature it depends on, and siblings keep declaration order, so
//! the result is deterministic for a fixed catalog and root order.

use crate::features::FeatureCatalog;
use shellkit_core::{Error, Result};
use std::collections::HashSet;
use tracing::trace;

/// Orders features so that every dependency precedes its dependents
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDependencyResolver;

#[derive(Default)]
struct Traversal {
    visiting: Vec<String>,
    emitted: HashSet<String>,
    order: Vec<String>,
}

impl FeatureDependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Transitive dependencies of `feature` in dependency order, excluding the feature itself
    pub fn resolve_dependencies(&self, feature: &str, catalog: &FeatureCatalog) -> Result<Vec<String>> {
        let mut traversal = Traversal::default();
        self.visit(feature, None, catalog, &mut traversal)?;
        traversal.order.pop();
        Ok(traversal.order)
    }

    /// The roots and all of their transitive dependencies in dependency order
    ///
    /// # Examples
    ///
    /// ```
    /// use shellkit_tenancy::features::{FeatureCatalog, FeatureDependencyResolver, FeatureDescriptor};
    ///
    /// let catalog: FeatureCatalog = [
    ///     FeatureDescriptor::new("Core"),
    ///     FeatureDescriptor::new("Payments").with_dependency("Core"),
    /// ]
    /// .into_iter()
    /// .collect();
    ///
    /// let ordered = FeatureDependencyResolver::new()
    ///     .get_ordered_features(["Payments"], &catalog)
    ///     .unwrap();
    /// assert_eq!(ordered, vec!["Core", "Payments"]);
    /// ```
    pub fn get_ordered_features<I, S>(&self, roots: I, catalog: &FeatureCatalog) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut traversal = Traversal::default();
        for root in roots {
            self.visit(root.as_ref(), None, catalog, &mut traversal)?;
        }
        trace!(order = ?traversal.order, "Ordered features");
        Ok(traversal.order)
    }

    fn visit(
        &self,
        id: &str,
        dependent: Option<&str>,
        catalog: &FeatureCatalog,
        traversal: &mut Traversal,
    ) -> Result<()> {
        let key = id.to_lowercase();
        if traversal.emitted.contains(&key) {
            return Ok(());
        }

        let descriptor = catalog.get(id).ok_or_else(|| Error::FeatureNotFound {
            feature: id.to_string(),
            dependent: dependent.map(str::to_string),
        })?;

        if let Some(start) = traversal
            .visiting
            .iter()
            .position(|v| v.to_lowercase() == key)
        {
            let mut path = traversal.visiting[start..].to_vec();
            path.push(descriptor.id.clone());
            return Err(Error::DependencyCycle {
                feature: descriptor.id.clone(),
                path,
            });
        }

        traversal.visiting.push(descriptor.id.clone());
        for dependency in &descriptor.dependencies {
            self.visit(dependency, Some(&descriptor.id), catalog, traversal)?;
        }
        traversal.visiting.pop();

        traversal.emitted.insert(key);
        traversal.order.push(descriptor.id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureDescriptor;

    fn catalog(edges: &[(&str, &[&str])]) -> FeatureCatalog {
        edges
            .iter()
            .map(|(id, deps)| FeatureDescriptor::new(*id).with_dependencies(deps.iter().copied()))
            .collect()
    }

    fn index_of(order: &[String], id: &str) -> usize {
        order.iter().position(|f| f == id).unwrap()
    }

    #[test]
    fn test_diamond_emits_shared_dependency_once() {
        let catalog = catalog(&[("A", &["B", "C"]), ("B", &["D"]), ("C", &["D"]), ("D", &[])]);
        let order = FeatureDependencyResolver::new()
            .get_ordered_features(["A"], &catalog)
            .unwrap();

        assert_eq!(order, vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn test_every_edge_is_respected() {
        let edges: &[(&str, &[&str])] = &[
            ("Web", &["Auth", "Logging"]),
            ("Auth", &["Storage", "Logging"]),
            ("Reports", &["Storage", "Web"]),
            ("Storage", &["Logging"]),
            ("Logging", &[]),
        ];
        let catalog = catalog(edges);
        let order = FeatureDependencyResolver::new()
            .get_ordered_features(["Reports", "Web"], &catalog)
            .unwrap();

        assert_eq!(order.len(), 5);
        for (dependent, deps) in edges {
            for dep in *deps {
                assert!(index_of(&order, dep) < index_of(&order, dependent), "{dep} before {dependent}");
            }
        }
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let catalog = catalog(&[("A", &["C", "B"]), ("B", &[]), ("C", &[]), ("E", &["B"])]);
        let resolver = FeatureDependencyResolver::new();
        let first = resolver.get_ordered_features(["E", "A"], &catalog).unwrap();
        let second = resolver.get_ordered_features(["E", "A"], &catalog).unwrap();

        assert_eq!(first, vec!["B", "E", "C", "A"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_lookup_is_case_insensitive_and_keeps_declared_ids() {
        let catalog = catalog(&[("Payments", &["core"]), ("Core", &[])]);
        let order = FeatureDependencyResolver::new()
            .get_ordered_features(["PAYMENTS", "core"], &catalog)
            .unwrap();

        assert_eq!(order, vec!["Core", "Payments"]);
    }

    #[test]
    fn test_resolve_dependencies_excludes_feature() {
        let catalog = catalog(&[("A", &["B"]), ("B", &["C"]), ("C", &[])]);
        let resolver = FeatureDependencyResolver::new();

        assert_eq!(resolver.resolve_dependencies("A", &catalog).unwrap(), vec!["C", "B"]);
        assert!(resolver.resolve_dependencies("C", &catalog).unwrap().is_empty());
    }

    #[test]
    fn test_cycles_are_detected_from_any_start() {
        let resolver = FeatureDependencyResolver::new();

        let direct = catalog(&[("A", &["B"]), ("B", &["A"])]);
        for start in ["A", "B"] {
            let err = resolver.get_ordered_features([start], &direct).unwrap_err();
            assert!(matches!(err, Error::DependencyCycle { .. }));
            assert!(err.to_string().contains("Circular dependency"));
        }

        let indirect = catalog(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"]), ("Root", &["B"])]);
        let err = resolver.get_ordered_features(["Root"], &indirect).unwrap_err();
        match err {
            Error::DependencyCycle { feature, path } => {
                assert!(["A", "B", "C"].contains(&feature.as_str()));
                assert_eq!(path.first(), path.last());
            }
            other => panic!("unexpected error: {other}"),
        }

        let self_ref = catalog(&[("A", &["A"])]);
        let err = resolver.get_ordered_features(["A"], &self_ref).unwrap_err();
        assert!(err.to_string().contains("'A'"));
    }

    #[test]
    fn test_missing_dependency_names_id_and_dependent() {
        let catalog = catalog(&[("A", &["B"]), ("B", &["Ghost-Feature"])]);
        let err = FeatureDependencyResolver::new()
            .get_ordered_features(["A"], &catalog)
            .unwrap_err();

        assert!(err.to_string().contains("Ghost-Feature"));
        assert!(matches!(
            err,
            Error::FeatureNotFound { dependent: Some(ref d), .. } if d == "B"
        ));
    }

    #[test]
    fn test_missing_root_has_no_dependent() {
        let err = FeatureDependencyResolver::new()
            .get_ordered_features(["Nope"], &FeatureCatalog::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Feature 'Nope' not found.");
    }
}
