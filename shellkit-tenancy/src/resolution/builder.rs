//! Fluent construction of a resolver chain

use super::resolver::{DEFAULT_ORDER, DefaultShellResolver, FALLBACK_ORDER, ShellResolver, StrategyRegistration};
use super::strategy::{
    DefaultShellResolverStrategy, FixedShellResolver, HeaderShellResolver, HostShellResolver, PathShellResolver,
    ShellResolverStrategy,
};
use shellkit_core::{Error, Result, ShellId};
use std::sync::Arc;
use tracing::debug;

enum Slot {
    Strategy(StrategyRegistration),
    Paths(i32),
    Hosts(i32),
}

/// Builds a [`ShellResolver`] from path maps, host maps, header lookups,
/// fixed fallbacks and custom strategies
///
/// # Examples
///
/// ```
/// use shellkit_tenancy::resolution::{ResolutionContext, ShellResolutionBuilder, ShellResolver};
/// use shellkit_core::ShellId;
///
/// let resolver = ShellResolutionBuilder::new()
///     .map_path("acme", "AcmeShell")
///     .map_host("globex.example.com", "Globex")
///     .use_default_shell()
///     .build()
///     .unwrap();
///
/// let ctx = ResolutionContext::new().with_path("/acme/orders");
/// assert_eq!(resolver.resolve(&ctx), Some(ShellId::new("AcmeShell")));
/// assert_eq!(resolver.resolve(&ResolutionContext::new()), Some(ShellId::default_shell()));
/// ```
#[derive(Default)]
pub struct ShellResolutionBuilder {
    slots: Vec<Slot>,
    paths: Vec<(String, ShellId)>,
    hosts: Vec<(String, ShellId)>,
}

impl ShellResolutionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom strategy with the default order
    pub fn add_strategy<S: ShellResolverStrategy + 'static>(self, strategy: S) -> Self {
        self.add_strategy_with_order(strategy, DEFAULT_ORDER)
    }

    pub fn add_strategy_with_order<S: ShellResolverStrategy + 'static>(mut self, strategy: S, order: i32) -> Self {
        self.slots
            .push(Slot::Strategy(StrategyRegistration::new(order, Arc::new(strategy))));
        self
    }

    /// Map a first path segment to a shell
    ///
    /// All path mappings share one strategy, positioned at the first call.
    pub fn map_path(mut self, segment: impl Into<String>, shell: impl Into<ShellId>) -> Self {
        if !self.slots.iter().any(|s| matches!(s, Slot::Paths(_))) {
            self.slots.push(Slot::Paths(DEFAULT_ORDER));
        }
        self.paths.push((segment.into(), shell.into()));
        self
    }

    pub fn map_paths<I, K, S>(self, mappings: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<ShellId>,
    {
        mappings
            .into_iter()
            .fold(self, |b, (segment, shell)| b.map_path(segment, shell))
    }

    /// Map a host name to a shell
    ///
    /// All host mappings share one strategy, positioned at the first call.
    pub fn map_host(mut self, host: impl Into<String>, shell: impl Into<ShellId>) -> Self {
        if !self.slots.iter().any(|s| matches!(s, Slot::Hosts(_))) {
            self.slots.push(Slot::Hosts(DEFAULT_ORDER));
        }
        self.hosts.push((host.into(), shell.into()));
        self
    }

    pub fn map_hosts<I, K, S>(self, mappings: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<ShellId>,
    {
        mappings
            .into_iter()
            .fold(self, |b, (host, shell)| b.map_host(host, shell))
    }

    /// Use a header's value as the shell id
    pub fn map_header(self, header: impl AsRef<str>) -> Self {
        self.add_strategy(HeaderShellResolver::new(header))
    }

    /// Fall back to a fixed shell when nothing else matched
    pub fn use_default(self, shell: impl Into<ShellId>) -> Self {
        self.add_strategy_with_order(FixedShellResolver::new(shell), FALLBACK_ORDER)
    }

    /// Fall back to the `Default` shell when nothing else matched
    pub fn use_default_shell(self) -> Self {
        self.add_strategy_with_order(DefaultShellResolverStrategy, FALLBACK_ORDER)
    }

    /// Build the resolver. Fails when no strategy was configured.
    pub fn build(self) -> Result<Arc<dyn ShellResolver>> {
        if self.slots.is_empty() {
            return Err(Error::NoResolvers);
        }

        let mut paths = Some(self.paths);
        let mut hosts = Some(self.hosts);
        let registrations: Vec<StrategyRegistration> = self
            .slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Strategy(registration) => Some(registration),
                Slot::Paths(order) => paths
                    .take()
                    .map(|p| StrategyRegistration::new(order, Arc::new(PathShellResolver::new(p)))),
                Slot::Hosts(order) => hosts
                    .take()
                    .map(|h| StrategyRegistration::new(order, Arc::new(HostShellResolver::new(h)))),
            })
            .collect();

        debug!(strategies = registrations.len(), "Built shell resolver");
        Ok(Arc::new(DefaultShellResolver::new(registrations)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::context::ResolutionContext;

    #[test]
    fn test_empty_builder_fails() {
        let err = ShellResolutionBuilder::new().build().err().unwrap();
        assert!(matches!(err, Error::NoResolvers));
        assert_eq!(
            err.to_string(),
            "No resolvers have been configured. Add at least one resolver before building."
        );
    }

    #[test]
    fn test_host_and_path_are_independent() {
        let resolver = ShellResolutionBuilder::new()
            .map_hosts([("acme.example.com", "Acme"), ("globex.example.com", "Globex")])
            .map_paths([("initech", "Initech")])
            .use_default("Fallback")
            .build()
            .unwrap();

        let both = ResolutionContext::new()
            .with_host("GLOBEX.example.com")
            .with_path("/initech");
        assert_eq!(resolver.resolve(&both), Some(ShellId::new("Globex")));

        let path_only = ResolutionContext::new()
            .with_host("unknown.example.com")
            .with_path("/Initech/reports");
        assert_eq!(resolver.resolve(&path_only), Some(ShellId::new("Initech")));

        let neither = ResolutionContext::new().with_host("unknown.example.com").with_path("/");
        assert_eq!(resolver.resolve(&neither), Some(ShellId::new("Fallback")));
    }

    #[test]
    fn test_custom_strategy_order() {
        struct Routing;

        impl ShellResolverStrategy for Routing {
            fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
                context
                    .get::<String>(crate::resolution::keys::ROUTING_KEY)
                    .and_then(|key| key.split('.').next())
                    .map(ShellId::new)
            }
        }

        let resolver = ShellResolutionBuilder::new()
            .map_path("acme", "Acme")
            .add_strategy_with_order(Routing, 1)
            .build()
            .unwrap();

        let ctx = ResolutionContext::new()
            .with_path("/acme")
            .with(crate::resolution::keys::ROUTING_KEY, "globex.orders".to_string());
        assert_eq!(resolver.resolve(&ctx), Some(ShellId::new("Globex")));
    }

    #[test]
    fn test_header_before_fallback() {
        let resolver = ShellResolutionBuilder::new()
            .use_default_shell()
            .map_header("X-Shell")
            .build()
            .unwrap();

        let ctx = ResolutionContext::new().with_header("x-shell", "Acme");
        assert_eq!(resolver.resolve(&ctx), Some(ShellId::new("Acme")));
        assert_eq!(resolver.resolve(&ResolutionContext::new()), Some(ShellId::default_shell()));
    }
}
