//! Resolver strategies
//!
//! Each strategy looks at a [`ResolutionContext`] and either names a shell or
//! passes. Strategies never modify the context.

use super::context::ResolutionContext;
use shellkit_core::ShellId;
use std::collections::{HashMap, HashSet};

/// One way of picking a shell from a resolution context
pub trait ShellResolverStrategy: Send + Sync {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

fn lowercase_map<I, K>(entries: I) -> HashMap<String, ShellId>
where
    I: IntoIterator<Item = (K, ShellId)>,
    K: AsRef<str>,
{
    entries
        .into_iter()
        .map(|(k, id)| (k.as_ref().to_lowercase(), id))
        .collect()
}

/// Maps the first path segment to a shell
///
/// `/acme/orders` looks up `acme`. Empty paths and `/` never match.
#[derive(Debug, Clone, Default)]
pub struct PathShellResolver {
    paths: HashMap<String, ShellId>,
}

impl PathShellResolver {
    pub fn new<I, K>(paths: I) -> Self
    where
        I: IntoIterator<Item = (K, ShellId)>,
        K: AsRef<str>,
    {
        Self {
            paths: lowercase_map(paths),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn first_segment(path: &str) -> Option<&str> {
        if path.len() <= 1 {
            return None;
        }
        let rest = path.strip_prefix('/').unwrap_or(path);
        rest.split('/').next()
    }
}

impl ShellResolverStrategy for PathShellResolver {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
        let segment = Self::first_segment(context.path()?)?;
        self.paths.get(&segment.to_lowercase()).cloned()
    }
}

/// Maps an exact host name to a shell
#[derive(Debug, Clone, Default)]
pub struct HostShellResolver {
    hosts: HashMap<String, ShellId>,
}

impl HostShellResolver {
    pub fn new<I, K>(hosts: I) -> Self
    where
        I: IntoIterator<Item = (K, ShellId)>,
        K: AsRef<str>,
    {
        Self {
            hosts: lowercase_map(hosts),
        }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl ShellResolverStrategy for HostShellResolver {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
        let host = context.host()?;
        self.hosts.get(&host.to_lowercase()).cloned()
    }
}

/// Uses the value of a header as the shell id
///
/// With a known set configured, values outside it are ignored.
#[derive(Debug, Clone)]
pub struct HeaderShellResolver {
    header: String,
    known: Option<HashSet<ShellId>>,
}

impl HeaderShellResolver {
    pub fn new(header: impl AsRef<str>) -> Self {
        Self {
            header: header.as_ref().to_lowercase(),
            known: None,
        }
    }

    pub fn with_known_shells<I, S>(mut self, shells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ShellId>,
    {
        self.known = Some(shells.into_iter().map(Into::into).collect());
        self
    }

    pub fn header(&self) -> &str {
        &self.header
    }
}

impl ShellResolverStrategy for HeaderShellResolver {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
        let value = context.header(&self.header)?.trim();
        if value.is_empty() {
            return None;
        }
        let id = ShellId::new(value);
        match &self.known {
            Some(known) if !known.contains(&id) => None,
            _ => Some(id),
        }
    }
}

/// Always resolves to the same shell
#[derive(Debug, Clone)]
pub struct FixedShellResolver {
    id: ShellId,
}

impl FixedShellResolver {
    pub fn new(id: impl Into<ShellId>) -> Self {
        Self { id: id.into() }
    }
}

impl ShellResolverStrategy for FixedShellResolver {
    fn resolve(&self, _context: &ResolutionContext) -> Option<ShellId> {
        Some(self.id.clone())
    }
}

/// Always resolves to the `Default` shell
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultShellResolverStrategy;

impl ShellResolverStrategy for DefaultShellResolverStrategy {
    fn resolve(&self, _context: &ResolutionContext) -> Option<ShellId> {
        Some(ShellId::default_shell())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> PathShellResolver {
        PathShellResolver::new([("acme", ShellId::new("AcmeShell")), ("globex", ShellId::new("Globex"))])
    }

    fn at(path: &str) -> ResolutionContext {
        ResolutionContext::new().with_path(path)
    }

    #[test]
    fn test_path_uses_first_segment() {
        let resolver = paths();
        assert_eq!(resolver.resolve(&at("/acme/orders")), Some(ShellId::new("AcmeShell")));
        assert_eq!(resolver.resolve(&at("/acme")), Some(ShellId::new("AcmeShell")));
        assert_eq!(resolver.resolve(&at("/globex/")), Some(ShellId::new("Globex")));
    }

    #[test]
    fn test_path_is_case_insensitive() {
        assert_eq!(paths().resolve(&at("/ACME")), Some(ShellId::new("AcmeShell")));
    }

    #[test]
    fn test_path_edge_cases() {
        let resolver = paths();
        assert_eq!(resolver.resolve(&at("/")), None);
        assert_eq!(resolver.resolve(&at("")), None);
        assert_eq!(resolver.resolve(&at("/initech/acme")), None);
        assert_eq!(resolver.resolve(&at("/acmecorp")), None);
        assert_eq!(resolver.resolve(&ResolutionContext::new()), None);
    }

    #[test]
    fn test_host_exact_match() {
        let resolver = HostShellResolver::new([("acme.example.com", ShellId::new("Acme"))]);
        let host = |h: &str| ResolutionContext::new().with_host(h);

        assert_eq!(resolver.resolve(&host("ACME.example.com")), Some(ShellId::new("Acme")));
        assert_eq!(resolver.resolve(&host("www.acme.example.com")), None);
        assert_eq!(resolver.resolve(&ResolutionContext::new().with_path("/acme")), None);
    }

    #[test]
    fn test_header_resolver() {
        let open = HeaderShellResolver::new("X-Shell");
        let restricted = HeaderShellResolver::new("X-Shell").with_known_shells(["Acme"]);

        let ctx = ResolutionContext::new().with_header("x-shell", "ACME");
        assert_eq!(open.resolve(&ctx), Some(ShellId::new("acme")));
        assert_eq!(restricted.resolve(&ctx), Some(ShellId::new("acme")));

        let other = ResolutionContext::new().with_header("X-Shell", "Initech");
        assert_eq!(open.resolve(&other), Some(ShellId::new("Initech")));
        assert_eq!(restricted.resolve(&other), None);

        let blank = ResolutionContext::new().with_header("X-Shell", "  ");
        assert_eq!(open.resolve(&blank), None);
    }

    #[test]
    fn test_fixed_and_default() {
        let ctx = ResolutionContext::new();
        assert_eq!(FixedShellResolver::new("Acme").resolve(&ctx), Some(ShellId::new("acme")));
        assert_eq!(DefaultShellResolverStrategy.resolve(&ctx), Some(ShellId::default_shell()));
    }
}
