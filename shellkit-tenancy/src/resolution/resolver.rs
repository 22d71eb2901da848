//! Ordered strategy chain

use super::context::ResolutionContext;
use super::strategy::ShellResolverStrategy;
use shellkit_core::ShellId;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Order used when a strategy is added without one
pub const DEFAULT_ORDER: i32 = 100;

/// Order of catch-all fallbacks, after everything else
pub const FALLBACK_ORDER: i32 = i32::MAX;

/// Picks the shell for an inbound operation
pub trait ShellResolver: Send + Sync {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId>;
}

/// A strategy and its position in the chain
#[derive(Clone)]
pub struct StrategyRegistration {
    pub order: i32,
    pub strategy: Arc<dyn ShellResolverStrategy>,
}

impl StrategyRegistration {
    pub fn new(order: i32, strategy: Arc<dyn ShellResolverStrategy>) -> Self {
        Self { order, strategy }
    }
}

impl fmt::Debug for StrategyRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistration")
            .field("order", &self.order)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

/// Tries strategies in ascending order and returns the first match
///
/// Strategies with equal order run in registration order.
#[derive(Debug, Clone)]
pub struct DefaultShellResolver {
    strategies: Vec<StrategyRegistration>,
}

impl DefaultShellResolver {
    pub fn new(mut strategies: Vec<StrategyRegistration>) -> Self {
        strategies.sort_by_key(|r| r.order);
        Self { strategies }
    }

    pub fn strategies(&self) -> &[StrategyRegistration] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl ShellResolver for DefaultShellResolver {
    fn resolve(&self, context: &ResolutionContext) -> Option<ShellId> {
        self.strategies.iter().find_map(|registration| {
            let resolved = registration.strategy.resolve(context);
            if let Some(id) = &resolved {
                trace!(shell = %id, strategy = registration.strategy.name(), "Resolved shell");
            }
            resolved
        })
    }
}
