//! Shell resolution: mapping an inbound context to a shell id

pub mod builder;
pub mod context;
pub mod resolver;
pub mod strategy;

pub use builder::ShellResolutionBuilder;
pub use context::{Headers, ResolutionContext, keys};
pub use resolver::{DEFAULT_ORDER, DefaultShellResolver, FALLBACK_ORDER, ShellResolver, StrategyRegistration};
pub use strategy::{
    DefaultShellResolverStrategy, FixedShellResolver, HeaderShellResolver, HostShellResolver, PathShellResolver,
    ShellResolverStrategy,
};
