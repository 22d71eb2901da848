//! Picking shells for inbound operations.

use shellkit::prelude::*;
use shellkit::shellkit_tenancy::resolution::{HeaderShellResolver, keys};
use tokio_test::assert_ok;

async fn running_shells() -> Shells {
    let shells = ShellsBuilder::new()
        .with_shells(vec![
            ShellSettings::new("Default"),
            ShellSettings::new("AcmeShell"),
            ShellSettings::new("Globex"),
            ShellSettings::new("Initech"),
        ])
        .build()
        .unwrap();
    assert_ok!(shells.initialize(&CancellationToken::new()).await);
    shells
}

fn resolver() -> Arc<dyn ShellResolver> {
    ShellResolutionBuilder::new()
        .map_path("acme", "AcmeShell")
        .map_host("globex.example.com", "Globex")
        .add_strategy_with_order(HeaderShellResolver::new("X-Shell").with_known_shells(["Initech"]), 10)
        .use_default_shell()
        .build()
        .unwrap()
}

async fn resolved(shells: &Shells, ctx: ResolutionContext) -> String {
    let resolver = resolver();
    let shell = shells.shell_for(resolver.as_ref(), &ctx).await.unwrap().unwrap();
    shell.id().name().to_string()
}

#[tokio::test]
async fn test_path_host_header_and_fallback() {
    let shells = running_shells().await;

    let by_path = ResolutionContext::new().with_path("/ACME/orders/7");
    assert_eq!(resolved(&shells, by_path).await, "AcmeShell");

    let by_host = ResolutionContext::new()
        .with_host("Globex.Example.com")
        .with_path("/unknown");
    assert_eq!(resolved(&shells, by_host).await, "Globex");

    let by_header = ResolutionContext::new()
        .with_path("/acme")
        .with_header("x-shell", "initech");
    assert_eq!(resolved(&shells, by_header).await, "Initech");

    let fallback = ResolutionContext::new()
        .with_path("/")
        .with_host("other.example.com")
        .with_header("X-Shell", "Hooli");
    assert_eq!(resolved(&shells, fallback).await, "Default");
}

#[tokio::test]
async fn test_resolution_does_not_touch_context() {
    let ctx = ResolutionContext::new()
        .with_path("/acme")
        .with(keys::ROUTING_KEY, "orders".to_string());
    let before = ctx.len();

    assert_eq!(resolver().resolve(&ctx), Some(ShellId::new("acmeshell")));
    assert_eq!(ctx.len(), before);
    assert_eq!(ctx.path(), Some("/acme"));
}

#[test]
fn test_empty_chain_fails_when_built() {
    let err = ShellResolutionBuilder::new().build().err().unwrap();
    assert!(matches!(err, Error::NoResolvers));
}
