//! Shell lifecycle notifications and the handlers that run lifecycle hooks
//!
//! [`ShellActivationHandler`] runs every [`ShellActivatedHandler`] registered in
//! the shell in ascending order and stops at the first failure.
//! [`ShellDeactivationHandler`] runs every [`ShellDeactivatingHandler`] in
//! descending order, logging failures and always attempting all of them.
//!
//! [`ShellActivatedHandler`]: shellkit_core::ShellActivatedHandler
//! [`ShellDeactivatingHandler`]: shellkit_core::ShellDeactivatingHandler

use crate::host::ShellContext;
use async_trait::async_trait;
use shellkit_core::lifecycle::{order_for_activation, order_for_deactivation};
use shellkit_core::{
    ActivatedRegistration, BoxError, CancellationToken, DeactivatingRegistration, Error, Result,
    ShellId, ShellSettings,
};
use shellkit_events::{Notification, NotificationHandler, NotificationMetadata};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

macro_rules! impl_notification {
    ($name:ident) => {
        impl Notification for $name {
            fn metadata(&self) -> &NotificationMetadata {
                &self.metadata
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

/// A shell was built and added
#[derive(Debug)]
pub struct ShellActivated {
    pub metadata: NotificationMetadata,
    pub context: Arc<ShellContext>,
}

impl ShellActivated {
    pub fn new(context: Arc<ShellContext>) -> Self {
        Self {
            metadata: NotificationMetadata::new("shell_activated"),
            context,
        }
    }
}

/// A shell is about to be removed
#[derive(Debug)]
pub struct ShellDeactivating {
    pub metadata: NotificationMetadata,
    pub context: Arc<ShellContext>,
}

impl ShellDeactivating {
    pub fn new(context: Arc<ShellContext>) -> Self {
        Self {
            metadata: NotificationMetadata::new("shell_deactivating"),
            context,
        }
    }
}

/// A shell was added to the cache
#[derive(Debug)]
pub struct ShellAdded {
    pub metadata: NotificationMetadata,
    pub settings: ShellSettings,
}

impl ShellAdded {
    pub fn new(settings: ShellSettings) -> Self {
        Self {
            metadata: NotificationMetadata::new("shell_added"),
            settings,
        }
    }
}

/// A shell was removed from the cache
#[derive(Debug)]
pub struct ShellRemoved {
    pub metadata: NotificationMetadata,
    pub id: ShellId,
}

impl ShellRemoved {
    pub fn new(id: ShellId) -> Self {
        Self {
            metadata: NotificationMetadata::new("shell_removed"),
            id,
        }
    }
}

/// The whole set of shells was reloaded
#[derive(Debug)]
pub struct ShellsReloaded {
    pub metadata: NotificationMetadata,
    pub shells: Vec<ShellSettings>,
}

impl ShellsReloaded {
    pub fn new(shells: Vec<ShellSettings>) -> Self {
        Self {
            metadata: NotificationMetadata::new("shells_reloaded"),
            shells,
        }
    }
}

impl_notification!(ShellActivated);
impl_notification!(ShellDeactivating);
impl_notification!(ShellAdded);
impl_notification!(ShellRemoved);
impl_notification!(ShellsReloaded);

/// Run a shell's activation hooks. Returns how many ran.
pub async fn activate(context: &ShellContext, cancel: &CancellationToken) -> Result<usize> {
    let shell = context.id();
    info!(shell = %shell, "Activating shell");

    let handlers = order_for_activation(context.services().get_all::<ActivatedRegistration>()?);
    for registration in &handlers {
        if let Err(source) = registration.handler.on_activated(cancel).await {
            error!(shell = %shell, handler = %registration.name, error = %source, "Activation handler failed");
            return Err(Error::handler_failure(shell.clone(), registration.name.clone(), source));
        }
        debug!(shell = %shell, handler = %registration.name, "Activation handler completed");
    }

    info!(shell = %shell, handlers = handlers.len(), "Activated shell");
    Ok(handlers.len())
}

/// Outcome of running a shell's deactivation hooks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeactivationReport {
    pub total: usize,
    pub failed: usize,
}

impl DeactivationReport {
    pub fn succeeded(&self) -> usize {
        self.total - self.failed
    }
}

/// Run every deactivation hook of a shell, never stopping early
pub async fn deactivate(context: &ShellContext, cancel: &CancellationToken) -> DeactivationReport {
    let shell = context.id();
    info!(shell = %shell, "Deactivating shell");

    let handlers = match context.services().get_all::<DeactivatingRegistration>() {
        Ok(handlers) => order_for_deactivation(handlers),
        Err(e) => {
            error!(shell = %shell, error = %e, "Could not resolve deactivation handlers");
            return DeactivationReport::default();
        }
    };

    let mut report = DeactivationReport {
        total: handlers.len(),
        failed: 0,
    };
    for registration in &handlers {
        match registration.handler.on_deactivating(cancel).await {
            Ok(()) => debug!(shell = %shell, handler = %registration.name, "Deactivation handler completed"),
            Err(e) => {
                report.failed += 1;
                error!(shell = %shell, handler = %registration.name, error = %e, "Deactivation handler failed");
            }
        }
    }

    if report.failed > 0 {
        warn!(
            shell = %shell,
            succeeded = report.succeeded(),
            total = report.total,
            failed = report.failed,
            "Deactivated shell with failures"
        );
    } else {
        info!(shell = %shell, handlers = report.total, "Deactivated shell");
    }
    report
}

/// Subscribes to [`ShellActivated`] and runs activation hooks
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellActivationHandler;

#[async_trait]
impl NotificationHandler<ShellActivated> for ShellActivationHandler {
    async fn handle(&self, notification: &ShellActivated, cancel: &CancellationToken) -> std::result::Result<(), BoxError> {
        activate(&notification.context, cancel).await?;
        Ok(())
    }

    /// Activation failures are fatal to adding a shell
    fn fail_fast(&self) -> bool {
        true
    }
}

/// Subscribes to [`ShellDeactivating`] and runs deactivation hooks
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellDeactivationHandler;

#[async_trait]
impl NotificationHandler<ShellDeactivating> for ShellDeactivationHandler {
    async fn handle(&self, notification: &ShellDeactivating, cancel: &CancellationToken) -> std::result::Result<(), BoxError> {
        deactivate(&notification.context, cancel).await;
        Ok(())
    }
}
