//! Notification publisher

use crate::notification::{DynNotificationHandler, Notification, NotificationHandler, TypedNotificationHandler};
use dashmap::DashMap;
use shellkit_core::{BoxError, CancellationToken};
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// How handlers for one notification are run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishStrategy {
    /// One after another, in subscription order
    #[default]
    Sequential,
    /// All at once on spawned tasks, results collected in subscription order
    Parallel,
}

/// Publisher configuration
#[derive(Debug, Clone, Default)]
pub struct PublisherConfig {
    pub strategy: PublishStrategy,

    /// Log handler failures and keep going instead of returning the first one
    pub continue_on_error: bool,
}

/// In-process publisher routing notifications to handlers by type
#[derive(Clone, Default)]
pub struct NotificationPublisher {
    handlers: Arc<DashMap<TypeId, Vec<Arc<dyn DynNotificationHandler>>>>,
    config: Arc<PublisherConfig>,
}

impl NotificationPublisher {
    pub fn new() -> Self {
        Self::with_config(PublisherConfig::default())
    }

    pub fn with_config(config: PublisherConfig) -> Self {
        Self {
            handlers: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    pub fn builder() -> PublisherBuilder {
        PublisherBuilder::new()
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Subscribe a handler to a notification type
    pub fn subscribe<N, H>(&self, handler: H)
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let handler = Arc::new(TypedNotificationHandler::new(handler));
        debug!(
            notification = std::any::type_name::<N>(),
            handler = handler.handler_name(),
            "Subscribed notification handler"
        );
        self.handlers
            .entry(TypeId::of::<N>())
            .or_default()
            .push(handler);
    }

    /// Publish a notification to every handler subscribed to its type
    ///
    /// Publishing with no handlers is a no-op.
    pub async fn publish<N: Notification>(
        &self,
        notification: N,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        // Snapshot so handlers may subscribe without deadlocking the map
        let handlers = match self.handlers.get(&TypeId::of::<N>()) {
            Some(handlers) => handlers.clone(),
            None => {
                trace!(notification = notification.name(), "No handlers registered");
                return Ok(());
            }
        };

        debug!(
            notification = notification.name(),
            id = %notification.id(),
            handlers = handlers.len(),
            "Publishing notification"
        );

        let notification: Arc<dyn Notification> = Arc::new(notification);
        match self.config.strategy {
            PublishStrategy::Sequential => self.publish_sequential(&handlers, notification, cancel).await,
            PublishStrategy::Parallel => self.publish_parallel(&handlers, notification, cancel).await,
        }
    }

    async fn publish_sequential(
        &self,
        handlers: &[Arc<dyn DynNotificationHandler>],
        notification: Arc<dyn Notification>,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        for handler in handlers {
            if let Err(source) = handler.handle_dyn(notification.as_ref(), cancel).await {
                self.on_failure(handler.as_ref(), notification.name(), source)?;
            }
        }
        Ok(())
    }

    async fn publish_parallel(
        &self,
        handlers: &[Arc<dyn DynNotificationHandler>],
        notification: Arc<dyn Notification>,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        let tasks: Vec<_> = handlers
            .iter()
            .map(|handler| {
                let handler = handler.clone();
                let notification = notification.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { handler.handle_dyn(notification.as_ref(), &cancel).await })
            })
            .collect();

        // Join every task so no handler keeps running past the publish call
        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(task.await);
        }

        let mut first_error = None;
        for (handler, result) in handlers.iter().zip(results) {
            let outcome = match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(source)) => self.on_failure(handler.as_ref(), notification.name(), source),
                Err(e) => {
                    error!(handler = handler.handler_name(), error = %e, "Handler task panicked");
                    if self.continues_after(handler.as_ref()) {
                        Ok(())
                    } else {
                        Err(PublishError::HandlerPanicked {
                            handler: handler.handler_name().to_string(),
                            message: e.to_string(),
                        })
                    }
                }
            };
            if let Err(err) = outcome {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn continues_after(&self, handler: &dyn DynNotificationHandler) -> bool {
        self.config.continue_on_error && !handler.fail_fast()
    }

    fn on_failure(
        &self,
        handler: &dyn DynNotificationHandler,
        notification: &str,
        source: BoxError,
    ) -> Result<(), PublishError> {
        let name = handler.handler_name();
        error!(handler = name, notification, error = %source, "Notification handler failed");
        if self.continues_after(handler) {
            return Ok(());
        }
        Err(PublishError::HandlerFailed {
            handler: name.to_string(),
            notification: notification.to_string(),
            source,
        })
    }

    /// Remove all handlers for a notification type, returning how many were removed
    pub fn unsubscribe<N: Notification>(&self) -> usize {
        let removed = self
            .handlers
            .remove(&TypeId::of::<N>())
            .map(|(_, handlers)| handlers.len())
            .unwrap_or(0);
        debug!(notification = std::any::type_name::<N>(), removed, "Unsubscribed handlers");
        removed
    }

    /// Clear all handlers
    pub fn clear(&self) {
        self.handlers.clear();
        debug!("Cleared all notification handlers");
    }

    /// Get handler count for a notification type
    pub fn handler_count<N: Notification>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<N>())
            .map(|h| h.len())
            .unwrap_or(0)
    }
}

/// Publishing errors
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Handler '{handler}' failed for '{notification}': {source}")]
    HandlerFailed {
        handler: String,
        notification: String,
        #[source]
        source: BoxError,
    },

    #[error("Handler '{handler}' panicked: {message}")]
    HandlerPanicked { handler: String, message: String },
}

impl PublishError {
    /// The error returned by the failing handler, if any
    pub fn into_source(self) -> Option<BoxError> {
        match self {
            Self::HandlerFailed { source, .. } => Some(source),
            Self::HandlerPanicked { .. } => None,
        }
    }
}

impl From<PublishError> for shellkit_core::Error {
    /// Handler errors that already are shellkit errors come through unchanged.
    fn from(err: PublishError) -> Self {
        let message = err.to_string();
        match err.into_source().map(|source| source.downcast::<shellkit_core::Error>()) {
            Some(Ok(core)) => *core,
            _ => shellkit_core::Error::Notification(message),
        }
    }
}

/// Publisher builder
#[derive(Debug, Default)]
pub struct PublisherBuilder {
    config: PublisherConfig,
}

impl PublisherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: PublishStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.config.continue_on_error = enabled;
        self
    }

    pub fn build(self) -> NotificationPublisher {
        NotificationPublisher::with_config(self.config)
    }
}
