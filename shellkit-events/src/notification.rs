//! Notification definitions and handler traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shellkit_core::{BoxError, CancellationToken};
use std::any::Any;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Notification trait
///
/// Everything published through a [`NotificationPublisher`](crate::NotificationPublisher)
/// implements this trait.
pub trait Notification: Send + Sync + Debug + 'static {
    fn metadata(&self) -> &NotificationMetadata;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;

    fn name(&self) -> &str {
        &self.metadata().name
    }

    fn id(&self) -> Uuid {
        self.metadata().id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.metadata().timestamp
    }
}

/// Base notification metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    /// Unique notification ID
    pub id: Uuid,

    /// Notification name
    pub name: String,

    /// Timestamp when the notification was created
    pub timestamp: DateTime<Utc>,

    /// Optional correlation ID for tracing
    pub correlation_id: Option<Uuid>,
}

impl NotificationMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }
}

/// Handles one notification type
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync {
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), BoxError>;

    /// Failures of this handler are always returned to the publisher's caller,
    /// even when the publisher is set to continue on error
    fn fail_fast(&self) -> bool {
        false
    }
}

#[async_trait]
impl<N, H> NotificationHandler<N> for Arc<H>
where
    N: Notification,
    H: NotificationHandler<N> + ?Sized,
{
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), BoxError> {
        (**self).handle(notification, cancel).await
    }

    fn fail_fast(&self) -> bool {
        (**self).fail_fast()
    }
}

/// Type-erased notification handler
#[async_trait]
pub trait DynNotificationHandler: Send + Sync {
    async fn handle_dyn(
        &self,
        notification: &dyn Notification,
        cancel: &CancellationToken,
    ) -> Result<(), BoxError>;

    /// Name used in logs and errors
    fn handler_name(&self) -> &str;

    fn fail_fast(&self) -> bool;
}

/// Wrapper for typed notification handlers
pub struct TypedNotificationHandler<N: Notification, H: NotificationHandler<N>> {
    handler: H,
    name: &'static str,
    _phantom: PhantomData<fn(&N)>,
}

impl<N: Notification, H: NotificationHandler<N>> TypedNotificationHandler<N, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            name: std::any::type_name::<H>(),
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<N: Notification, H: NotificationHandler<N> + 'static> DynNotificationHandler
    for TypedNotificationHandler<N, H>
{
    async fn handle_dyn(
        &self,
        notification: &dyn Notification,
        cancel: &CancellationToken,
    ) -> Result<(), BoxError> {
        match notification.as_any().downcast_ref::<N>() {
            Some(typed) => self.handler.handle(typed, cancel).await,
            None => Err(format!(
                "Type mismatch: '{}' is not a {}",
                notification.name(),
                std::any::type_name::<N>()
            )
            .into()),
        }
    }

    fn handler_name(&self) -> &str {
        self.name
    }

    fn fail_fast(&self) -> bool {
        self.handler.fail_fast()
    }
}
