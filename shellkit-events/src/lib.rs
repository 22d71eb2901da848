//! In-process notifications for shellkit
//!
//! Notifications are routed to handlers by type. Handlers run one after
//! another by default, or concurrently with [`PublishStrategy::Parallel`].
//!
//! ## Quick Start
//!
//! ```rust
//! use shellkit_events::*;
//! use shellkit_core::{BoxError, CancellationToken};
//! use async_trait::async_trait;
//! use std::any::Any;
//!
//! #[derive(Debug)]
//! struct TenantCreated {
//!     metadata: NotificationMetadata,
//!     tenant: String,
//! }
//!
//! impl Notification for TenantCreated {
//!     fn metadata(&self) -> &NotificationMetadata { &self.metadata }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl NotificationHandler<TenantCreated> for Audit {
//!     async fn handle(&self, n: &TenantCreated, _cancel: &CancellationToken) -> Result<(), BoxError> {
//!         println!("tenant {} created", n.tenant);
//!         Ok(())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let publisher = NotificationPublisher::new();
//! publisher.subscribe::<TenantCreated, _>(Audit);
//!
//! let created = TenantCreated {
//!     metadata: NotificationMetadata::new("tenant_created"),
//!     tenant: "acme".to_string(),
//! };
//! publisher.publish(created, &CancellationToken::new()).await.unwrap();
//! # });
//! ```

pub mod notification;
pub mod publisher;

pub use notification::{
    DynNotificationHandler, Notification, NotificationHandler, NotificationMetadata,
    TypedNotificationHandler,
};
pub use publisher::{NotificationPublisher, PublishError, PublishStrategy, PublisherBuilder, PublisherConfig};
