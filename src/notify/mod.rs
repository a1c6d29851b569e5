//! Notification emission.
//!
//! Workflows report state transitions through the single-method
//! [`Notifier`] trait. Emission happens after the transaction commits and is
//! fire-and-forget: a failing notifier is logged and ignored, never turning a
//! committed change into an error.
//!
//! # Implementations
//!
//! - [`ChannelNotifier`]: bounded tokio channel drained by
//!   [`spawn_dispatcher`] into a [`DeliveryChannel`]
//! - [`MemoryNotifier`]: keeps every event in memory
//! - [`NoopNotifier`]: discards everything

mod channel;
mod memory;
mod types;

use thiserror::Error;
use tracing::warn;

pub use channel::{spawn_dispatcher, ChannelNotifier, DeliveryChannel};
pub use memory::{MemoryNotifier, NoopNotifier};
pub use types::{Notification, NotificationType};

/// Errors raised by a notifier.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The receiving side is gone.
    #[error("Notification channel closed")]
    Closed,

    /// The queue is full.
    #[error("Notification queue full")]
    Full,

    /// Delivery failed downstream.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// One-way sink for notifications.
pub trait Notifier: Send + Sync {
    /// Hands one notification to the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the notification.
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Sends every notification, logging and discarding failures.
pub(crate) fn emit_all(notifier: &dyn Notifier, notifications: Vec<Notification>) {
    for notification in notifications {
        let target = notification.target_user_id;
        let event_type = notification.event_type;
        if let Err(e) = notifier.notify(notification) {
            warn!(target_user = %target, %event_type, error = %e, "dropping notification");
        }
    }
}
