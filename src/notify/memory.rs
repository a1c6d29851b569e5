//! In-process notifiers.

use std::sync::Mutex;

use super::{Notification, Notifier, NotifyError};
use crate::identity::UserId;

/// Records notifications in memory.
///
/// Useful for embedding hosts that poll for events and for tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Creates an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded notification.
    #[must_use]
    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns the notifications addressed to `user`.
    #[must_use]
    pub fn events_for(&self, user: UserId) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter(|e| e.target_user_id == user)
            .collect()
    }

    /// Removes and returns every recorded notification.
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .map_err(|e| NotifyError::Delivery(format!("Failed to acquire lock: {e}")))?
            .push(notification);
        Ok(())
    }
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}
