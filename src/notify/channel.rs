//! Channel-backed notifier with an async dispatcher.
//!
//! ```text
//! workflow ──notify()──▶ ChannelNotifier ──mpsc──▶ dispatcher task ──▶ DeliveryChannel
//! ```
//!
//! `notify` uses `try_send`, so a workflow never waits on delivery. When the
//! queue is full the event is rejected and the workflow logs and drops it.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Notification, Notifier, NotifyError};

/// Downstream transport that actually delivers notifications.
pub trait DeliveryChannel: Send + Sync + 'static {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that queues events on a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiver draining it.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sender.try_send(notification).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotifyError::Full,
            mpsc::error::TrySendError::Closed(_) => NotifyError::Closed,
        })
    }
}

/// Spawns a task that delivers queued notifications until the channel closes.
///
/// Delivery failures are logged and skipped. The task resolves to the
/// number of notifications delivered successfully.
///
/// Must be called from within a tokio runtime.
pub fn spawn_dispatcher<D>(
    mut receiver: mpsc::Receiver<Notification>,
    channel: D,
) -> JoinHandle<usize>
where
    D: DeliveryChannel,
{
    tokio::spawn(async move {
        let mut delivered = 0;
        while let Some(notification) = receiver.recv().await {
            match channel.deliver(&notification) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    target_user = %notification.target_user_id,
                    event_type = %notification.event_type,
                    error = %e,
                    "notification delivery failed"
                ),
            }
        }
        debug!(delivered, "notification dispatcher stopped");
        delivered
    })
}
