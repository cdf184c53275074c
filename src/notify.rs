//! Notification collaborator: transient success/error messages for the user.

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub kind: NotificationKind,
  pub title: String,
  pub message: String,
}

impl Notification {
  pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      kind: NotificationKind::Success,
      title: title.into(),
      message: message.into(),
    }
  }

  pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      kind: NotificationKind::Error,
      title: title.into(),
      message: message.into(),
    }
  }
}

/// Fire-and-forget sink for notifications.
pub trait Notifier: Send + Sync {
  fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, notification: Notification) {
    match notification.kind {
      NotificationKind::Success => {
        info!(title = %notification.title, "{}", notification.message)
      }
      NotificationKind::Error => {
        warn!(title = %notification.title, "{}", notification.message)
      }
    }
  }
}

/// Forwards notifications to a channel, e.g. a toast area in the UI loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl Notifier for ChannelNotifier {
  fn notify(&self, notification: Notification) {
    // Ignore send errors - nobody is showing notifications any more
    let _ = self.tx.send(notification);
  }
}
