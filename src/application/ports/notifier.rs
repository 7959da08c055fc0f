//! Notification port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::relay::NotificationRequest;

/// Notification errors
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("notify-send not found")]
    NotifySendNotFound,

    #[error("Failed to show notification: {0}")]
    SendFailed(String),
}

/// Port for system notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a notification.
    ///
    /// A visible notification with the same tag is replaced. When
    /// `request.renotify` is set the replacement alerts the user again.
    async fn show(&self, request: &NotificationRequest) -> Result<(), NotificationError>;

    /// Close the notification carrying `tag`, if one is visible
    async fn close(&self, tag: &str) -> Result<(), NotificationError>;
}

/// Blanket implementation for boxed notifier types
#[async_trait]
impl Notifier for Box<dyn Notifier> {
    async fn show(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        self.as_ref().show(request).await
    }

    async fn close(&self, tag: &str) -> Result<(), NotificationError> {
        self.as_ref().close(tag).await
    }
}
