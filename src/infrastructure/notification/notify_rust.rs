//! Desktop notification adapter using notify-rust
//!
//! On XDG platforms the handle of the latest notification is kept per tag.
//! A later show with that tag reuses the server id, so the server replaces
//! the notification in place, and closing the tag closes it on the server.
//! One waiter thread listens per server id and forwards clicks to an
//! optional sink as [`NotificationClick`] events.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::tags::{Dismiss, TagRegistry};
use super::APP_NAME;
use crate::application::ports::{NotificationError, Notifier};
use crate::domain::relay::{NotificationClick, NotificationRequest};

#[cfg(all(unix, not(target_os = "macos")))]
use crate::domain::relay::DEFAULT_ACTION;

/// Sound hint used when a replacement should alert again
#[cfg(all(unix, not(target_os = "macos")))]
const RENOTIFY_SOUND: &str = "message-new-instant";

#[cfg(all(unix, not(target_os = "macos")))]
type Handle = notify_rust::NotificationHandle;

#[cfg(not(all(unix, not(target_os = "macos"))))]
type Handle = ();

#[cfg(all(unix, not(target_os = "macos")))]
impl Dismiss for notify_rust::NotificationHandle {
    fn dismiss(self) {
        self.close();
    }
}

type SharedTags<H> = Arc<Mutex<TagRegistry<H>>>;

/// Notifier backed by the platform notification service
pub struct DesktopNotifier {
    app_name: String,
    tags: SharedTags<Handle>,
    clicks: Option<mpsc::UnboundedSender<NotificationClick>>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::with_app_name(APP_NAME)
    }

    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            tags: Arc::new(Mutex::new(TagRegistry::new())),
            clicks: None,
        }
    }

    /// Forward clicks on shown notifications to `tx`
    pub fn with_click_sink(mut self, tx: mpsc::UnboundedSender<NotificationClick>) -> Self {
        self.clicks = Some(tx);
        self
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn show(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        let request = request.clone();
        let app_name = self.app_name.clone();
        let tags = Arc::clone(&self.tags);
        let clicks = self.clicks.clone();

        // notify-rust operations can block, so run in spawn_blocking
        tokio::task::spawn_blocking(move || show_blocking(&app_name, request, tags, clicks))
            .await
            .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }

    async fn close(&self, tag: &str) -> Result<(), NotificationError> {
        dismiss(&self.tags, tag).await.map(|_| ())
    }
}

/// Take `tag` out of the registry and close its notification on the server.
///
/// Returns the server id that was closed.
async fn dismiss<H>(tags: &SharedTags<H>, tag: &str) -> Result<Option<u32>, NotificationError>
where
    H: Dismiss + Send + 'static,
{
    let Some((id, handle)) = tags.lock().ok().and_then(|mut tags| tags.take(tag)) else {
        return Ok(None);
    };

    tokio::task::spawn_blocking(move || handle.dismiss())
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?;
    tracing::debug!(tag, id, "notification closed");
    Ok(Some(id))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn show_blocking(
    app_name: &str,
    request: NotificationRequest,
    tags: SharedTags<Handle>,
    clicks: Option<mpsc::UnboundedSender<NotificationClick>>,
) -> Result<(), NotificationError> {
    use notify_rust::{Hint, Timeout, Urgency};

    let previous = tags.lock().ok().and_then(|tags| tags.id(&request.tag));

    let mut notification = notify_rust::Notification::new();
    notification
        .appname(app_name)
        .summary(&request.title)
        .body(&request.body)
        .icon(&request.icon);

    if let Some(id) = previous {
        notification.id(id);
        if request.renotify {
            notification.hint(Hint::SoundName(RENOTIFY_SOUND.to_string()));
        }
    }
    if request.require_interaction {
        notification
            .urgency(Urgency::Critical)
            .timeout(Timeout::Never)
            .hint(Hint::Resident(true));
    }
    if clicks.is_some() {
        notification.action(DEFAULT_ACTION, "Open");
    }

    let handle = notification
        .show()
        .map_err(|e| NotificationError::SendFailed(e.to_string()))?;
    let id = handle.id();
    tracing::debug!(tag = %request.tag, id, replaced = previous.is_some(), "notification shown");

    let start_waiter = match tags.lock() {
        Ok(mut map) => map.record(&request.tag, id, request.data, handle, clicks.is_some()),
        Err(_) => false,
    };
    if let (true, Some(tx)) = (start_waiter, clicks) {
        watch(id, request.tag, tags, tx);
    }

    Ok(())
}

/// Listen for the response to notification `id` on its own thread.
///
/// The thread returns once the notification is activated or closed, so at
/// most one waiter is parked per visible notification.
#[cfg(all(unix, not(target_os = "macos")))]
fn watch(
    id: u32,
    tag: String,
    tags: SharedTags<Handle>,
    tx: mpsc::UnboundedSender<NotificationClick>,
) {
    use notify_rust::ActionResponse;

    std::thread::spawn(move || {
        let result = notify_rust::handle_action(id, |response| match response {
            ActionResponse::Custom(action) => {
                let data = tags.lock().ok().and_then(|map| map.clicked(&tag, id));
                if let Some(data) = data {
                    let mut click = NotificationClick::new(tag.clone(), data);
                    click.action = action.to_string();
                    if tx.send(click).is_err() {
                        tracing::debug!("click receiver dropped");
                    }
                }
            }
            ActionResponse::Closed(reason) => {
                if let Ok(mut map) = tags.lock() {
                    if map.closed(&tag, id) {
                        tracing::debug!(tag = %tag, id, ?reason, "notification dismissed");
                    }
                }
            }
        });
        if let Err(e) = result {
            tracing::warn!(tag = %tag, id, error = %e, "stopped waiting for notification action");
        }
        if let Ok(mut map) = tags.lock() {
            map.waiter_done(&tag, id);
        }
    });
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn show_blocking(
    app_name: &str,
    request: NotificationRequest,
    tags: SharedTags<Handle>,
    _clicks: Option<mpsc::UnboundedSender<NotificationClick>>,
) -> Result<(), NotificationError> {
    notify_rust::Notification::new()
        .appname(app_name)
        .summary(&request.title)
        .body(&request.body)
        .icon(&request.icon)
        .show()
        .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

    if let Ok(mut map) = tags.lock() {
        map.record(&request.tag, 0, request.data, (), false);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::relay::SafeData;

    /// Handle that counts how often it was closed
    #[derive(Clone, Default)]
    struct CountingHandle(Arc<AtomicUsize>);

    impl Dismiss for CountingHandle {
        fn dismiss(self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn shared<H>() -> SharedTags<H> {
        Arc::new(Mutex::new(TagRegistry::new()))
    }

    #[test]
    fn notifier_default_app_name() {
        let notifier = DesktopNotifier::default();
        assert_eq!(notifier.app_name, "Gateway Relay");
        assert!(notifier.clicks.is_none());
    }

    #[test]
    fn click_sink_is_attached() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let notifier = DesktopNotifier::with_app_name("Test").with_click_sink(tx);
        assert!(notifier.clicks.is_some());
    }

    #[tokio::test]
    async fn close_reaches_server_before_next_show() {
        let tags = shared();
        let handle = CountingHandle::default();
        let closes = Arc::clone(&handle.0);

        tags.lock()
            .unwrap()
            .record("incoming-call", 7, SafeData::new(), handle.clone(), true);
        assert_eq!(dismiss(&tags, "incoming-call").await.unwrap(), Some(7));
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        // The next show for the tag starts fresh instead of stacking
        assert_eq!(tags.lock().unwrap().id("incoming-call"), None);
        let start = tags
            .lock()
            .unwrap()
            .record("incoming-call", 8, SafeData::new(), handle, true);
        assert!(start);
        assert_eq!(tags.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closing_unknown_tag_is_noop() {
        let tags = shared::<CountingHandle>();
        assert_eq!(dismiss(&tags, "incoming-call").await.unwrap(), None);
    }

    #[tokio::test]
    async fn close_on_notifier_forgets_tag() {
        let notifier = DesktopNotifier::new();
        notifier.close("incoming-call").await.unwrap();
        assert!(notifier.tags.lock().unwrap().is_empty());
    }
}
