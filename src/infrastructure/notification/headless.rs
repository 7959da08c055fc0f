//! In-memory notifier for machines without a notification server

use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{NotificationError, Notifier};
use crate::domain::relay::NotificationRequest;

#[derive(Debug, Default)]
struct Inner {
    /// Visible notifications in display order, at most one per tag
    visible: Vec<NotificationRequest>,
    alerts: usize,
}

/// Notifier that logs notifications and keeps the visible set in memory
#[derive(Debug, Default)]
pub struct HeadlessNotifier {
    inner: Mutex<Inner>,
}

impl HeadlessNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently visible notifications
    pub fn visible(&self) -> Vec<NotificationRequest> {
        self.inner
            .lock()
            .map(|inner| inner.visible.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, tag: &str) -> Option<NotificationRequest> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.visible.iter().find(|n| n.tag == tag).cloned())
    }

    /// How many times the user would have been alerted
    pub fn alerts(&self) -> usize {
        self.inner.lock().map(|inner| inner.alerts).unwrap_or(0)
    }
}

#[async_trait]
impl Notifier for HeadlessNotifier {
    async fn show(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        let replaced = match inner.visible.iter().position(|n| n.tag == request.tag) {
            Some(pos) => {
                inner.visible[pos] = request.clone();
                true
            }
            None => {
                inner.visible.push(request.clone());
                false
            }
        };

        let alerted = !replaced || request.renotify;
        if alerted {
            inner.alerts += 1;
        }

        tracing::info!(
            tag = %request.tag,
            title = %request.title,
            body = %request.body,
            replaced,
            alerted,
            "notification"
        );
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<(), NotificationError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;
        inner.visible.retain(|n| n.tag != tag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::relay::SafeData;

    fn request(tag: &str, title: &str, renotify: bool) -> NotificationRequest {
        NotificationRequest {
            title: title.to_string(),
            body: "Doctor is calling".to_string(),
            tag: tag.to_string(),
            icon: "call-start".to_string(),
            data: SafeData::new(),
            renotify,
            require_interaction: false,
        }
    }

    #[tokio::test]
    async fn same_tag_replaces() {
        let notifier = HeadlessNotifier::new();
        notifier.show(&request("incoming-call", "First", true)).await.unwrap();
        notifier.show(&request("incoming-call", "Second", true)).await.unwrap();

        let visible = notifier.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Second");
        assert_eq!(notifier.alerts(), 2);
    }

    #[tokio::test]
    async fn quiet_replacement_does_not_alert() {
        let notifier = HeadlessNotifier::new();
        notifier.show(&request("incoming-call", "First", false)).await.unwrap();
        notifier.show(&request("incoming-call", "Second", false)).await.unwrap();

        assert_eq!(notifier.alerts(), 1);
    }

    #[tokio::test]
    async fn distinct_tags_coexist() {
        let notifier = HeadlessNotifier::new();
        notifier.show(&request("call-41", "A", true)).await.unwrap();
        notifier.show(&request("call-42", "B", true)).await.unwrap();

        assert_eq!(notifier.visible().len(), 2);
        assert_eq!(notifier.get("call-42").unwrap().title, "B");
    }

    #[tokio::test]
    async fn close_removes_only_that_tag() {
        let notifier = HeadlessNotifier::new();
        notifier.show(&request("call-41", "A", true)).await.unwrap();
        notifier.show(&request("call-42", "B", true)).await.unwrap();

        notifier.close("call-41").await.unwrap();
        notifier.close("missing").await.unwrap();

        assert!(notifier.get("call-41").is_none());
        assert_eq!(notifier.visible().len(), 1);
    }
}
