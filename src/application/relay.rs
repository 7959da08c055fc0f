//! Notification relay use case
//!
//! Turns an inbound background push into a system notification plus a
//! best-effort broadcast to open clients, and routes notification clicks
//! back to a client window.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::relay::{
    ClickStrategy, ClientMessage, NotificationClick, NotificationRequest, PushPayload,
    RelayPolicy, SafeData,
};

use super::ports::{
    ClientError, ClientId, ClientQuery, Clients, NotificationError, Notifier,
};

/// Errors from the relay use case
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Notification failed: {0}")]
    Notification(#[from] NotificationError),

    #[error("Client routing failed: {0}")]
    Client(#[from] ClientError),
}

/// Result of handling one background message
#[derive(Debug, Clone)]
pub struct RelayOutput {
    pub title: String,
    pub body: String,
    pub tag: String,
    /// Data attached to the notification
    pub data: SafeData,
    /// Clients that received the broadcast
    pub delivered: usize,
    /// Clients whose post failed
    pub failed: usize,
}

/// What a notification click ended up doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "target", rename_all = "kebab-case")]
pub enum ClickOutcome {
    Focused(ClientId),
    Opened(String),
}

/// Notification relay, parameterized by a [`RelayPolicy`]
pub struct NotificationRelay<N, C>
where
    N: Notifier,
    C: Clients,
{
    notifier: N,
    clients: C,
    policy: RelayPolicy,
}

impl<N, C> NotificationRelay<N, C>
where
    N: Notifier,
    C: Clients,
{
    pub fn new(notifier: N, clients: C, policy: RelayPolicy) -> Self {
        Self {
            notifier,
            clients,
            policy,
        }
    }

    pub fn policy(&self) -> &RelayPolicy {
        &self.policy
    }

    pub fn clients(&self) -> &C {
        &self.clients
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Handle a push delivered while no client is in the foreground.
    ///
    /// The broadcast runs even when the display fails; the display error is
    /// reported afterwards.
    pub async fn handle_background_message(
        &self,
        payload: &PushPayload,
    ) -> Result<RelayOutput, RelayError> {
        tracing::info!(
            message_id = payload.message_id().unwrap_or("-"),
            "received background message"
        );

        let safe = SafeData::normalize(payload.data());

        let title = self
            .policy
            .resolve_title(payload.notification_title(), &safe)
            .to_string();
        let body = self
            .policy
            .resolve_body(payload.notification_body(), &safe)
            .to_string();
        let tag = self.policy.derive_tag(&safe, Utc::now());

        // The click handler only sees the attached data, so carry the
        // sender's link along when the data has no url of its own.
        let mut attached = safe.clone();
        if attached.non_empty("url").is_none() {
            if let Some(link) = payload.link() {
                attached.insert("url", link);
            }
        }

        let request = NotificationRequest {
            title,
            body,
            tag,
            icon: payload
                .notification_icon()
                .unwrap_or(&self.policy.icon)
                .to_string(),
            data: attached,
            renotify: self.policy.renotify,
            require_interaction: self.policy.require_interaction,
        };

        let shown = self.notifier.show(&request).await;
        if let Err(e) = &shown {
            tracing::error!(tag = %request.tag, error = %e, "failed to show notification");
        }

        let (delivered, failed) = self.broadcast(ClientMessage::BackgroundMessage(safe)).await;
        shown?;

        Ok(RelayOutput {
            title: request.title,
            body: request.body,
            tag: request.tag,
            data: request.data,
            delivered,
            failed,
        })
    }

    /// Handle a click on a notification shown by this relay
    pub async fn handle_notification_click(
        &self,
        click: &NotificationClick,
    ) -> Result<ClickOutcome, RelayError> {
        tracing::debug!(tag = %click.tag, action = %click.action, "notification clicked");

        // Close first so the same notification cannot fire twice
        if let Err(e) = self.notifier.close(&click.tag).await {
            tracing::warn!(tag = %click.tag, error = %e, "failed to close notification");
        }

        let url = self.policy.click_url(&click.data).to_string();

        if self.policy.click_strategy == ClickStrategy::FocusExisting {
            if let Some(id) = self.focus_existing(&click.data).await {
                return Ok(ClickOutcome::Focused(id));
            }
        }

        self.clients.open_window(&url).await?;
        tracing::info!(url = %url, "opened window for notification click");
        Ok(ClickOutcome::Opened(url))
    }

    /// Post `message` to every window client. Returns (delivered, failed).
    async fn broadcast(&self, message: ClientMessage) -> (usize, usize) {
        let clients = self.clients.match_all(ClientQuery::all_windows()).await;
        let mut delivered = 0;
        let mut failed = 0;

        for client in clients {
            match self.clients.post_message(client.id, &message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(client = %client.id, error = %e, "client post failed");
                }
            }
        }

        tracing::debug!(delivered, failed, "broadcast finished");
        (delivered, failed)
    }

    /// Hand the click data to the first reachable client and focus it
    async fn focus_existing(&self, data: &SafeData) -> Option<ClientId> {
        let message = ClientMessage::NotificationClick(data.clone());
        let clients = self.clients.match_all(ClientQuery::all_windows()).await;

        for client in clients.into_iter().filter(|c| !c.url.is_empty()) {
            let routed = match self.clients.post_message(client.id, &message).await {
                Ok(()) => self.clients.focus(client.id).await,
                Err(e) => Err(e),
            };
            match routed {
                Ok(()) => return Some(client.id),
                Err(e) => {
                    tracing::warn!(client = %client.id, error = %e, "could not focus client");
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ClientInfo, ClientType};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockNotifier {
        shown: Mutex<Vec<NotificationRequest>>,
        closed: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn show(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
            if self.fail {
                return Err(NotificationError::SendFailed("no server".to_string()));
            }
            self.shown.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn close(&self, tag: &str) -> Result<(), NotificationError> {
            self.closed.lock().unwrap().push(tag.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockClients {
        clients: Vec<ClientInfo>,
        broken: Vec<ClientId>,
        posted: Mutex<Vec<(ClientId, ClientMessage)>>,
        focused: Mutex<Vec<ClientId>>,
        opened: Mutex<Vec<String>>,
    }

    impl MockClients {
        fn with_windows(count: usize) -> Self {
            let clients = (0..count)
                .map(|i| ClientInfo {
                    id: ClientId::new(),
                    url: format!("http://localhost:8080/tab{}", i),
                    client_type: ClientType::Window,
                    focused: false,
                    controlled: i % 2 == 0,
                })
                .collect();
            Self {
                clients,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Clients for MockClients {
        async fn match_all(&self, query: ClientQuery) -> Vec<ClientInfo> {
            self.clients
                .iter()
                .filter(|c| query.matches(c))
                .cloned()
                .collect()
        }

        async fn post_message(
            &self,
            id: ClientId,
            message: &ClientMessage,
        ) -> Result<(), ClientError> {
            if self.broken.contains(&id) {
                return Err(ClientError::Disconnected(id));
            }
            self.posted.lock().unwrap().push((id, message.clone()));
            Ok(())
        }

        async fn focus(&self, id: ClientId) -> Result<(), ClientError> {
            self.focused.lock().unwrap().push(id);
            Ok(())
        }

        async fn open_window(&self, url: &str) -> Result<(), ClientError> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn claim(&self) -> usize {
            0
        }

        async fn control_new_clients(&self) {}
    }

    fn payload(value: serde_json::Value) -> PushPayload {
        PushPayload::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn shows_notification_title_and_body() {
        let relay = NotificationRelay::new(
            MockNotifier::default(),
            MockClients::default(),
            RelayPolicy::default(),
        );

        let output = relay
            .handle_background_message(&payload(json!({
                "notification": {"title": "Call", "body": "Ring"},
                "data": {"x": 42, "title": "ignored"}
            })))
            .await
            .unwrap();

        assert_eq!(output.title, "Call");
        assert_eq!(output.body, "Ring");
        assert_eq!(output.tag, "incoming-call");
        assert_eq!(output.data.get("x"), Some("42"));

        let shown = relay.notifier().shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].renotify);
        assert!(!shown[0].require_interaction);
        assert_eq!(shown[0].icon, "call-start");
    }

    #[tokio::test]
    async fn broadcasts_to_every_window_including_uncontrolled() {
        let relay = NotificationRelay::new(
            MockNotifier::default(),
            MockClients::with_windows(3),
            RelayPolicy::default(),
        );

        let output = relay
            .handle_background_message(&payload(json!({"data": {"appointment_id": "41"}})))
            .await
            .unwrap();

        assert_eq!(output.delivered, 3);
        assert_eq!(output.failed, 0);
        let posted = relay.clients().posted.lock().unwrap();
        assert!(posted.iter().all(|(_, m)| matches!(
            m,
            ClientMessage::BackgroundMessage(d) if d.get("appointment_id") == Some("41")
        )));
    }

    #[tokio::test]
    async fn failed_post_does_not_stop_broadcast() {
        let mut clients = MockClients::with_windows(3);
        clients.broken = vec![clients.clients[0].id];
        let relay = NotificationRelay::new(MockNotifier::default(), clients, RelayPolicy::default());

        let output = relay
            .handle_background_message(&payload(json!({})))
            .await
            .unwrap();

        assert_eq!(output.delivered, 2);
        assert_eq!(output.failed, 1);
    }

    #[tokio::test]
    async fn display_failure_still_broadcasts() {
        let notifier = MockNotifier {
            fail: true,
            ..Default::default()
        };
        let relay =
            NotificationRelay::new(notifier, MockClients::with_windows(2), RelayPolicy::default());

        let result = relay.handle_background_message(&payload(json!({}))).await;

        assert!(matches!(result, Err(RelayError::Notification(_))));
        assert_eq!(relay.clients().posted.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn link_becomes_click_url() {
        let relay = NotificationRelay::new(
            MockNotifier::default(),
            MockClients::default(),
            RelayPolicy::default(),
        );

        let output = relay
            .handle_background_message(&payload(json!({
                "data": {"room": "appt_41"},
                "fcmOptions": {"link": "/call/41"}
            })))
            .await
            .unwrap();

        assert_eq!(output.data.get("url"), Some("/call/41"));
    }

    #[tokio::test]
    async fn broadcast_carries_data_as_sent() {
        let relay = NotificationRelay::new(
            MockNotifier::default(),
            MockClients::with_windows(1),
            RelayPolicy::default(),
        );

        relay
            .handle_background_message(&payload(json!({
                "data": {"room": "appt_41"},
                "fcmOptions": {"link": "/call/41"}
            })))
            .await
            .unwrap();

        let posted = relay.clients().posted.lock().unwrap();
        assert_eq!(posted[0].1.payload().get("url"), None);
        assert_eq!(posted[0].1.payload().get("room"), Some("appt_41"));
    }

    #[tokio::test]
    async fn click_focuses_existing_client() {
        let relay = NotificationRelay::new(
            MockNotifier::default(),
            MockClients::with_windows(2),
            RelayPolicy::default(),
        );
        let first = relay.clients().clients[0].id;
        let data: SafeData = [("appointment_id", "41")].into_iter().collect();

        let outcome = relay
            .handle_notification_click(&NotificationClick::new("incoming-call", data.clone()))
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Focused(first));
        assert_eq!(*relay.clients().focused.lock().unwrap(), vec![first]);
        assert!(relay.clients().opened.lock().unwrap().is_empty());
        assert_eq!(
            relay.clients().posted.lock().unwrap()[0],
            (first, ClientMessage::NotificationClick(data))
        );
        assert_eq!(
            *relay.notifier().closed.lock().unwrap(),
            vec!["incoming-call".to_string()]
        );
    }

    #[tokio::test]
    async fn click_skips_unreachable_client() {
        let mut clients = MockClients::with_windows(2);
        clients.broken = vec![clients.clients[0].id];
        let second = clients.clients[1].id;
        let relay = NotificationRelay::new(MockNotifier::default(), clients, RelayPolicy::default());

        let outcome = relay
            .handle_notification_click(&NotificationClick::new("incoming-call", SafeData::new()))
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Focused(second));
    }

    #[tokio::test]
    async fn click_without_clients_opens_data_url() {
        let relay = NotificationRelay::new(
            MockNotifier::default(),
            MockClients::default(),
            RelayPolicy::default(),
        );
        let data: SafeData = [("url", "/appointments/41")].into_iter().collect();

        let outcome = relay
            .handle_notification_click(&NotificationClick::new("incoming-call", data))
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Opened("/appointments/41".to_string()));
        assert_eq!(relay.clients().opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_url_strategy_ignores_clients() {
        let policy = RelayPolicy {
            click_strategy: ClickStrategy::OpenUrl,
            ..RelayPolicy::default()
        };
        let relay = NotificationRelay::new(MockNotifier::default(), MockClients::with_windows(2), policy);

        let outcome = relay
            .handle_notification_click(&NotificationClick::new("call-41", SafeData::new()))
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Opened("/".to_string()));
        assert!(relay.clients().focused.lock().unwrap().is_empty());
        assert!(relay.clients().posted.lock().unwrap().is_empty());
    }
}
