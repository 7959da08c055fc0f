//! In-process registry of connected client windows
//!
//! Each client owns the receiving end of an unbounded channel. The IPC
//! server forwards frames from that channel to the client's connection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::browser::BrowserLauncher;
use crate::application::ports::{
    ClientError, ClientId, ClientInfo, ClientQuery, ClientType, Clients,
};
use crate::domain::relay::ClientMessage;

/// Frame pushed to a connected client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HubFrame {
    Message { message: ClientMessage },
    /// Bring the window to the foreground
    Focus,
}

struct Entry {
    info: ClientInfo,
    tx: mpsc::UnboundedSender<HubFrame>,
}

#[derive(Default)]
struct HubState {
    /// Connection order
    clients: Vec<Entry>,
    control_new: bool,
}

/// Shared client registry. Clones refer to the same registry.
#[derive(Clone, Default)]
pub struct ClientHub {
    state: Arc<Mutex<HubState>>,
    browser: Arc<BrowserLauncher>,
}

impl ClientHub {
    pub fn new(browser: BrowserLauncher) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState::default())),
            browser: Arc::new(browser),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a client. Frames for it arrive on the returned receiver.
    pub fn register(
        &self,
        url: impl Into<String>,
        client_type: ClientType,
        focused: bool,
    ) -> (ClientId, mpsc::UnboundedReceiver<HubFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let info = ClientInfo {
            id: ClientId::new(),
            url: url.into(),
            client_type,
            focused,
            controlled: state.control_new,
        };
        let id = info.id;
        tracing::info!(client = %id, url = %info.url, controlled = info.controlled, "client connected");
        state.clients.push(Entry { info, tx });
        (id, rx)
    }

    pub fn unregister(&self, id: ClientId) {
        let mut state = self.lock();
        let before = state.clients.len();
        state.clients.retain(|e| e.info.id != id);
        if state.clients.len() != before {
            tracing::info!(client = %id, "client disconnected");
        }
    }

    /// Record a focus change reported by the client
    pub fn set_focused(&self, id: ClientId, focused: bool) -> Result<(), ClientError> {
        let mut state = self.lock();
        let entry = state
            .clients
            .iter_mut()
            .find(|e| e.info.id == id)
            .ok_or(ClientError::UnknownClient(id))?;
        entry.info.focused = focused;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send a frame, dropping the client if its connection is gone
    fn send(&self, id: ClientId, frame: HubFrame) -> Result<(), ClientError> {
        let mut state = self.lock();
        let pos = state
            .clients
            .iter()
            .position(|e| e.info.id == id)
            .ok_or(ClientError::UnknownClient(id))?;

        if state.clients[pos].tx.send(frame).is_err() {
            state.clients.remove(pos);
            return Err(ClientError::Disconnected(id));
        }
        Ok(())
    }
}

#[async_trait]
impl Clients for ClientHub {
    async fn match_all(&self, query: ClientQuery) -> Vec<ClientInfo> {
        let mut state = self.lock();
        state.clients.retain(|e| !e.tx.is_closed());
        state
            .clients
            .iter()
            .map(|e| &e.info)
            .filter(|info| query.matches(info))
            .cloned()
            .collect()
    }

    async fn post_message(&self, id: ClientId, message: &ClientMessage) -> Result<(), ClientError> {
        self.send(
            id,
            HubFrame::Message {
                message: message.clone(),
            },
        )
    }

    async fn focus(&self, id: ClientId) -> Result<(), ClientError> {
        self.send(id, HubFrame::Focus)?;
        let mut state = self.lock();
        for entry in state.clients.iter_mut() {
            entry.info.focused = entry.info.id == id;
        }
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), ClientError> {
        self.browser.open(url).await
    }

    async fn claim(&self) -> usize {
        let mut state = self.lock();
        let mut claimed = 0;
        for entry in state.clients.iter_mut().filter(|e| !e.info.controlled) {
            entry.info.controlled = true;
            claimed += 1;
        }
        claimed
    }

    async fn control_new_clients(&self) {
        self.lock().control_new = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::relay::SafeData;

    #[tokio::test]
    async fn match_all_keeps_connection_order() {
        let hub = ClientHub::default();
        let (a, _ra) = hub.register("http://localhost/a", ClientType::Window, false);
        let (b, _rb) = hub.register("http://localhost/b", ClientType::Window, true);
        let (_w, _rw) = hub.register("", ClientType::Worker, false);

        let windows = hub.match_all(ClientQuery::all_windows()).await;
        let ids: Vec<_> = windows.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(windows[1].focused);
    }

    #[tokio::test]
    async fn post_message_reaches_receiver() {
        let hub = ClientHub::default();
        let (id, mut rx) = hub.register("http://localhost/", ClientType::Window, false);
        let data: SafeData = [("room", "appt_41")].into_iter().collect();

        hub.post_message(id, &ClientMessage::BackgroundMessage(data.clone()))
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            HubFrame::Message {
                message: ClientMessage::BackgroundMessage(data)
            }
        );
    }

    #[tokio::test]
    async fn dropped_receiver_is_disconnected() {
        let hub = ClientHub::default();
        let (id, rx) = hub.register("http://localhost/", ClientType::Window, false);
        drop(rx);

        let result = hub
            .post_message(id, &ClientMessage::BackgroundMessage(SafeData::new()))
            .await;

        assert!(matches!(result, Err(ClientError::Disconnected(_))));
        assert!(hub.is_empty());
    }

    #[tokio::test]
    async fn unknown_client() {
        let hub = ClientHub::default();
        let result = hub.focus(ClientId::new()).await;
        assert!(matches!(result, Err(ClientError::UnknownClient(_))));
    }

    #[tokio::test]
    async fn focus_moves_focus_flag() {
        let hub = ClientHub::default();
        let (a, _ra) = hub.register("http://localhost/a", ClientType::Window, true);
        let (b, mut rb) = hub.register("http://localhost/b", ClientType::Window, false);

        hub.focus(b).await.unwrap();

        assert_eq!(rb.recv().await.unwrap(), HubFrame::Focus);
        let clients = hub.match_all(ClientQuery::all_windows()).await;
        assert!(!clients.iter().find(|c| c.id == a).unwrap().focused);
        assert!(clients.iter().find(|c| c.id == b).unwrap().focused);
    }

    #[tokio::test]
    async fn claim_and_control_new_clients() {
        let hub = ClientHub::default();
        let (_a, _ra) = hub.register("http://localhost/a", ClientType::Window, false);
        let (_b, _rb) = hub.register("http://localhost/b", ClientType::Window, false);

        assert_eq!(hub.claim().await, 2);
        assert_eq!(hub.claim().await, 0);

        let (_c, _rc) = hub.register("http://localhost/c", ClientType::Window, false);
        let controlled_only = ClientQuery {
            client_type: None,
            include_uncontrolled: false,
        };
        assert_eq!(hub.match_all(controlled_only).await.len(), 2);

        hub.control_new_clients().await;
        let (_d, _rd) = hub.register("http://localhost/d", ClientType::Window, false);
        assert_eq!(hub.match_all(controlled_only).await.len(), 3);
    }

    #[test]
    fn frames_serialize_with_type_tag() {
        let frame = HubFrame::Message {
            message: ClientMessage::BackgroundMessage([("x", "1")].into_iter().collect()),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["message"]["marker"], "from-background-handler");
        assert_eq!(json["message"]["payload"]["x"], "1");

        let focus = serde_json::to_string(&HubFrame::Focus).unwrap();
        assert_eq!(focus, r#"{"type":"focus"}"#);
    }

    #[tokio::test]
    async fn set_focused_and_unregister() {
        let hub = ClientHub::default();
        let (id, _rx) = hub.register("http://localhost/", ClientType::Window, false);

        hub.set_focused(id, true).unwrap();
        assert!(hub.match_all(ClientQuery::all_windows()).await[0].focused);

        hub.unregister(id);
        assert!(hub.set_focused(id, false).is_err());
    }
}
