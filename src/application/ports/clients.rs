//! Client window port interface

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::relay::ClientMessage;

/// Client errors
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Client {0} is gone")]
    Disconnected(ClientId),

    #[error("Unknown client: {0}")]
    UnknownClient(ClientId),

    #[error("Failed to open window: {0}")]
    OpenFailed(String),
}

/// Identifier of a connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    #[default]
    Window,
    Worker,
}

/// Snapshot of one client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub id: ClientId,
    pub url: String,
    pub client_type: ClientType,
    pub focused: bool,
    /// Whether the active worker has claimed this client
    pub controlled: bool,
}

/// Filter for [`Clients::match_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientQuery {
    /// `None` matches every type
    pub client_type: Option<ClientType>,
    pub include_uncontrolled: bool,
}

impl ClientQuery {
    /// All window clients, claimed or not
    pub const fn all_windows() -> Self {
        Self {
            client_type: Some(ClientType::Window),
            include_uncontrolled: true,
        }
    }

    pub fn matches(&self, client: &ClientInfo) -> bool {
        let type_ok = self
            .client_type
            .map_or(true, |wanted| wanted == client.client_type);
        type_ok && (self.include_uncontrolled || client.controlled)
    }
}

/// Port for the set of open client windows
#[async_trait]
pub trait Clients: Send + Sync {
    /// List clients matching `query`, in connection order
    async fn match_all(&self, query: ClientQuery) -> Vec<ClientInfo>;

    /// Post a message to one client
    async fn post_message(&self, id: ClientId, message: &ClientMessage)
        -> Result<(), ClientError>;

    /// Bring a client to the foreground
    async fn focus(&self, id: ClientId) -> Result<(), ClientError>;

    /// Open a new window at `url`
    async fn open_window(&self, url: &str) -> Result<(), ClientError>;

    /// Take control of every uncontrolled client; returns how many changed
    async fn claim(&self) -> usize;

    /// Mark clients that connect from now on as controlled
    async fn control_new_clients(&self);
}
