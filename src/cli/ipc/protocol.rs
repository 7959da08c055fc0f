//! Line-delimited JSON messages exchanged over the daemon socket

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::ports::{ClientId, ClientType};
use crate::application::{ClickOutcome, WorkerStatus};
use crate::domain::relay::{NotificationClick, PushPayload, SafeData};

/// A request line sent to the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Request {
    /// Register this connection as a client window
    Hello {
        url: String,
        #[serde(default)]
        client_type: ClientType,
        #[serde(default)]
        focused: bool,
    },
    /// Sent by a registered client when its focus changes
    FocusChanged { focused: bool },
    Push { payload: PushPayload },
    Click {
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Status,
}

impl Request {
    /// Parse one request line
    pub fn parse(line: &str) -> Result<Self, String> {
        serde_json::from_str(line).map_err(|e| format!("invalid request: {}", e))
    }

    /// Build a click request
    pub fn click(tag: &str, data: Option<Value>) -> Self {
        Self::Click {
            tag: tag.to_string(),
            data,
        }
    }
}

/// Turn the click request fields into a click event
pub fn click_event(tag: String, data: Option<&Value>) -> NotificationClick {
    NotificationClick::new(tag, SafeData::normalize(data))
}

/// A reply line from the daemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<ClickOutcome>,
    #[serde(flatten)]
    pub status: Option<WorkerStatus>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn client(id: ClientId) -> Self {
        Self {
            client_id: Some(id),
            ..Self::ok()
        }
    }

    pub fn clicked(outcome: ClickOutcome) -> Self {
        Self {
            click: Some(outcome),
            ..Self::ok()
        }
    }

    pub fn status(status: WorkerStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::ok()
        }
    }
}
