//! Messages posted from the relay to open clients

use serde::{Deserialize, Serialize};

use super::payload::SafeData;

/// Envelope posted to a client window.
///
/// The marker lets the page tell relay messages apart from its other
/// message sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "marker", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "from-background-handler")]
    BackgroundMessage(SafeData),
    #[serde(rename = "from-notification-click")]
    NotificationClick(SafeData),
}

impl ClientMessage {
    pub fn payload(&self) -> &SafeData {
        match self {
            Self::BackgroundMessage(data) | Self::NotificationClick(data) => data,
        }
    }
}
