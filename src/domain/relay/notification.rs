//! Notification display requests and click events

use serde::{Deserialize, Serialize};

use super::payload::SafeData;

/// Action id reported when the notification body itself is clicked
pub const DEFAULT_ACTION: &str = "default";

/// A request to display one system notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    /// At most one notification per tag is visible
    pub tag: String,
    pub icon: String,
    /// Attached data, handed back on click
    pub data: SafeData,
    pub renotify: bool,
    pub require_interaction: bool,
}

/// A click on a displayed notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationClick {
    pub tag: String,
    #[serde(default)]
    pub data: SafeData,
    #[serde(default = "default_action")]
    pub action: String,
}

impl NotificationClick {
    /// A click on the notification body
    pub fn new(tag: impl Into<String>, data: SafeData) -> Self {
        Self {
            tag: tag.into(),
            data,
            action: DEFAULT_ACTION.to_string(),
        }
    }
}

fn default_action() -> String {
    DEFAULT_ACTION.to_string()
}
