//! Notification infrastructure module
//!
//! Provides desktop notifications through notify-rust (primary), the
//! notify-send tool, or an in-memory headless backend.

mod headless;
mod notify_rust;
mod notify_send;
mod tags;

pub use self::notify_rust::DesktopNotifier;
pub use headless::HeadlessNotifier;
pub use notify_send::NotifySendNotifier;

use std::fmt;
use std::str::FromStr;

use tokio::sync::mpsc;

use crate::application::ports::Notifier;
use crate::domain::error::InvalidPolicyError;
use crate::domain::relay::NotificationClick;

/// Application name shown by the notification server
pub const APP_NAME: &str = "Gateway Relay";

/// Available notifier backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifierKind {
    /// notify-rust, the platform notification service
    #[default]
    Desktop,
    /// The notify-send command line tool
    NotifySend,
    /// No display, notifications are logged and kept in memory
    Headless,
}

impl NotifierKind {
    pub const VALID: &'static str = "desktop, notify-send, headless";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::NotifySend => "notify-send",
            Self::Headless => "headless",
        }
    }
}

impl fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotifierKind {
    type Err = InvalidPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "notify-send" | "notify_send" => Ok(Self::NotifySend),
            "headless" | "none" => Ok(Self::Headless),
            _ => Err(InvalidPolicyError {
                option: "notifier",
                input: s.to_string(),
                valid: Self::VALID,
            }),
        }
    }
}

/// Create a notifier backend.
///
/// Clicks on desktop notifications are forwarded to `clicks` when given.
pub fn create_notifier(
    kind: NotifierKind,
    clicks: Option<mpsc::UnboundedSender<NotificationClick>>,
) -> Box<dyn Notifier> {
    tracing::debug!(notifier = %kind, "creating notifier");
    match kind {
        NotifierKind::Desktop => {
            let notifier = DesktopNotifier::new();
            Box::new(match clicks {
                Some(tx) => notifier.with_click_sink(tx),
                None => notifier,
            })
        }
        NotifierKind::NotifySend => Box::new(NotifySendNotifier::new()),
        NotifierKind::Headless => Box::new(HeadlessNotifier::new()),
    }
}
