//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the notification server, client windows and
//! the config file.

pub mod clients;
pub mod config;
pub mod notification;

// Re-export adapters
pub use clients::{BrowserLauncher, ClientHub, HubFrame};
pub use config::XdgConfigStore;
pub use notification::{
    create_notifier, DesktopNotifier, HeadlessNotifier, NotifierKind, NotifySendNotifier,
};
