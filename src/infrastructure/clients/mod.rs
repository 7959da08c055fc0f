//! Client window infrastructure
//!
//! The hub tracks windows connected over IPC; new windows are opened
//! through the browser launcher.

mod browser;
mod hub;

pub use browser::BrowserLauncher;
pub use hub::{ClientHub, HubFrame};
