//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod clients;
pub mod config;
pub mod notifier;

// Re-export common types
pub use clients::{ClientError, ClientId, ClientInfo, ClientQuery, ClientType, Clients};
pub use config::ConfigStore;
pub use notifier::{NotificationError, Notifier};
