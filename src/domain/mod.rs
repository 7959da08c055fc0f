//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod relay;
pub mod worker;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use relay::{
    ClickStrategy, ClientMessage, NotificationClick, NotificationRequest, PushPayload,
    RelayPolicy, SafeData, TagStrategy, TitleSource,
};
pub use worker::{ProjectCredentials, WorkerLifecycle, WorkerState};
