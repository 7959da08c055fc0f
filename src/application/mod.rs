//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod ports;
pub mod relay;
pub mod worker;

// Re-export use cases
pub use relay::{ClickOutcome, NotificationRelay, RelayError, RelayOutput};
pub use worker::{
    EventOutcome, ServiceWorker, WorkerError, WorkerEvent, WorkerOptions, WorkerStatus,
};
