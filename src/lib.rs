//! Gateway Relay - background call notifications for the telehealth web app
//!
//! Push messages that arrive while no app window is in the foreground are
//! turned into a desktop notification and forwarded to every open window.
//! Clicking the notification focuses an existing window or opens a new one.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Payload normalization, relay policy, worker lifecycle, errors
//! - **Application**: Use cases (relay, event dispatcher) and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (notifiers, client hub, config store)
//! - **CLI**: Command-line interface, daemon runner, IPC, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
