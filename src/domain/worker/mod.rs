//! Worker domain module

mod credentials;
mod lifecycle;

pub use credentials::{mask_secret, ProjectCredentials};
pub use lifecycle::{InvalidStateTransition, WorkerLifecycle, WorkerState};
