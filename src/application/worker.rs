//! Worker event dispatcher
//!
//! Owns the worker lifecycle and routes each [`WorkerEvent`] to its handler.
//! Events are handled one at a time and each handler runs to completion
//! before the dispatcher returns.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::relay::{NotificationClick, PushPayload};
use crate::domain::worker::{InvalidStateTransition, WorkerLifecycle, WorkerState};

use super::ports::{ClientQuery, Clients, Notifier};
use super::relay::{ClickOutcome, NotificationRelay, RelayError, RelayOutput};

/// Errors from event dispatch
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid state transition: {0}")]
    InvalidState(#[from] InvalidStateTransition),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Events the worker reacts to
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Push(PushPayload),
    NotificationClick(NotificationClick),
}

impl WorkerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Push(_) => "push",
            Self::NotificationClick(_) => "notificationclick",
        }
    }
}

/// Result of a dispatched event
#[derive(Debug, Clone)]
pub enum EventOutcome {
    /// `activate_now` is false when the worker waits for the old one to go
    Installed { activate_now: bool },
    Activated { claimed: usize },
    Delivered(RelayOutput),
    Clicked(ClickOutcome),
}

/// Lifecycle switches
#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    /// Activate right after install instead of waiting
    pub skip_waiting: bool,
    /// Take control of already open clients on activation
    pub claim_clients: bool,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            skip_waiting: true,
            claim_clients: true,
        }
    }
}

/// Point-in-time view of the worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub clients: usize,
    pub controlled: usize,
}

/// Background worker: lifecycle plus notification relay
pub struct ServiceWorker<N, C>
where
    N: Notifier,
    C: Clients,
{
    relay: NotificationRelay<N, C>,
    lifecycle: Mutex<WorkerLifecycle>,
    options: WorkerOptions,
}

impl<N, C> ServiceWorker<N, C>
where
    N: Notifier,
    C: Clients,
{
    pub fn new(relay: NotificationRelay<N, C>, options: WorkerOptions) -> Self {
        Self {
            relay,
            lifecycle: Mutex::new(WorkerLifecycle::new()),
            options,
        }
    }

    pub fn relay(&self) -> &NotificationRelay<N, C> {
        &self.relay
    }

    pub fn options(&self) -> WorkerOptions {
        self.options
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.lock().await.state()
    }

    /// Route an event to its handler and wait for it to finish
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        tracing::debug!(event = event.name(), "dispatching event");

        match event {
            WorkerEvent::Install => self.install().await,
            WorkerEvent::Activate => self.activate().await,
            WorkerEvent::Push(payload) => {
                self.lifecycle.lock().await.ensure_active("handle push")?;
                let output = self.relay.handle_background_message(&payload).await?;
                Ok(EventOutcome::Delivered(output))
            }
            WorkerEvent::NotificationClick(click) => {
                self.lifecycle.lock().await.ensure_active("handle click")?;
                let outcome = self.relay.handle_notification_click(&click).await?;
                Ok(EventOutcome::Clicked(outcome))
            }
        }
    }

    /// Install then, unless told to wait, activate
    pub async fn start(&self) -> Result<WorkerState, WorkerError> {
        if let EventOutcome::Installed { activate_now: true } =
            self.dispatch(WorkerEvent::Install).await?
        {
            self.dispatch(WorkerEvent::Activate).await?;
        }
        Ok(self.state().await)
    }

    async fn install(&self) -> Result<EventOutcome, WorkerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.begin_install()?;
        lifecycle.finish_install()?;

        let activate_now = self.options.skip_waiting;
        if !activate_now {
            tracing::info!("installed, waiting for the previous worker to exit");
        }
        Ok(EventOutcome::Installed { activate_now })
    }

    async fn activate(&self) -> Result<EventOutcome, WorkerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.begin_activation()?;

        let clients = self.relay.clients();
        clients.control_new_clients().await;
        let claimed = if self.options.claim_clients {
            clients.claim().await
        } else {
            0
        };

        lifecycle.finish_activation()?;
        tracing::info!(claimed, "worker activated");
        Ok(EventOutcome::Activated { claimed })
    }

    /// Stop handling events
    pub async fn retire(&self) {
        self.lifecycle.lock().await.retire();
        tracing::info!("worker retired");
    }

    pub async fn status(&self) -> WorkerStatus {
        let state = self.state().await;
        let all = self
            .relay
            .clients()
            .match_all(ClientQuery {
                client_type: None,
                include_uncontrolled: true,
            })
            .await;

        WorkerStatus {
            state,
            clients: all.len(),
            controlled: all.iter().filter(|c| c.controlled).count(),
        }
    }
}
