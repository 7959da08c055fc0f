//! Signal handling for daemon mode

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, oneshot};

use crate::application::{ClickOutcome, WorkerStatus};
use crate::domain::relay::{NotificationClick, PushPayload};

/// Queue depth between the socket server and the daemon loop
const SIGNAL_QUEUE: usize = 64;

/// Result of a control click as reported back to the sender
pub type ClickReply = Result<ClickOutcome, String>;

/// Daemon signals
#[derive(Debug)]
pub enum DaemonSignal {
    /// Deliver a push
    Push(PushPayload),
    /// A notification was clicked
    Click(NotificationClick),
    /// A click sent by a control command, answered on the given channel
    ControlClick(NotificationClick, oneshot::Sender<ClickReply>),
    /// Report status on the given channel
    Status(oneshot::Sender<WorkerStatus>),
    /// Shutdown daemon (SIGINT/SIGTERM)
    Shutdown,
}

/// Daemon signal handler
///
/// Handles OS shutdown signals (SIGINT/SIGTERM) and provides a channel
/// for receiving daemon commands from other sources (e.g., socket server).
pub struct DaemonSignalHandler {
    receiver: mpsc::Receiver<DaemonSignal>,
}

impl DaemonSignalHandler {
    /// Create a new daemon signal handler and start listening for shutdown signals.
    ///
    /// Returns the handler and a sender that can be used by other sources
    /// (like a socket server) to send commands to the daemon loop.
    pub async fn new() -> Result<(Self, mpsc::Sender<DaemonSignal>), std::io::Error> {
        let (tx, rx) = mpsc::channel(SIGNAL_QUEUE);

        for (kind, name) in [
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::terminate(), "SIGTERM"),
        ] {
            let tx = tx.clone();
            let mut stream = signal(kind)?;
            tokio::spawn(async move {
                stream.recv().await;
                tracing::info!(signal = name, "received shutdown signal");
                let _ = tx.send(DaemonSignal::Shutdown).await;
            });
        }

        Ok((Self { receiver: rx }, tx))
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Option<DaemonSignal> {
        self.receiver.recv().await
    }
}

/// Forward notification clicks into the daemon loop
pub fn forward_clicks(
    mut clicks: mpsc::UnboundedReceiver<NotificationClick>,
    tx: mpsc::Sender<DaemonSignal>,
) {
    tokio::spawn(async move {
        while let Some(click) = clicks.recv().await {
            if tx.send(DaemonSignal::Click(click)).await.is_err() {
                break;
            }
        }
    });
}
