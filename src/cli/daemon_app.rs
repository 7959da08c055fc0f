//! Daemon app runner

use std::process::ExitCode;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::application::ports::{Clients, Notifier};
use crate::application::{
    EventOutcome, NotificationRelay, ServiceWorker, WorkerEvent, WorkerOptions,
};
use crate::domain::config::AppConfig;
use crate::infrastructure::{create_notifier, ClientHub};

use super::app::{browser_launcher, notifier_kind, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
use super::ipc::{create_ipc_server, IpcServer};
use super::pid_file::{is_alive, PidFile};
use super::presenter::Presenter;
use super::signals::{forward_clicks, DaemonSignal, DaemonSignalHandler};

/// How often a waiting daemon checks whether its predecessor is gone
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Run daemon mode
pub async fn run_daemon(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let kind = match notifier_kind(&config) {
        Ok(kind) => kind,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let policy = match config.relay_policy() {
        Ok(policy) => policy,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match config.credentials().install() {
        Ok(credentials) => {
            tracing::info!(project = %credentials.describe(), "project credentials installed");
        }
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    }

    // Setup signal handler (returns handler + sender for socket server)
    let (mut signals, signal_tx) = match DaemonSignalHandler::new().await {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let (click_tx, click_rx) = mpsc::unbounded_channel();
    forward_clicks(click_rx, signal_tx.clone());

    let hub = ClientHub::new(browser_launcher(&config));
    let relay = NotificationRelay::new(
        create_notifier(kind, Some(click_tx)),
        hub.clone(),
        policy,
    );

    let mut pid_file = PidFile::new();
    let previous = pid_file.is_running();
    let worker = ServiceWorker::new(
        relay,
        WorkerOptions {
            skip_waiting: previous.is_none() || config.skip_waiting_or_default(),
            claim_clients: config.claim_clients_or_default(),
        },
    );

    let activate_now = match worker.dispatch(WorkerEvent::Install).await {
        Ok(EventOutcome::Installed { activate_now }) => activate_now,
        Ok(_) => true,
        Err(e) => {
            presenter.error(&format!("Install failed: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Some(pid) = previous {
        if activate_now {
            presenter.info(&format!("Taking over from daemon (PID: {})", pid));
            if let Err(e) = pid_file.take_over(pid).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
        } else {
            presenter.info(&format!(
                "Installed, waiting for daemon (PID: {}) to exit",
                pid
            ));
            if !wait_for_exit(pid, &mut signals).await {
                worker.retire().await;
                return ExitCode::from(EXIT_SUCCESS);
            }
        }
    }

    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let mut server = create_ipc_server();
    if let Err(e) = server.bind() {
        presenter.error(&format!("Failed to bind socket: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }
    let socket = server.path();

    match worker.dispatch(WorkerEvent::Activate).await {
        Ok(EventOutcome::Activated { claimed }) => {
            tracing::debug!(claimed, "activation finished");
        }
        Ok(_) => {}
        Err(e) => {
            presenter.error(&format!("Activation failed: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    }

    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(signal_tx, hub).await {
            tracing::error!(error = %e, "socket server stopped");
        }
    });

    presenter.daemon_status(&worker.status().await);
    presenter.info(&format!(
        "PID: {} | Socket: {} | SIGINT: exit",
        std::process::id(),
        socket
    ));

    let result = daemon_loop(&worker, &mut signals, &presenter).await;

    worker.retire().await;
    // Dropping the aborted server removes the socket file
    server_task.abort();
    let _ = server_task.await;
    let _ = pid_file.release();

    if result {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Wait until `pid` is gone. Returns false if told to shut down first.
async fn wait_for_exit(pid: u32, signals: &mut DaemonSignalHandler) -> bool {
    loop {
        tokio::select! {
            signal = signals.recv() => match signal {
                Some(DaemonSignal::Shutdown) | None => return false,
                Some(other) => tracing::debug!(?other, "ignoring signal while waiting"),
            },
            _ = tokio::time::sleep(WAIT_POLL_INTERVAL) => {
                if !is_alive(pid) {
                    return true;
                }
            }
        }
    }
}

async fn daemon_loop<N, C>(
    worker: &ServiceWorker<N, C>,
    signals: &mut DaemonSignalHandler,
    presenter: &Presenter,
) -> bool
where
    N: Notifier,
    C: Clients,
{
    loop {
        let event = match signals.recv().await {
            Some(DaemonSignal::Push(payload)) => WorkerEvent::Push(payload),
            Some(DaemonSignal::Click(click)) => WorkerEvent::NotificationClick(click),
            Some(DaemonSignal::ControlClick(click, reply)) => {
                let result = match worker.dispatch(WorkerEvent::NotificationClick(click)).await {
                    Ok(EventOutcome::Clicked(outcome)) => {
                        presenter.click_outcome(&outcome);
                        Ok(outcome)
                    }
                    Ok(other) => Err(format!("unexpected outcome: {:?}", other)),
                    Err(e) => {
                        tracing::error!(error = %e, "control click failed");
                        Err(e.to_string())
                    }
                };
                let _ = reply.send(result);
                continue;
            }
            Some(DaemonSignal::Status(reply)) => {
                let _ = reply.send(worker.status().await);
                continue;
            }
            Some(DaemonSignal::Shutdown) => {
                presenter.info("Shutting down...");
                return true;
            }
            None => return false,
        };

        let name = event.name();
        match worker.dispatch(event).await {
            Ok(EventOutcome::Delivered(output)) => {
                tracing::info!(
                    tag = %output.tag,
                    title = %output.title,
                    delivered = output.delivered,
                    failed = output.failed,
                    "push handled"
                );
            }
            Ok(EventOutcome::Clicked(outcome)) => {
                tracing::info!(?outcome, "click handled");
                presenter.click_outcome(&outcome);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(event = name, error = %e, "event failed");
                presenter.error(&format!("{} failed: {}", name, e));
            }
        }
    }
}
