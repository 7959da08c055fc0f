//! Daemon command handler - sends commands to running daemon via IPC

use serde_json::Value;

use super::app::read_payload;
use super::args::DaemonAction;
use super::ipc::{create_ipc_client, IpcClient, Request};
use super::presenter::Presenter;

/// Handle daemon subcommand
pub async fn handle_daemon_command(
    action: DaemonAction,
    presenter: &Presenter,
) -> Result<(), String> {
    let client = create_ipc_client();
    send_daemon_command(client.as_ref(), action, presenter).await
}

/// Send `action` through `client` and report the reply
pub async fn send_daemon_command(
    client: &dyn IpcClient,
    action: DaemonAction,
    presenter: &Presenter,
) -> Result<(), String> {
    if !client.is_daemon_running() {
        return Err("No daemon running. Start with: gateway-relay --daemon".to_string());
    }

    let request = build_request(&action)?;

    let response = client
        .request(&request)
        .await
        .map_err(|e| format!("Failed to communicate with daemon: {}", e))?;

    if !response.ok {
        return Err(response
            .error
            .unwrap_or_else(|| "Daemon reported an unknown error".to_string()));
    }

    match action {
        DaemonAction::Status => match response.status {
            Some(status) => presenter.daemon_status(&status),
            None => return Err("Daemon reply had no status".to_string()),
        },
        DaemonAction::Push { .. } => presenter.success("Push queued"),
        DaemonAction::Click { .. } => match response.click {
            Some(outcome) => presenter.click_outcome(&outcome),
            None => return Err("Daemon reply had no click outcome".to_string()),
        },
    }

    Ok(())
}

fn build_request(action: &DaemonAction) -> Result<Request, String> {
    match action {
        DaemonAction::Push { payload } => Ok(Request::Push {
            payload: read_payload(payload)?,
        }),
        DaemonAction::Click { tag, data } => {
            let data = data.as_deref().map(parse_click_data).transpose()?;
            Ok(Request::click(tag, data))
        }
        DaemonAction::Status => Ok(Request::Status),
    }
}

fn parse_click_data(raw: &str) -> Result<Value, String> {
    match serde_json::from_str(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("Click data must be a JSON object".to_string()),
        Err(e) => Err(format!("Invalid click data: {}", e)),
    }
}
