//! Daemon socket integration tests
#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use gateway_relay::application::ports::Clients;
use gateway_relay::application::{ClickOutcome, WorkerStatus};
use gateway_relay::cli::ipc::{
    IpcClient, IpcServer, Request, Response, SocketPath, UnixSocketClient, UnixSocketServer,
};
use gateway_relay::cli::signals::DaemonSignal;
use gateway_relay::domain::relay::ClientMessage;
use gateway_relay::domain::{SafeData, WorkerState};
use gateway_relay::infrastructure::{ClientHub, HubFrame};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Bind a server in `dir` and run it in the background
fn start_server(dir: &Path, hub: ClientHub) -> (SocketPath, mpsc::Receiver<DaemonSignal>) {
    let path = SocketPath::with_path(dir.join("relay.sock"));
    let mut server = UnixSocketServer::new(path.clone());
    server.bind().expect("bind socket");

    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let _ = server.run(tx, hub).await;
    });

    (path, rx)
}

async fn send_line(stream: &mut UnixStream, line: &str) {
    stream.write_all(line.as_bytes()).await.unwrap();
    stream.write_all(b"\n").await.unwrap();
}

#[tokio::test]
async fn push_request_is_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let (path, mut rx) = start_server(dir.path(), ClientHub::default());
    let client = UnixSocketClient::new(path);

    assert!(client.is_daemon_running());

    let payload = r#"{"data":{"appointment_id":"41"}}"#.parse().unwrap();
    let response = client.request(&Request::Push { payload }).await.unwrap();
    assert!(response.ok);

    match tokio::time::timeout(TIMEOUT, rx.recv()).await.unwrap() {
        Some(DaemonSignal::Push(payload)) => {
            assert_eq!(payload.data().unwrap()["appointment_id"], "41");
        }
        other => panic!("unexpected signal: {:?}", other),
    }
}

#[tokio::test]
async fn click_request_reports_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let (path, mut rx) = start_server(dir.path(), ClientHub::default());

    let handler = tokio::spawn(async move {
        match rx.recv().await {
            Some(DaemonSignal::ControlClick(click, reply)) => {
                assert_eq!(click.tag, "incoming-call");
                assert_eq!(click.data.get("room"), Some("7"));
                let _ = reply.send(Ok(ClickOutcome::Opened("/call/7".to_string())));
            }
            other => panic!("unexpected signal: {:?}", other),
        }
    });

    let client = UnixSocketClient::new(path);
    let request = Request::click("incoming-call", Some(serde_json::json!({"room": 7})));
    let response = client.request(&request).await.unwrap();
    handler.await.unwrap();

    assert!(response.ok);
    assert_eq!(response.click, Some(ClickOutcome::Opened("/call/7".to_string())));
}

#[tokio::test]
async fn failed_click_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (path, mut rx) = start_server(dir.path(), ClientHub::default());

    tokio::spawn(async move {
        if let Some(DaemonSignal::ControlClick(_, reply)) = rx.recv().await {
            let _ = reply.send(Err("Failed to open window: xdg-open not found".to_string()));
        }
    });

    let client = UnixSocketClient::new(path);
    let response = client.request(&Request::click("incoming-call", None)).await.unwrap();

    assert!(!response.ok);
    assert!(response.error.unwrap().contains("xdg-open"));
}

#[tokio::test]
async fn status_is_answered_by_daemon_loop() {
    let dir = tempfile::tempdir().unwrap();
    let (path, mut rx) = start_server(dir.path(), ClientHub::default());

    tokio::spawn(async move {
        if let Some(DaemonSignal::Status(reply)) = rx.recv().await {
            let _ = reply.send(WorkerStatus {
                state: WorkerState::Activated,
                clients: 2,
                controlled: 1,
            });
        }
    });

    let client = UnixSocketClient::new(path);
    let response = client.request(&Request::Status).await.unwrap();

    assert!(response.ok);
    let status = response.status.expect("status in reply");
    assert_eq!(status.state, WorkerState::Activated);
    assert_eq!(status.clients, 2);
    assert_eq!(status.controlled, 1);
}

#[tokio::test]
async fn status_fails_when_loop_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    let (path, rx) = start_server(dir.path(), ClientHub::default());
    drop(rx);

    let client = UnixSocketClient::new(path);
    let response = client.request(&Request::Status).await.unwrap();

    assert!(!response.ok);
    assert!(response.error.unwrap().contains("shutting down"));
}

#[tokio::test]
async fn malformed_line_gets_error_reply() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _rx) = start_server(dir.path(), ClientHub::default());

    let mut stream = UnixStream::connect(path.path()).await.unwrap();
    send_line(&mut stream, "not json").await;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();

    let response: Response = serde_json::from_str(&line).unwrap();
    assert!(!response.ok);
    assert!(response.error.unwrap().starts_with("invalid request"));
}

#[tokio::test]
async fn hello_registers_client_and_streams_frames() {
    let dir = tempfile::tempdir().unwrap();
    let hub = ClientHub::default();
    let (path, _rx) = start_server(dir.path(), hub.clone());

    let mut stream = UnixStream::connect(path.path()).await.unwrap();
    send_line(&mut stream, r#"{"type":"hello","url":"https://clinic.example/call"}"#).await;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    let response: Response = serde_json::from_str(&line).unwrap();
    let id = response.client_id.expect("client id in reply");

    assert_eq!(hub.len(), 1);

    let data: SafeData = [("appointment_id", "41")].into_iter().collect();
    let message = ClientMessage::BackgroundMessage(data);
    hub.post_message(id, &message).await.unwrap();

    line.clear();
    tokio::time::timeout(TIMEOUT, reader.read_line(&mut line))
        .await
        .unwrap()
        .unwrap();
    let frame: HubFrame = serde_json::from_str(&line).unwrap();
    assert_eq!(frame, HubFrame::Message { message });

    hub.focus(id).await.unwrap();
    line.clear();
    tokio::time::timeout(TIMEOUT, reader.read_line(&mut line))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::from_str::<HubFrame>(&line).unwrap(), HubFrame::Focus);
}

#[tokio::test]
async fn closing_connection_unregisters_client() {
    let dir = tempfile::tempdir().unwrap();
    let hub = ClientHub::default();
    let (path, _rx) = start_server(dir.path(), hub.clone());

    let mut stream = UnixStream::connect(path.path()).await.unwrap();
    send_line(&mut stream, r#"{"type":"hello","url":"/"}"#).await;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(hub.len(), 1);

    drop(reader);

    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while !hub.is_empty() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(hub.is_empty());
}

#[tokio::test]
async fn focus_changed_before_hello_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _rx) = start_server(dir.path(), ClientHub::default());

    let mut stream = UnixStream::connect(path.path()).await.unwrap();
    send_line(&mut stream, r#"{"type":"focus-changed","focused":true}"#).await;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();

    let response: Response = serde_json::from_str(&line).unwrap();
    assert!(!response.ok);
}
