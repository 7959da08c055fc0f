//! Unix Domain Socket communication for daemon control

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};

use super::protocol::{click_event, Request, Response};
use super::{IpcClient, IpcServer};
use crate::application::ports::ClientId;
use crate::cli::runtime_dir;
use crate::cli::signals::DaemonSignal;
use crate::domain::relay::NotificationClick;
use crate::infrastructure::{ClientHub, HubFrame};

const SOCKET_FILE_NAME: &str = "gateway-relay.sock";

type LineReader = Lines<BufReader<OwnedReadHalf>>;

/// Socket path resolver
#[derive(Debug, Clone)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    /// Create socket path, preferring XDG_RUNTIME_DIR
    pub fn new() -> Self {
        Self::with_path(runtime_dir().join(SOCKET_FILE_NAME))
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the socket path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if socket file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove socket file if it exists
    pub fn cleanup(&self) -> io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for SocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Unix Domain Socket server for daemon commands
pub struct UnixSocketServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl UnixSocketServer {
    /// Create a new socket server
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        if self.listener.is_some() {
            self.cleanup();
        }
    }
}

#[async_trait]
impl IpcServer for UnixSocketServer {
    fn bind(&mut self) -> io::Result<()> {
        // Remove stale socket file if it exists
        self.socket_path.cleanup()?;

        let listener = UnixListener::bind(self.socket_path.path())?;
        self.listener = Some(listener);
        Ok(())
    }

    fn path(&self) -> String {
        self.socket_path.path().to_string_lossy().to_string()
    }

    async fn run(&self, tx: mpsc::Sender<DaemonSignal>, hub: ClientHub) -> io::Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let tx = tx.clone();
                    let hub = hub.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, tx, hub).await {
                            tracing::debug!(error = %e, "socket connection error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "socket accept error");
                }
            }
        }
    }

    fn cleanup(&self) {
        let _ = self.socket_path.cleanup();
    }
}

async fn write_line<T: Serialize>(writer: &mut OwnedWriteHalf, value: &T) -> io::Result<()> {
    let mut line = serde_json::to_string(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Handle one connection: request/reply lines until it says hello
async fn handle_connection(
    stream: UnixStream,
    tx: mpsc::Sender<DaemonSignal>,
    hub: ClientHub,
) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request = match Request::parse(&line) {
            Ok(request) => request,
            Err(e) => {
                write_line(&mut writer, &Response::error(e)).await?;
                continue;
            }
        };

        let response = match request {
            Request::Hello {
                url,
                client_type,
                focused,
            } => {
                let (id, frames) = hub.register(url, client_type, focused);
                if let Err(e) = write_line(&mut writer, &Response::client(id)).await {
                    hub.unregister(id);
                    return Err(e);
                }
                return serve_client(id, lines, writer, frames, hub).await;
            }
            Request::FocusChanged { .. } => Response::error("say hello before focus-changed"),
            Request::Push { payload } => forward(&tx, DaemonSignal::Push(payload)).await,
            Request::Click { tag, data } => {
                send_click(&tx, click_event(tag, data.as_ref())).await
            }
            Request::Status => query_status(&tx).await,
        };

        write_line(&mut writer, &response).await?;
    }

    Ok(())
}

async fn forward(tx: &mpsc::Sender<DaemonSignal>, signal: DaemonSignal) -> Response {
    match tx.send(signal).await {
        Ok(()) => Response::ok(),
        Err(_) => Response::error("daemon is shutting down"),
    }
}

async fn send_click(tx: &mpsc::Sender<DaemonSignal>, click: NotificationClick) -> Response {
    let (reply_tx, reply_rx) = oneshot::channel();
    if tx.send(DaemonSignal::ControlClick(click, reply_tx)).await.is_err() {
        return Response::error("daemon is shutting down");
    }
    match reply_rx.await {
        Ok(Ok(outcome)) => Response::clicked(outcome),
        Ok(Err(e)) => Response::error(e),
        Err(_) => Response::error("daemon is shutting down"),
    }
}

async fn query_status(tx: &mpsc::Sender<DaemonSignal>) -> Response {
    let (reply_tx, reply_rx) = oneshot::channel();
    if tx.send(DaemonSignal::Status(reply_tx)).await.is_err() {
        return Response::error("daemon is shutting down");
    }
    match reply_rx.await {
        Ok(status) => Response::status(status),
        Err(_) => Response::error("daemon is shutting down"),
    }
}

/// Stream hub frames to a registered client until either side goes away
async fn serve_client(
    id: ClientId,
    mut lines: LineReader,
    mut writer: OwnedWriteHalf,
    mut frames: mpsc::UnboundedReceiver<HubFrame>,
    hub: ClientHub,
) -> io::Result<()> {
    let result = loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = write_line(&mut writer, &frame).await {
                        break Err(e);
                    }
                }
                None => break Ok(()),
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => match Request::parse(&line) {
                    Ok(Request::FocusChanged { focused }) => {
                        if let Err(e) = hub.set_focused(id, focused) {
                            tracing::debug!(client = %id, error = %e, "focus update dropped");
                        }
                    }
                    Ok(_) => tracing::warn!(client = %id, "client sent a control request"),
                    Err(e) => tracing::warn!(client = %id, error = %e, "bad client line"),
                },
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            },
        }
    };

    hub.unregister(id);
    result
}

/// Unix Domain Socket client for sending commands to daemon
pub struct UnixSocketClient {
    socket_path: SocketPath,
}

impl UnixSocketClient {
    /// Create a new socket client
    pub fn new(socket_path: SocketPath) -> Self {
        Self { socket_path }
    }
}

#[async_trait]
impl IpcClient for UnixSocketClient {
    fn is_daemon_running(&self) -> bool {
        self.socket_path.exists()
    }

    async fn request(&self, request: &Request) -> io::Result<Response> {
        let stream = UnixStream::connect(self.socket_path.path()).await?;
        let (reader, mut writer) = stream.into_split();

        write_line(&mut writer, request).await?;

        let mut reader = BufReader::new(reader);
        let mut response = String::new();
        reader.read_line(&mut response).await?;

        serde_json::from_str(&response).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
