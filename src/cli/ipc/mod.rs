//! IPC (Inter-Process Communication) module for daemon control
//!
//! Clients and control commands talk to the daemon over a Unix domain
//! socket using line-delimited JSON ([`protocol`]).

pub mod protocol;
mod unix_socket;

pub use protocol::{Request, Response};
pub use unix_socket::{SocketPath, UnixSocketClient, UnixSocketServer};

use std::io;
use tokio::sync::mpsc;

use super::signals::DaemonSignal;
use crate::infrastructure::ClientHub;

/// Trait for IPC servers that listen for daemon commands
#[async_trait::async_trait]
pub trait IpcServer: Send + Sync {
    /// Bind to the IPC endpoint
    fn bind(&mut self) -> io::Result<()>;

    /// Get the path/name of the IPC endpoint
    fn path(&self) -> String;

    /// Accept and handle connections
    ///
    /// Push, click and status requests are forwarded to `tx`. Connections
    /// that say hello are registered with `hub` and receive its frames.
    async fn run(&self, tx: mpsc::Sender<DaemonSignal>, hub: ClientHub) -> io::Result<()>;

    /// Cleanup IPC resources
    fn cleanup(&self);
}

/// Trait for IPC clients that send commands to the daemon
#[async_trait::async_trait]
pub trait IpcClient: Send + Sync {
    /// Check if daemon appears to be running (endpoint exists)
    fn is_daemon_running(&self) -> bool;

    /// Send one request and read its reply
    async fn request(&self, request: &Request) -> io::Result<Response>;
}

/// Create the IPC server at the default socket path
pub fn create_ipc_server() -> Box<dyn IpcServer> {
    Box::new(UnixSocketServer::new(SocketPath::new()))
}

/// Create an IPC client for the default socket path
pub fn create_ipc_client() -> Box<dyn IpcClient> {
    Box::new(UnixSocketClient::new(SocketPath::new()))
}
