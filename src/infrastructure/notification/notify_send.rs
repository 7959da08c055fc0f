//! notify-send notification adapter
//!
//! notify-send can replace a notification by id but cannot close one, so
//! closing goes through `gdbus` and the notification server's
//! `CloseNotification` method.

use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::process::Command;

use super::tags::TagRegistry;
use super::APP_NAME;
use crate::application::ports::{NotificationError, Notifier};
use crate::domain::relay::NotificationRequest;

const NOTIFICATIONS_DEST: &str = "org.freedesktop.Notifications";
const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
const CLOSE_METHOD: &str = "org.freedesktop.Notifications.CloseNotification";

/// External program plus leading arguments
#[derive(Debug, Clone)]
struct Tool {
    program: String,
    args: Vec<String>,
}

impl Tool {
    fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// notify-send notification adapter
pub struct NotifySendNotifier {
    /// Application name for notifications
    app_name: String,
    /// Server id printed by notify-send, per tag
    ids: Mutex<TagRegistry<()>>,
    show_tool: Tool,
    close_tool: Tool,
}

impl NotifySendNotifier {
    /// Create a new notify-send notifier
    pub fn new() -> Self {
        Self::with_app_name(APP_NAME)
    }

    /// Create with custom app name
    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ids: Mutex::new(TagRegistry::new()),
            show_tool: Tool::new("notify-send"),
            close_tool: Tool::new("gdbus"),
        }
    }

    fn build_args(&self, request: &NotificationRequest, replace_id: Option<u32>) -> Vec<String> {
        let mut args = vec![
            "--app-name".to_string(),
            self.app_name.clone(),
            "--icon".to_string(),
            request.icon.clone(),
            "--print-id".to_string(),
        ];

        if let Some(id) = replace_id {
            args.push("--replace-id".to_string());
            args.push(id.to_string());
            if request.renotify {
                args.push("--hint".to_string());
                args.push("string:sound-name:message-new-instant".to_string());
            }
        }

        if request.require_interaction {
            args.extend(["--urgency".to_string(), "critical".to_string()]);
            args.extend(["--expire-time".to_string(), "0".to_string()]);
        }

        args.push(request.title.clone());
        args.push(request.body.clone());
        args
    }

    fn replace_id(&self, tag: &str) -> Option<u32> {
        self.ids.lock().ok().and_then(|ids| ids.id(tag))
    }
}

fn close_args(id: u32) -> Vec<String> {
    vec![
        "call".to_string(),
        "--session".to_string(),
        "--dest".to_string(),
        NOTIFICATIONS_DEST.to_string(),
        "--object-path".to_string(),
        NOTIFICATIONS_PATH.to_string(),
        "--method".to_string(),
        CLOSE_METHOD.to_string(),
        id.to_string(),
    ]
}

impl Default for NotifySendNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotifySendNotifier {
    async fn show(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        let replace_id = self.replace_id(&request.tag);

        let output = self
            .show_tool
            .command()
            .args(self.build_args(request, replace_id))
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    NotificationError::NotifySendNotFound
                } else {
                    NotificationError::SendFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            return Err(NotificationError::SendFailed(format!(
                "notify-send exited with status: {}",
                output.status
            )));
        }

        // Older notify-send builds ignore --print-id
        if let Ok(id) = String::from_utf8_lossy(&output.stdout).trim().parse::<u32>() {
            if let Ok(mut ids) = self.ids.lock() {
                ids.record(&request.tag, id, request.data.clone(), (), false);
            }
        }

        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<(), NotificationError> {
        let Some(id) = self.replace_id(tag) else {
            return Ok(());
        };

        let status = self
            .close_tool
            .command()
            .args(close_args(id))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        // On failure the id is kept, so the next show still replaces it
        match status {
            Ok(status) if status.success() => {
                if let Ok(mut ids) = self.ids.lock() {
                    ids.closed(tag, id);
                }
                tracing::debug!(tag, id, "notification closed");
            }
            Ok(status) => {
                tracing::warn!(tag, id, %status, "CloseNotification failed");
            }
            Err(e) => {
                tracing::warn!(tag, id, error = %e, "could not run {}", self.close_tool.program);
            }
        }
        Ok(())
    }
}
