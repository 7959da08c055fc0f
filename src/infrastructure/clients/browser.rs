//! Opens new client windows in the user's browser

use std::process::Stdio;

use tokio::process::Command;

use crate::application::ports::ClientError;

#[cfg(target_os = "macos")]
const DEFAULT_BROWSER_COMMAND: &str = "open";
#[cfg(not(target_os = "macos"))]
const DEFAULT_BROWSER_COMMAND: &str = "xdg-open";

/// Launches a browser command with a resolved URL
#[derive(Debug, Clone, Default)]
pub struct BrowserLauncher {
    /// Program plus leading arguments, split on whitespace
    command: Option<String>,
    /// Origin that relative URLs are resolved against
    base_url: Option<String>,
}

impl BrowserLauncher {
    pub fn new(command: Option<String>, base_url: Option<String>) -> Self {
        Self {
            command: command.filter(|c| !c.trim().is_empty()),
            base_url: base_url.filter(|b| !b.trim().is_empty()),
        }
    }

    /// Resolve `url` against the base URL unless it is already absolute
    pub fn resolve(&self, url: &str) -> String {
        if url.contains("://") {
            return url.to_string();
        }
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    }

    fn program_and_args(&self) -> (String, Vec<String>) {
        let command = self.command.as_deref().unwrap_or(DEFAULT_BROWSER_COMMAND);
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .unwrap_or_else(|| DEFAULT_BROWSER_COMMAND.to_string());
        (program, parts.collect())
    }

    /// Open `url` in a new browser window
    pub async fn open(&self, url: &str) -> Result<(), ClientError> {
        let target = self.resolve(url);
        let (program, args) = self.program_and_args();
        tracing::debug!(program = %program, url = %target, "launching browser");

        let status = Command::new(&program)
            .args(&args)
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ClientError::OpenFailed(format!("{} not found", program))
                } else {
                    ClientError::OpenFailed(e.to_string())
                }
            })?;

        if !status.success() {
            return Err(ClientError::OpenFailed(format!(
                "{} exited with status: {}",
                program, status
            )));
        }

        Ok(())
    }
}
