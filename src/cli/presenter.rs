//! CLI presenter for output formatting

use colored::*;

use crate::application::{ClickOutcome, RelayOutput, WorkerStatus};

/// Presenter for CLI output formatting
#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter;

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print the result of a relayed background message
    pub fn relay_summary(&self, output: &RelayOutput) {
        self.success(&format!("Notification shown: {}", output.title));
        self.key_value("body", &output.body);
        self.key_value("tag", &output.tag);
        for (key, value) in output.data.iter() {
            self.key_value(&format!("data.{}", key), value);
        }
        if output.failed > 0 {
            self.warn(&format!(
                "Broadcast reached {} client(s), {} failed",
                output.delivered, output.failed
            ));
        } else {
            self.info(&format!("Broadcast reached {} client(s)", output.delivered));
        }
    }

    /// Print what a notification click did
    pub fn click_outcome(&self, outcome: &ClickOutcome) {
        match outcome {
            ClickOutcome::Focused(id) => self.success(&format!("Focused client {}", id)),
            ClickOutcome::Opened(url) => self.success(&format!("Opened {}", url)),
        }
    }

    /// Print daemon status
    pub fn daemon_status(&self, status: &WorkerStatus) {
        eprintln!("{} Daemon: {}", "●".cyan(), status.state);
        self.key_value("clients", &status.clients.to_string());
        self.key_value("controlled", &status.controlled.to_string());
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}
