//! Main app runner for one-shot mode

use std::env;
use std::io::{self, Read};
use std::process::ExitCode;

use crate::application::ports::ConfigStore;
use crate::application::NotificationRelay;
use crate::domain::config::AppConfig;
use crate::domain::relay::PushPayload;
use crate::domain::worker::ProjectCredentials;
use crate::infrastructure::{create_notifier, BrowserLauncher, ClientHub, NotifierKind, XdgConfigStore};

use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding `firebase.api_key`
pub const API_KEY_ENV: &str = "GATEWAY_RELAY_API_KEY";

/// Relay a single background message and print what happened
pub async fn run_oneshot(raw_payload: &str, config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let payload = match read_payload(raw_payload) {
        Ok(payload) => payload,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

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

    let relay = NotificationRelay::new(
        create_notifier(kind, None),
        ClientHub::new(browser_launcher(&config)),
        policy,
    );

    match relay.handle_background_message(&payload).await {
        Ok(output) => {
            presenter.relay_summary(&output);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Parse a payload argument; "-" reads it from stdin
pub fn read_payload(arg: &str) -> Result<PushPayload, String> {
    let text = if arg == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read payload from stdin: {}", e))?;
        buf
    } else {
        arg.to_string()
    };

    text.trim().parse().map_err(|e| format!("Invalid payload: {}", e))
}

/// Notifier backend named by the config
pub fn notifier_kind(config: &AppConfig) -> Result<NotifierKind, String> {
    config
        .notifier_or_default()
        .parse()
        .map_err(|e: crate::domain::error::InvalidPolicyError| e.to_string())
}

pub fn browser_launcher(config: &AppConfig) -> BrowserLauncher {
    BrowserLauncher::new(config.browser_command.clone(), config.base_url.clone())
}

/// Config layer built from the environment
fn env_config() -> AppConfig {
    let api_key = env::var(API_KEY_ENV).ok().filter(|s| !s.is_empty());
    AppConfig {
        firebase: api_key.map(|key| ProjectCredentials {
            api_key: Some(key),
            ..Default::default()
        }),
        ..AppConfig::empty()
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}
