//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

use crate::domain::config::AppConfig;
use crate::domain::relay::{ClickStrategy, TagStrategy, TitleSource};
use crate::infrastructure::notification::NotifierKind;

/// Gateway Relay - background call notifications for the telehealth web app
#[derive(Parser, Debug)]
#[command(name = "gateway-relay")]
#[command(version)]
#[command(about = "Relays background push messages to desktop notifications and open app windows")]
#[command(long_about = None)]
pub struct Cli {
    /// Push payload as JSON, or "-" to read it from stdin
    #[arg(value_name = "PAYLOAD", conflicts_with = "daemon")]
    pub payload: Option<String>,

    /// Run as daemon (control via: gateway-relay daemon push/click/status)
    #[arg(long)]
    pub daemon: bool,

    /// Tag derivation (fixed, per-event)
    #[arg(long, value_name = "STRATEGY")]
    pub tag_strategy: Option<TagStrategy>,

    /// Click routing (focus-existing, open-url)
    #[arg(long, value_name = "STRATEGY")]
    pub click_strategy: Option<ClickStrategy>,

    /// Title fallback source (title, doctor-name)
    #[arg(long, value_name = "SOURCE")]
    pub title_source: Option<TitleSource>,

    /// Keep notifications on screen until the user acts
    #[arg(long)]
    pub require_interaction: bool,

    /// Notifier backend (desktop, notify-send, headless)
    #[arg(long, value_name = "BACKEND")]
    pub notifier: Option<NotifierKind>,

    /// Config or daemon subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Config layer holding only the flags given on the command line
    pub fn overrides(&self) -> AppConfig {
        AppConfig {
            tag_strategy: self.tag_strategy.map(|s| s.to_string()),
            click_strategy: self.click_strategy.map(|s| s.to_string()),
            title_source: self.title_source.map(|s| s.to_string()),
            require_interaction: self.require_interaction.then_some(true),
            notifier: self.notifier.map(|n| n.to_string()),
            ..AppConfig::empty()
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Send commands to running daemon
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

/// Daemon control actions
#[derive(Subcommand, Debug, Clone)]
pub enum DaemonAction {
    /// Deliver a push payload
    Push {
        /// Payload as JSON, or "-" to read it from stdin
        payload: String,
    },
    /// Simulate a click on a notification
    Click {
        /// Notification tag
        tag: String,
        /// Data attached to the notification, as a JSON object
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },
    /// Show daemon status
    Status,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "fallback_title",
    "fallback_body",
    "title_source",
    "tag_strategy",
    "fixed_tag",
    "tag_prefix",
    "click_strategy",
    "default_url",
    "base_url",
    "renotify",
    "require_interaction",
    "icon",
    "notifier",
    "browser_command",
    "skip_waiting",
    "claim_clients",
    "firebase.api_key",
    "firebase.auth_domain",
    "firebase.project_id",
    "firebase.messaging_sender_id",
    "firebase.app_id",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["gateway-relay"]);
        assert!(cli.payload.is_none());
        assert!(!cli.daemon);
        assert!(cli.tag_strategy.is_none());
        assert!(cli.click_strategy.is_none());
        assert!(!cli.require_interaction);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_payload() {
        let cli = Cli::parse_from(["gateway-relay", r#"{"data":{"x":1}}"#]);
        assert_eq!(cli.payload.as_deref(), Some(r#"{"data":{"x":1}}"#));
    }

    #[test]
    fn cli_parses_policy_flags() {
        let cli = Cli::parse_from([
            "gateway-relay",
            "--tag-strategy",
            "per-event",
            "--click-strategy",
            "open-url",
            "--title-source",
            "doctor-name",
            "--require-interaction",
            "--notifier",
            "headless",
        ]);
        assert_eq!(cli.tag_strategy, Some(TagStrategy::PerEvent));
        assert_eq!(cli.click_strategy, Some(ClickStrategy::OpenUrl));
        assert_eq!(cli.title_source, Some(TitleSource::DoctorName));
        assert!(cli.require_interaction);
        assert_eq!(cli.notifier, Some(NotifierKind::Headless));
    }

    #[test]
    fn invalid_strategy_is_rejected() {
        let result = Cli::try_parse_from(["gateway-relay", "--tag-strategy", "random"]);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_hold_only_given_flags() {
        let cli = Cli::parse_from(["gateway-relay", "--click-strategy", "open-url"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.click_strategy.as_deref(), Some("open-url"));
        assert!(overrides.tag_strategy.is_none());
        assert!(overrides.require_interaction.is_none());
        assert!(overrides.notifier.is_none());
    }

    #[test]
    fn cli_parses_daemon() {
        let cli = Cli::parse_from(["gateway-relay", "--daemon"]);
        assert!(cli.daemon);
    }

    #[test]
    fn daemon_conflicts_with_payload() {
        let result = Cli::try_parse_from(["gateway-relay", "--daemon", "{}"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_daemon_click() {
        let cli = Cli::parse_from([
            "gateway-relay",
            "daemon",
            "click",
            "call-41",
            "--data",
            r#"{"url":"/call/41"}"#,
        ]);
        if let Some(Commands::Daemon {
            action: DaemonAction::Click { tag, data },
        }) = cli.command
        {
            assert_eq!(tag, "call-41");
            assert_eq!(data.as_deref(), Some(r#"{"url":"/call/41"}"#));
        } else {
            panic!("Expected Daemon Click command");
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["gateway-relay", "config", "set", "tag_strategy", "fixed"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "tag_strategy");
            assert_eq!(value, "fixed");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("renotify"));
        assert!(is_valid_config_key("firebase.api_key"));
        assert!(!is_valid_config_key("api_key"));
        assert!(!is_valid_config_key("invalid_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
