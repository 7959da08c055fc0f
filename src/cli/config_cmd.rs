//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::relay::{ClickStrategy, TagStrategy, TitleSource};
use crate::domain::worker::{mask_secret, ProjectCredentials};
use crate::infrastructure::notification::NotifierKind;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;
    store.save(&config).await?;

    presenter.success(&format!("{} = {}", key, display_value(key, value)));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match get_value(&config, key) {
        Some(v) => presenter.output(&display_value(key, &v)),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = get_value(&config, key)
            .map(|v| display_value(key, &v))
            .unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }
    Ok(())
}

/// Secrets are masked, everything else is shown as stored
fn display_value(key: &str, value: &str) -> String {
    if key == "firebase.api_key" {
        mask_secret(value)
    } else {
        value.to_string()
    }
}

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Validate `value` and store it under `key`
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let text = Some(value.to_string());

    match key {
        "fallback_title" => config.fallback_title = text,
        "fallback_body" => config.fallback_body = text,
        "fixed_tag" => config.fixed_tag = non_empty(key, value)?,
        "tag_prefix" => config.tag_prefix = text,
        "icon" => config.icon = text,
        "default_url" => config.default_url = non_empty(key, value)?,
        "browser_command" => config.browser_command = non_empty(key, value)?,
        "title_source" => {
            let source: TitleSource = value.parse().map_err(|e| invalid(key, e))?;
            config.title_source = Some(source.to_string());
        }
        "tag_strategy" => {
            let strategy: TagStrategy = value.parse().map_err(|e| invalid(key, e))?;
            config.tag_strategy = Some(strategy.to_string());
        }
        "click_strategy" => {
            let strategy: ClickStrategy = value.parse().map_err(|e| invalid(key, e))?;
            config.click_strategy = Some(strategy.to_string());
        }
        "notifier" => {
            let kind: NotifierKind = value.parse().map_err(|e| invalid(key, e))?;
            config.notifier = Some(kind.to_string());
        }
        "base_url" => {
            if !value.contains("://") {
                return Err(invalid(key, "Value must be an absolute URL"));
            }
            config.base_url = text;
        }
        "renotify" => config.renotify = Some(parse_bool_for(key, value)?),
        "require_interaction" => config.require_interaction = Some(parse_bool_for(key, value)?),
        "skip_waiting" => config.skip_waiting = Some(parse_bool_for(key, value)?),
        "claim_clients" => config.claim_clients = Some(parse_bool_for(key, value)?),
        firebase_key => {
            let firebase = config.firebase.get_or_insert_with(ProjectCredentials::default);
            let field = match firebase_key {
                "firebase.api_key" => &mut firebase.api_key,
                "firebase.auth_domain" => &mut firebase.auth_domain,
                "firebase.project_id" => &mut firebase.project_id,
                "firebase.messaging_sender_id" => &mut firebase.messaging_sender_id,
                "firebase.app_id" => &mut firebase.app_id,
                _ => return Err(invalid(key, "Unknown key")),
            };
            *field = text;
        }
    }

    Ok(())
}

fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    let firebase = config.firebase.as_ref();
    match key {
        "fallback_title" => config.fallback_title.clone(),
        "fallback_body" => config.fallback_body.clone(),
        "title_source" => config.title_source.clone(),
        "tag_strategy" => config.tag_strategy.clone(),
        "fixed_tag" => config.fixed_tag.clone(),
        "tag_prefix" => config.tag_prefix.clone(),
        "click_strategy" => config.click_strategy.clone(),
        "default_url" => config.default_url.clone(),
        "base_url" => config.base_url.clone(),
        "renotify" => config.renotify.map(|b| b.to_string()),
        "require_interaction" => config.require_interaction.map(|b| b.to_string()),
        "icon" => config.icon.clone(),
        "notifier" => config.notifier.clone(),
        "browser_command" => config.browser_command.clone(),
        "skip_waiting" => config.skip_waiting.map(|b| b.to_string()),
        "claim_clients" => config.claim_clients.map(|b| b.to_string()),
        "firebase.api_key" => firebase.and_then(|f| f.api_key.clone()),
        "firebase.auth_domain" => firebase.and_then(|f| f.auth_domain.clone()),
        "firebase.project_id" => firebase.and_then(|f| f.project_id.clone()),
        "firebase.messaging_sender_id" => firebase.and_then(|f| f.messaging_sender_id.clone()),
        "firebase.app_id" => firebase.and_then(|f| f.app_id.clone()),
        _ => None,
    }
}

fn non_empty(key: &str, value: &str) -> Result<Option<String>, ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(key, "Value must not be empty"));
    }
    Ok(Some(value.to_string()))
}

fn parse_bool_for(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).map_err(|_| invalid(key, "Value must be 'true' or 'false'"))
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
