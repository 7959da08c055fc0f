//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::relay::{
    ClickStrategy, RelayPolicy, TagStrategy, TitleSource, DEFAULT_FALLBACK_BODY,
    DEFAULT_FALLBACK_TITLE, DEFAULT_FIXED_TAG, DEFAULT_ICON, DEFAULT_TAG_PREFIX, DEFAULT_URL,
};
use crate::domain::error::InvalidPolicyError;
use crate::domain::worker::ProjectCredentials;

/// Notifier used when none is configured
pub const DEFAULT_NOTIFIER: &str = "desktop";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub fallback_title: Option<String>,
    pub fallback_body: Option<String>,
    pub title_source: Option<String>,
    pub tag_strategy: Option<String>,
    pub fixed_tag: Option<String>,
    pub tag_prefix: Option<String>,
    pub click_strategy: Option<String>,
    pub default_url: Option<String>,
    pub base_url: Option<String>,
    pub renotify: Option<bool>,
    pub require_interaction: Option<bool>,
    pub icon: Option<String>,
    pub notifier: Option<String>,
    pub browser_command: Option<String>,
    pub skip_waiting: Option<bool>,
    pub claim_clients: Option<bool>,
    pub firebase: Option<ProjectCredentials>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            fallback_title: Some(DEFAULT_FALLBACK_TITLE.to_string()),
            fallback_body: Some(DEFAULT_FALLBACK_BODY.to_string()),
            title_source: Some(TitleSource::default().to_string()),
            tag_strategy: Some(TagStrategy::default().to_string()),
            fixed_tag: Some(DEFAULT_FIXED_TAG.to_string()),
            tag_prefix: Some(DEFAULT_TAG_PREFIX.to_string()),
            click_strategy: Some(ClickStrategy::default().to_string()),
            default_url: Some(DEFAULT_URL.to_string()),
            base_url: None,
            renotify: Some(true),
            require_interaction: Some(false),
            icon: Some(DEFAULT_ICON.to_string()),
            notifier: Some(DEFAULT_NOTIFIER.to_string()),
            browser_command: None,
            skip_waiting: Some(true),
            claim_clients: Some(true),
            firebase: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            fallback_title: other.fallback_title.or(self.fallback_title),
            fallback_body: other.fallback_body.or(self.fallback_body),
            title_source: other.title_source.or(self.title_source),
            tag_strategy: other.tag_strategy.or(self.tag_strategy),
            fixed_tag: other.fixed_tag.or(self.fixed_tag),
            tag_prefix: other.tag_prefix.or(self.tag_prefix),
            click_strategy: other.click_strategy.or(self.click_strategy),
            default_url: other.default_url.or(self.default_url),
            base_url: other.base_url.or(self.base_url),
            renotify: other.renotify.or(self.renotify),
            require_interaction: other.require_interaction.or(self.require_interaction),
            icon: other.icon.or(self.icon),
            notifier: other.notifier.or(self.notifier),
            browser_command: other.browser_command.or(self.browser_command),
            skip_waiting: other.skip_waiting.or(self.skip_waiting),
            claim_clients: other.claim_clients.or(self.claim_clients),
            firebase: Self::merge_firebase(self.firebase, other.firebase),
        }
    }

    /// Merge credential sections field by field
    fn merge_firebase(
        base: Option<ProjectCredentials>,
        other: Option<ProjectCredentials>,
    ) -> Option<ProjectCredentials> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(ProjectCredentials {
                api_key: o.api_key.or(b.api_key),
                auth_domain: o.auth_domain.or(b.auth_domain),
                project_id: o.project_id.or(b.project_id),
                messaging_sender_id: o.messaging_sender_id.or(b.messaging_sender_id),
                app_id: o.app_id.or(b.app_id),
            }),
        }
    }

    /// Build the relay policy. Unset values use the defaults; a value that
    /// names no known strategy is an error.
    pub fn relay_policy(&self) -> Result<RelayPolicy, InvalidPolicyError> {
        let defaults = RelayPolicy::default();
        Ok(RelayPolicy {
            tag_strategy: parse_or_default(self.tag_strategy.as_deref())?,
            click_strategy: parse_or_default(self.click_strategy.as_deref())?,
            title_source: parse_or_default(self.title_source.as_deref())?,
            fallback_title: self
                .fallback_title
                .clone()
                .unwrap_or(defaults.fallback_title),
            fallback_body: self.fallback_body.clone().unwrap_or(defaults.fallback_body),
            fixed_tag: self.fixed_tag.clone().unwrap_or(defaults.fixed_tag),
            tag_prefix: self.tag_prefix.clone().unwrap_or(defaults.tag_prefix),
            default_url: self.default_url.clone().unwrap_or(defaults.default_url),
            icon: self.icon.clone().unwrap_or(defaults.icon),
            renotify: self.renotify.unwrap_or(defaults.renotify),
            require_interaction: self
                .require_interaction
                .unwrap_or(defaults.require_interaction),
        })
    }

    /// Get notifier backend name, or "desktop" if not set
    pub fn notifier_or_default(&self) -> &str {
        self.notifier.as_deref().unwrap_or(DEFAULT_NOTIFIER)
    }

    /// Get skip_waiting setting, or true if not set
    pub fn skip_waiting_or_default(&self) -> bool {
        self.skip_waiting.unwrap_or(true)
    }

    /// Get claim_clients setting, or true if not set
    pub fn claim_clients_or_default(&self) -> bool {
        self.claim_clients.unwrap_or(true)
    }

    /// Credential bundle, empty if not configured
    pub fn credentials(&self) -> ProjectCredentials {
        self.firebase.clone().unwrap_or_default()
    }
}

fn parse_or_default<T>(value: Option<&str>) -> Result<T, InvalidPolicyError>
where
    T: std::str::FromStr<Err = InvalidPolicyError> + Default,
{
    value.map_or_else(|| Ok(T::default()), str::parse)
}
