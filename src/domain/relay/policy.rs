//! Relay policy value objects
//!
//! The two deployed worker variants disagree on tag derivation, click
//! routing and title fallback. Each disagreement is an option here and
//! the relay is parameterized by [`RelayPolicy`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::payload::SafeData;
use crate::domain::error::InvalidPolicyError;

pub const DEFAULT_FALLBACK_TITLE: &str = "Incoming call";
pub const DEFAULT_FALLBACK_BODY: &str = "Doctor is calling";
pub const DEFAULT_FIXED_TAG: &str = "incoming-call";
pub const DEFAULT_TAG_PREFIX: &str = "call-";
pub const DEFAULT_URL: &str = "/";
pub const DEFAULT_ICON: &str = "call-start";

/// Data field carrying the event identifier for per-event tags
pub const EVENT_ID_FIELD: &str = "appointment_id";

/// How the deduplication tag is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagStrategy {
    /// One tag for every call, so a new call replaces the previous one
    #[default]
    Fixed,
    /// Prefix plus the event id, or the current timestamp
    PerEvent,
}

impl TagStrategy {
    pub const VALID: &'static str = "fixed, per-event";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::PerEvent => "per-event",
        }
    }
}

impl FromStr for TagStrategy {
    type Err = InvalidPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "per-event" | "per_event" => Ok(Self::PerEvent),
            _ => Err(InvalidPolicyError {
                option: "tag strategy",
                input: s.to_string(),
                valid: Self::VALID,
            }),
        }
    }
}

impl fmt::Display for TagStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a notification click does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClickStrategy {
    /// Focus an open client and hand it the payload, else open a window
    #[default]
    FocusExisting,
    /// Always open the target URL in a new window
    OpenUrl,
}

impl ClickStrategy {
    pub const VALID: &'static str = "focus-existing, open-url";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FocusExisting => "focus-existing",
            Self::OpenUrl => "open-url",
        }
    }
}

impl FromStr for ClickStrategy {
    type Err = InvalidPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "focus-existing" | "focus_existing" => Ok(Self::FocusExisting),
            "open-url" | "open_url" => Ok(Self::OpenUrl),
            _ => Err(InvalidPolicyError {
                option: "click strategy",
                input: s.to_string(),
                valid: Self::VALID,
            }),
        }
    }
}

impl fmt::Display for ClickStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which data field is the second choice for the title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TitleSource {
    #[default]
    Title,
    DoctorName,
}

impl TitleSource {
    pub const VALID: &'static str = "title, doctor_name";

    /// Name of the data field to read
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::DoctorName => "doctor_name",
        }
    }
}

impl FromStr for TitleSource {
    type Err = InvalidPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "doctor_name" | "doctor-name" => Ok(Self::DoctorName),
            _ => Err(InvalidPolicyError {
                option: "title source",
                input: s.to_string(),
                valid: Self::VALID,
            }),
        }
    }
}

impl fmt::Display for TitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field())
    }
}

/// Complete relay configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayPolicy {
    pub tag_strategy: TagStrategy,
    pub click_strategy: ClickStrategy,
    pub title_source: TitleSource,
    pub fallback_title: String,
    pub fallback_body: String,
    pub fixed_tag: String,
    pub tag_prefix: String,
    pub default_url: String,
    pub icon: String,
    /// Re-alert the user when a same-tag notification is replaced
    pub renotify: bool,
    /// Keep the notification until the user dismisses it
    pub require_interaction: bool,
}

impl Default for RelayPolicy {
    fn default() -> Self {
        Self {
            tag_strategy: TagStrategy::default(),
            click_strategy: ClickStrategy::default(),
            title_source: TitleSource::default(),
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
            fallback_body: DEFAULT_FALLBACK_BODY.to_string(),
            fixed_tag: DEFAULT_FIXED_TAG.to_string(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            default_url: DEFAULT_URL.to_string(),
            icon: DEFAULT_ICON.to_string(),
            renotify: true,
            require_interaction: false,
        }
    }
}

impl RelayPolicy {
    /// The stricter variant: one tag per appointment, the doctor's name as
    /// title and a notification that stays until dismissed.
    pub fn strict() -> Self {
        Self {
            tag_strategy: TagStrategy::PerEvent,
            click_strategy: ClickStrategy::OpenUrl,
            title_source: TitleSource::DoctorName,
            require_interaction: true,
            ..Self::default()
        }
    }

    /// Notification title: `notification.title`, the configured data field,
    /// then the fallback.
    pub fn resolve_title<'a>(
        &'a self,
        notification_title: Option<&'a str>,
        data: &'a SafeData,
    ) -> &'a str {
        notification_title
            .or_else(|| data.non_empty(self.title_source.field()))
            .unwrap_or(self.fallback_title.as_str())
    }

    /// Notification body: `notification.body`, `data.body`, then the fallback
    pub fn resolve_body<'a>(
        &'a self,
        notification_body: Option<&'a str>,
        data: &'a SafeData,
    ) -> &'a str {
        notification_body
            .or_else(|| data.non_empty("body"))
            .unwrap_or(self.fallback_body.as_str())
    }

    /// Deduplication tag for a message received at `now`
    pub fn derive_tag(&self, data: &SafeData, now: DateTime<Utc>) -> String {
        match self.tag_strategy {
            TagStrategy::Fixed => self.fixed_tag.clone(),
            TagStrategy::PerEvent => {
                let event_id = data
                    .non_empty(EVENT_ID_FIELD)
                    .map(str::to_string)
                    .unwrap_or_else(|| now.timestamp_millis().to_string());
                format!("{}{}", self.tag_prefix, event_id)
            }
        }
    }

    /// URL to open for a click: `data.url`, then the default
    pub fn click_url<'a>(&'a self, data: &'a SafeData) -> &'a str {
        data.non_empty("url").unwrap_or(self.default_url.as_str())
    }
}
