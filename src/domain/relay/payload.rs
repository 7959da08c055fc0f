//! Push payload and its normalized data

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::PayloadError;

/// A push payload as delivered by the push transport.
///
/// The payload is an opaque JSON object. Known fields are read through
/// accessors so that unexpected shapes degrade to "absent" instead of
/// failing the whole message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PushPayload(Map<String, Value>);

impl PushPayload {
    /// Wrap an already-parsed JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a payload from an arbitrary JSON value.
    /// Only objects are accepted.
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(PayloadError::NotAnObject),
        }
    }

    /// Raw field access
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The nested `notification` object, if present
    pub fn notification(&self) -> Option<&Map<String, Value>> {
        self.0.get("notification").and_then(Value::as_object)
    }

    /// `notification.title` when it is a non-empty string
    pub fn notification_title(&self) -> Option<&str> {
        self.notification_field("title")
    }

    /// `notification.body` when it is a non-empty string
    pub fn notification_body(&self) -> Option<&str> {
        self.notification_field("body")
    }

    /// `notification.icon` when it is a non-empty string
    pub fn notification_icon(&self) -> Option<&str> {
        self.notification_field("icon")
    }

    /// The `data` value, whatever its shape
    pub fn data(&self) -> Option<&Value> {
        self.0.get("data")
    }

    /// `fcmOptions.link`, the click target chosen by the sender
    pub fn link(&self) -> Option<&str> {
        self.0
            .get("fcmOptions")
            .and_then(Value::as_object)
            .and_then(|options| options.get("link"))
            .and_then(Value::as_str)
            .filter(|link| !link.is_empty())
    }

    /// Transport message id, used only for logging
    pub fn message_id(&self) -> Option<&str> {
        self.0.get("messageId").and_then(Value::as_str)
    }

    fn notification_field(&self, key: &str) -> Option<&str> {
        self.notification()
            .and_then(|n| n.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl FromStr for PushPayload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value =
            serde_json::from_str(s).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }
}

/// String-only view of `payload.data`.
///
/// Consumers such as the notification server and the page-side message
/// handlers only accept string fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SafeData(BTreeMap<String, String>);

impl SafeData {
    /// Empty data
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an arbitrary `data` value.
    ///
    /// Strings pass through unchanged; every other value becomes its JSON
    /// text. Anything that is not an object normalizes to empty data.
    pub fn normalize(data: Option<&Value>) -> Self {
        let Some(Value::Object(fields)) = data else {
            return Self::new();
        };

        let safe = fields
            .iter()
            .map(|(key, value)| (key.clone(), stringify_value(value)))
            .collect();

        Self(safe)
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Get a field, treating an empty string as absent
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Insert or replace a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SafeData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Convert a single JSON value into its string form
fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
    }
}
