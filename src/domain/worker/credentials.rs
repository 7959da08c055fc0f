//! Project credential bundle
//!
//! The bundle is handed to the worker at startup and kept for the life of
//! the process. The relay never looks inside it.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::domain::error::CredentialsError;

static INSTALLED: OnceLock<ProjectCredentials> = OnceLock::new();

/// Opaque push project configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCredentials {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
}

impl ProjectCredentials {
    /// Install the bundle for this process. Fails on a second call.
    pub fn install(self) -> Result<&'static ProjectCredentials, CredentialsError> {
        let mut fresh = false;
        let installed = INSTALLED.get_or_init(|| {
            fresh = true;
            self
        });
        if fresh {
            Ok(installed)
        } else {
            Err(CredentialsError::AlreadyInstalled)
        }
    }

    /// The bundle installed at startup, if any
    pub fn installed() -> Option<&'static ProjectCredentials> {
        INSTALLED.get()
    }

    /// Short description safe to log
    pub fn describe(&self) -> String {
        let project = self.project_id.as_deref().unwrap_or("(no project)");
        let key = self
            .api_key
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(|| "(no api key)".to_string());
        format!("{} [{}]", project, key)
    }
}

/// Mask a secret for display (show first 4 and last 4 chars)
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
