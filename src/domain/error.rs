//! Domain error types

use thiserror::Error;

/// Error when a relay policy option cannot be parsed
#[derive(Debug, Clone, Error)]
#[error("Invalid {option}: \"{input}\". Valid values are: {valid}")]
pub struct InvalidPolicyError {
    pub option: &'static str,
    pub input: String,
    pub valid: &'static str,
}

/// Error when an inbound push payload is unusable
#[derive(Debug, Clone, Error)]
pub enum PayloadError {
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Payload must be a JSON object")]
    NotAnObject,
}

/// Error when the process-wide credential bundle is misused
#[derive(Debug, Clone, Error)]
pub enum CredentialsError {
    #[error("Project credentials are already installed for this process")]
    AlreadyInstalled,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
