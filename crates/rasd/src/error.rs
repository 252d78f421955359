//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable
//! help text.

use miette::Diagnostic;
use thiserror::Error;

use rasd_config::ConfigError;
use rasd_core::{CoreError, StreamError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(rasd::not_found),
        help("Run: rasd {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rasd::validation))]
    Validation { field: String, reason: String },

    // ── Streams ──────────────────────────────────────────────────────

    #[error("Stream for camera '{camera_id}' failed: {reason}")]
    #[diagnostic(
        code(rasd::stream_failed),
        help(
            "Check the URL with: rasd streams list\n\
             Verify the server is reachable and serving the expected format."
        )
    )]
    StreamFailed { camera_id: String, reason: String },

    #[error("Stream for camera '{camera_id}' was not ready after {seconds}s")]
    #[diagnostic(
        code(rasd::timeout),
        help("Increase streams.ready_timeout_secs in the config file.")
    )]
    Timeout { camera_id: String, seconds: u64 },

    #[error("No camera streams configured")]
    #[diagnostic(
        code(rasd::no_streams),
        help("Add one with: rasd streams set <CAMERA> <URL>")
    )]
    NoStreams,

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(rasd::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(rasd::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(rasd::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(rasd::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(rasd::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            Self::StreamFailed { .. } | Self::NoStreams => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Core errors → CliError ───────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
        }
    }
}

impl From<StreamError> for CliError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Timeout {
                camera_id,
                timeout_secs,
            } => CliError::Timeout {
                camera_id: camera_id.to_string(),
                seconds: timeout_secs,
            },
            StreamError::UnknownSlot { camera_id } | StreamError::MissingUrl { camera_id } => {
                CliError::NotFound {
                    resource_type: "stream".into(),
                    identifier: camera_id.to_string(),
                    list_command: "streams list".into(),
                }
            }
            StreamError::Attach { camera_id, reason } => CliError::StreamFailed {
                camera_id: camera_id.to_string(),
                reason,
            },
            StreamError::Superseded { camera_id } => CliError::StreamFailed {
                camera_id: camera_id.to_string(),
                reason: "superseded by a newer connection".into(),
            },
        }
    }
}
