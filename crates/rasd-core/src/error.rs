// ── Core error types ──
//
// Facility and stream operations never surface persistence failures to
// the caller; those stop at the store boundary as log lines. What remains
// here are validation rejections and per-attempt stream failures.

use thiserror::Error;

use crate::model::CameraId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation errors ────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Persistent key-value storage ─────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("storage quota exceeded writing '{key}'")]
    QuotaExceeded { key: String },

    #[error("invalid storage key '{key}'")]
    InvalidKey { key: String },
}

// ── Stream connection errors ─────────────────────────────────────────

/// Failure of a single connection attempt for one camera slot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("no URL configured for camera {camera_id}")]
    MissingUrl { camera_id: CameraId },

    #[error("attach failed for camera {camera_id}: {reason}")]
    Attach { camera_id: CameraId, reason: String },

    #[error("camera {camera_id} not ready after {timeout_secs}s")]
    Timeout { camera_id: CameraId, timeout_secs: u64 },

    #[error("connection attempt for camera {camera_id} was superseded")]
    Superseded { camera_id: CameraId },

    #[error("camera {camera_id} has no stream to reconnect")]
    UnknownSlot { camera_id: CameraId },
}

impl StreamError {
    /// Build an attach failure for `camera_id`.
    pub fn attach(camera_id: &CameraId, reason: impl Into<String>) -> Self {
        Self::Attach {
            camera_id: camera_id.clone(),
            reason: reason.into(),
        }
    }
}
