// ── Stream status ──

use serde::{Deserialize, Serialize};

use crate::model::CameraId;
use crate::stream::Transport;

/// Connection state of one camera slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StreamStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting {
        attempt: u32,
        max: u32,
    },
    Error,
}

impl StreamStatus {
    /// Short status string for badges and logs.
    pub fn label(self) -> String {
        match self {
            Self::Disconnected => "Disconnected".into(),
            Self::Connecting => "Connecting".into(),
            Self::Connected => "Connected".into(),
            Self::Reconnecting { attempt, max } => format!("Reconnecting ({attempt}/{max})"),
            Self::Error => "Error".into(),
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Connecting => "spinner",
            Self::Connected => "check-circle",
            Self::Disconnected => "plug",
            Self::Error => "exclamation-circle",
            Self::Reconnecting { .. } => "sync",
        }
    }

    /// Lowercase machine name (`connecting`, `reconnecting`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting { .. } => "reconnecting",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// A status change broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub camera_id: CameraId,
    pub status: StreamStatus,
    /// Reason for an `Error` status, if any.
    pub message: Option<String>,
}

/// Playback report for one tracked slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotReport {
    pub camera_id: CameraId,
    pub transport: Transport,
    pub url: String,
    pub status: StreamStatus,
    pub is_playing: bool,
}
