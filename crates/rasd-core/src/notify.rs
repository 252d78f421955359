// ── Notification collaborator ──
//
// Toasts are fire-and-forget. Confirmation is the one call whose answer
// the core consumes: destructive facility actions only run on `true`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default on-screen time for a toast.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Icon name shown next to the toast text.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "check-circle",
            Self::Info => "info-circle",
            Self::Warning => "exclamation-triangle",
            Self::Error => "exclamation-circle",
        }
    }
}

pub trait Notifier: Send + Sync {
    fn toast(&self, message: &str, severity: Severity, duration: Duration);

    /// Ask the user to confirm `message`. `false` leaves state untouched.
    fn confirm(&self, message: &str) -> bool;
}

/// Notifier with no UI: toasts become log lines and every confirmation
/// gets the same fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct TracingNotifier {
    auto_confirm: bool,
}

impl TracingNotifier {
    pub fn new(auto_confirm: bool) -> Self {
        Self { auto_confirm }
    }
}

impl Notifier for TracingNotifier {
    fn toast(&self, message: &str, severity: Severity, duration: Duration) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        match severity {
            Severity::Error => tracing::error!(duration_ms, "{message}"),
            Severity::Warning => tracing::warn!(duration_ms, "{message}"),
            Severity::Success | Severity::Info => tracing::info!(duration_ms, %severity, "{message}"),
        }
    }

    fn confirm(&self, message: &str) -> bool {
        tracing::debug!(answer = self.auto_confirm, "confirm: {message}");
        self.auto_confirm
    }
}
