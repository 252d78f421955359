// ── Stream configuration ──

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::CameraId;
use crate::stream::TransportHint;

/// Where a camera's stream comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub transport: TransportHint,
}

impl StreamSource {
    pub fn new(url: impl Into<String>, transport: TransportHint) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }
}

/// Camera → source mapping, persisted as one JSON object.
pub type StreamConfig = BTreeMap<CameraId, StreamSource>;

/// Automatic retry schedule after a failed attach.
///
/// Retry `n` (1-based) waits `base_delay × n`; after `max_attempts`
/// retries the slot stays in error until reconnected by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound on waiting for a stream to become ready.
    pub ready_timeout: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(3000),
            ready_timeout: Duration::from_secs(10),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_linear() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (1..=policy.max_attempts)
            .map(|n| policy.delay_for(n).as_secs())
            .collect();
        assert_eq!(delays, vec![3, 6, 9, 12, 15]);
    }

    #[test]
    fn config_parses_stored_mapping() {
        let json = r#"{
            "cam1": {"url": "http://x/live.m3u8", "type": "auto"},
            "cam2": {"url": "http://x/live.flv"}
        }"#;
        let config: StreamConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.len(), 2);
        assert_eq!(config[&CameraId::from("cam2")].transport, TransportHint::Auto);

        let written = serde_json::to_value(&config).unwrap();
        assert_eq!(written["cam1"]["type"], "auto");
    }
}
