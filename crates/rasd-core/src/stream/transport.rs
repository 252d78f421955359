// ── Transport detection ──
//
// Media delivery protocol for a stream URL. Detection is a plain substring
// match on the lowercased URL; anything unrecognized is treated as HLS.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Protocol actually used to attach a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Transport {
    Hls,
    Flv,
    Mp4,
}

impl Transport {
    /// Guess the transport from a URL.
    pub fn detect(url: &str) -> Self {
        let url = url.to_ascii_lowercase();
        if url.contains(".m3u8") || url.contains("hls") {
            Self::Hls
        } else if url.contains(".flv") || url.contains("flv=") || url.contains("httpflv") {
            Self::Flv
        } else if url.contains(".mp4") {
            Self::Mp4
        } else {
            Self::Hls
        }
    }
}

/// Transport as configured by the user: a fixed protocol or `auto`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TransportHint {
    #[default]
    Auto,
    Hls,
    Flv,
    Mp4,
}

impl TransportHint {
    /// Resolve to a concrete transport, detecting from `url` when `auto`.
    pub fn resolve(self, url: &str) -> Transport {
        match self {
            Self::Auto => Transport::detect(url),
            Self::Hls => Transport::Hls,
            Self::Flv => Transport::Flv,
            Self::Mp4 => Transport::Mp4,
        }
    }
}

impl From<Transport> for TransportHint {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Hls => Self::Hls,
            Transport::Flv => Self::Flv,
            Transport::Mp4 => Self::Mp4,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_substring() {
        let cases = [
            ("https://cdn.example.com/live/cam1/index.m3u8", Transport::Hls),
            ("http://10.0.0.5/HLS/cam2", Transport::Hls),
            ("http://10.0.0.5:8080/live/cam3.flv", Transport::Flv),
            ("http://10.0.0.5/play?flv=cam4", Transport::Flv),
            ("http://10.0.0.5/httpflv/cam5", Transport::Flv),
            ("https://example.com/clips/demo.MP4", Transport::Mp4),
            ("rtsp://10.0.0.5/stream", Transport::Hls),
            ("", Transport::Hls),
        ];
        for (url, expected) in cases {
            assert_eq!(Transport::detect(url), expected, "{url}");
        }
    }

    #[test]
    fn hls_marker_wins_over_other_extensions() {
        assert_eq!(Transport::detect("http://x/hls/clip.mp4"), Transport::Hls);
    }

    #[test]
    fn explicit_hint_overrides_detection() {
        assert_eq!(TransportHint::Mp4.resolve("a.m3u8"), Transport::Mp4);
        assert_eq!(TransportHint::Auto.resolve("a.flv"), Transport::Flv);
        assert_eq!("FLV".parse::<TransportHint>().unwrap(), TransportHint::Flv);
        assert_eq!(serde_json::to_string(&TransportHint::Auto).unwrap(), r#""auto""#);
    }
}
