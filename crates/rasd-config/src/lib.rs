//! Shared configuration for the RASD tools.
//!
//! A TOML file in the platform config directory, overridden by `RASD_`
//! environment variables, translated into the runtime types `rasd-core`
//! consumes (`ReconnectPolicy`, `FacilityStyles`, a storage directory).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rasd_core::{FacilityStyles, ReconnectPolicy};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub streams: StreamSettings,

    /// Facility layer styles.
    #[serde(default)]
    pub styles: FacilityStyles,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Directory holding the persisted JSON documents. Defaults to the
    /// platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StreamSettings {
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Base backoff; retry `n` waits `n` times this.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,

    /// Per-request timeout of the HTTP stream probe.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            ready_timeout_secs: default_ready_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_reconnect_delay_ms() -> u64 {
    3000
}
fn default_ready_timeout_secs() -> u64 {
    10
}
fn default_probe_timeout_secs() -> u64 {
    5
}

impl Config {
    /// Check values that would make the stream manager misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streams.ready_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "streams.ready_timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.streams.probe_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "streams.probe_timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        for (name, style) in [("normal", &self.styles.normal), ("selected", &self.styles.selected)] {
            if !(0.0..=1.0).contains(&style.fill_opacity) {
                return Err(ConfigError::Validation {
                    field: format!("styles.{name}.fill_opacity"),
                    reason: format!("{} is outside 0.0..=1.0", style.fill_opacity),
                });
            }
        }
        Ok(())
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.streams.max_reconnect_attempts,
            base_delay: Duration::from_millis(self.streams.reconnect_delay_ms),
            ready_timeout: Duration::from_secs(self.streams.ready_timeout_secs),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.streams.probe_timeout_secs)
    }

    /// Configured storage directory, or the platform data directory.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage.dir.clone().unwrap_or_else(data_dir)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "rasd", "rasd")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default directory for persisted facilities and stream configuration.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("rasd");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RASD_").split("__"))
}

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path (still honoring the environment).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_stream_policy() {
        let cfg = Config::default();
        assert_eq!(cfg.reconnect_policy(), ReconnectPolicy::default());
        assert_eq!(cfg.probe_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.styles, FacilityStyles::default());
    }

    #[test]
    fn file_and_env_layers_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r##"
                [streams]
                max_reconnect_attempts = 3
                reconnect_delay_ms = 500

                [styles.selected]
                color = "#ff0000"
                fill_color = "#ff0000"
                fill_opacity = 0.5
                weight = 4.0
                "##,
            )?;
            jail.set_env("RASD_STREAMS__READY_TIMEOUT_SECS", "20");
            jail.set_env("RASD_STORAGE__DIR", "/tmp/rasd-data");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            let policy = cfg.reconnect_policy();
            assert_eq!(policy.max_attempts, 3);
            assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
            assert_eq!(policy.ready_timeout, Duration::from_secs(20));
            assert_eq!(cfg.styles.selected.color, "#ff0000");
            assert_eq!(cfg.styles.normal, FacilityStyles::default().normal);
            assert_eq!(cfg.storage_dir(), PathBuf::from("/tmp/rasd-data"));
            Ok(())
        });
    }

    #[test]
    fn invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[streams]\nready_timeout_secs = 0\n")?;
            let err = load_config_from(Path::new("config.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "streams.ready_timeout_secs"));
            Ok(())
        });
    }

    #[test]
    fn save_writes_loadable_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut cfg = Config::default();
        cfg.streams.max_reconnect_attempts = 8;
        cfg.storage.dir = Some(dir.path().join("data"));

        save_config_to(&cfg, &path).unwrap();
        let loaded: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, cfg);
    }
}
